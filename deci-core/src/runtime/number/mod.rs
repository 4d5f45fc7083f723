//! 十进制任意精度数
//!
//! Number 是纯值类型：符号单独存放，数字序列以 10 进制、
//! 低位在前（little-endian）存储，scale 表示小数位数。
//! 所有运算都返回新分配的结果，不共享可变状态。
//!
//! 不变量：
//! - digits.len() >= scale + 1（至少一位整数位）
//! - 零永远是非负的
//! - 高位多余的 0 已被裁剪（保持不变量所需的除外）

pub mod arith;

use std::fmt;
use thiserror::Error;

/// 数值运算错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    /// 除数为零
    #[error("divide by zero")]
    DivideByZero,
    /// 负数开平方
    #[error("square root of negative number")]
    NegativeRoot,
    /// 指数超出支持范围
    #[error("exponent too large")]
    HugeExponent,
}

/// 数字字面量解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNumberError {
    /// 没有任何数字
    #[error("empty numeral")]
    Empty,
    /// 非法字符
    #[error("unexpected character {0:?} in numeral")]
    UnexpectedChar(char),
}

/// 十进制任意精度数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number {
    /// 符号（与数字序列分离存储）
    negative: bool,
    /// 10 进制数字，低位在前，包含全部小数位
    digits: Vec<u8>,
    /// 小数位数：digits[..scale] 是小数部分
    scale: usize,
}

impl Number {
    /// 零（scale 0）
    pub fn zero() -> Self {
        Self {
            negative: false,
            digits: vec![0],
            scale: 0,
        }
    }

    /// 一（scale 0）
    pub fn one() -> Self {
        Self {
            negative: false,
            digits: vec![1],
            scale: 0,
        }
    }

    /// 从无符号整数构造
    pub fn from_u64(mut value: u64) -> Self {
        let mut digits = Vec::new();
        loop {
            digits.push((value % 10) as u8);
            value /= 10;
            if value == 0 {
                break;
            }
        }
        Self {
            negative: false,
            digits,
            scale: 0,
        }
    }

    /// 由裸部件构造并归一化（crate 内部使用）
    pub(crate) fn from_parts(negative: bool, digits: Vec<u8>, scale: usize) -> Self {
        Self {
            negative,
            digits,
            scale,
        }
        .normalized()
    }

    /// 小数位数
    pub fn scale(&self) -> usize {
        self.scale
    }

    /// 是否为零
    pub fn is_zero(&self) -> bool {
        self.digits.iter().all(|&d| d == 0)
    }

    /// 是否为负
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// 有效数字个数（dc 的 Z 命令）
    ///
    /// 整数位去掉前导零后加上全部小数位；零至少算一位。
    pub fn digit_count(&self) -> usize {
        let int_digits = self.digits[self.scale..]
            .iter()
            .rposition(|&d| d != 0)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        (int_digits + self.scale).max(1)
    }

    /// 截断到指定小数位数（向零取整）
    pub fn truncated(&self, scale: usize) -> Self {
        if scale >= self.scale {
            return self.clone();
        }
        let drop = self.scale - scale;
        let digits = self.digits[drop..].to_vec();
        Self::from_parts(self.negative, digits, scale)
    }

    /// 恢复不变量：裁剪高位零、补齐整数位、消除负零
    fn normalized(mut self) -> Self {
        while self.digits.len() > self.scale + 1 && self.digits.last() == Some(&0) {
            self.digits.pop();
        }
        while self.digits.len() < self.scale + 1 {
            self.digits.push(0);
        }
        if self.is_zero() {
            self.negative = false;
        }
        self
    }

    /// 裸数字序列（低位在前），供 arith 使用
    pub(crate) fn raw_digits(&self) -> &[u8] {
        &self.digits
    }

    pub(crate) fn raw_negative(&self) -> bool {
        self.negative
    }
}

impl std::str::FromStr for Number {
    type Err = ParseNumberError;

    /// 解析 dc 风格数字字面量
    ///
    /// 负号写作 `_`（`-` 是减法命令），也接受 `-` 以便 API 使用。
    /// 形如 `[_-]?digits[.digits]`，整数部分可以为空（`.5`）。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars().peekable();
        let negative = matches!(chars.peek(), Some('_') | Some('-'));
        if negative {
            chars.next();
        }

        let mut int_part: Vec<u8> = Vec::new();
        let mut frac_part: Vec<u8> = Vec::new();
        let mut in_fraction = false;

        for c in chars {
            match c {
                '0'..='9' => {
                    let d = c as u8 - b'0';
                    if in_fraction {
                        frac_part.push(d);
                    } else {
                        int_part.push(d);
                    }
                }
                '.' if !in_fraction => in_fraction = true,
                other => return Err(ParseNumberError::UnexpectedChar(other)),
            }
        }

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseNumberError::Empty);
        }

        // 低位在前：先放小数（已是高位在前，反转），再放整数
        let scale = frac_part.len();
        let mut digits: Vec<u8> = Vec::with_capacity(int_part.len() + scale);
        digits.extend(frac_part.iter().rev());
        digits.extend(int_part.iter().rev());

        Ok(Self::from_parts(negative, digits, scale))
    }
}

impl fmt::Display for Number {
    /// dc 风格格式化
    ///
    /// 整数部分为零且有小数位时省略前导 0（`.500`），
    /// 小数部分总是补齐到 scale 位。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }

        let int_digits = &self.digits[self.scale..];
        let int_len = int_digits
            .iter()
            .rposition(|&d| d != 0)
            .map(|idx| idx + 1)
            .unwrap_or(0);

        if int_len == 0 {
            if self.scale == 0 {
                write!(f, "0")?;
            }
        } else {
            for &d in int_digits[..int_len].iter().rev() {
                write!(f, "{}", d)?;
            }
        }

        if self.scale > 0 {
            write!(f, ".")?;
            for &d in self.digits[..self.scale].iter().rev() {
                write!(f, "{}", d)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> Number {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_integer() {
        let n = num("42");
        assert_eq!(n.scale(), 0);
        assert!(!n.is_negative());
        assert_eq!(n.to_string(), "42");
    }

    #[test]
    fn test_parse_negative_underscore() {
        let n = num("_3.50");
        assert!(n.is_negative());
        assert_eq!(n.scale(), 2);
        assert_eq!(n.to_string(), "-3.50");
    }

    #[test]
    fn test_parse_bare_fraction() {
        let n = num(".500");
        assert_eq!(n.scale(), 3);
        assert_eq!(n.to_string(), ".500");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Number>(), Err(ParseNumberError::Empty));
        assert_eq!("_".parse::<Number>(), Err(ParseNumberError::Empty));
        assert_eq!(
            "1x".parse::<Number>(),
            Err(ParseNumberError::UnexpectedChar('x'))
        );
    }

    #[test]
    fn test_negative_zero_normalizes() {
        let n = num("_0.00");
        assert!(!n.is_negative());
        assert_eq!(n.to_string(), ".00");
    }

    #[test]
    fn test_roundtrip_canonical_forms() {
        // 规范形式（dc 输出形态）应精确往返
        for s in ["0", "7", "-7", "123.456", ".500", "-.03", "10.0", "99999999999999999999"] {
            assert_eq!(num(s).to_string(), s, "round-trip failed for {s}");
        }
    }

    #[test]
    fn test_zero_formatting_keeps_scale() {
        assert_eq!(num("0.00").to_string(), ".00");
        assert_eq!(Number::zero().to_string(), "0");
    }

    #[test]
    fn test_truncated() {
        let n = num("3.14159");
        assert_eq!(n.truncated(2).to_string(), "3.14");
        assert_eq!(n.truncated(0).to_string(), "3");
        // 扩展 scale 不补零
        assert_eq!(n.truncated(10).to_string(), "3.14159");
    }

    #[test]
    fn test_digit_count() {
        assert_eq!(num("1.23").digit_count(), 3);
        assert_eq!(num("0.000").digit_count(), 3);
        assert_eq!(num("0").digit_count(), 1);
        assert_eq!(num("12345").digit_count(), 5);
    }

    #[test]
    fn test_from_u64() {
        assert_eq!(Number::from_u64(0).to_string(), "0");
        assert_eq!(Number::from_u64(105).to_string(), "105");
    }
}
