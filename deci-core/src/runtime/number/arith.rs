//! 十进制算术运算
//!
//! 全部运算建立在一组低位在前的裸数字序列原语上：
//! 逐位加减、竖式乘法、试商长除。符号与 scale 的处理
//! 集中在 Number 的方法层，原语只看见无符号整数序列。
//!
//! scale 规则（与 POSIX dc 一致）：
//! - 加减：max(sa, sb)
//! - 乘法：sa + sb
//! - 除法：调用方给定的 scale，向零截断
//! - 取余：a - (a/b)*b，继承除法的 scale
//! - 开方：max(sa, scale)
//! - 乘方：min(sa*e, max(scale, sa))，负指数时为 scale

use std::cmp::Ordering;

use super::{Number, NumberError};

/// 乘方指数上限，超出直接报错而不是耗尽内存
pub(crate) const EXPONENT_LIMIT: u64 = 1_000_000;

// ===== 裸数字序列原语（低位在前，无符号） =====

fn is_zero_digits(v: &[u8]) -> bool {
    v.iter().all(|&d| d == 0)
}

/// 裁剪高位零，至少保留一位
fn trim(v: &mut Vec<u8>) {
    while v.len() > 1 && v.last() == Some(&0) {
        v.pop();
    }
}

/// 无符号整数比较
fn cmp_digits(a: &[u8], b: &[u8]) -> Ordering {
    let len_a = a.iter().rposition(|&d| d != 0).map_or(0, |i| i + 1);
    let len_b = b.iter().rposition(|&d| d != 0).map_or(0, |i| i + 1);
    if len_a != len_b {
        return len_a.cmp(&len_b);
    }
    for i in (0..len_a).rev() {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn add_digits(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().max(b.len());
    let mut out = Vec::with_capacity(len + 1);
    let mut carry = 0u8;
    for i in 0..len {
        let sum = a.get(i).copied().unwrap_or(0) + b.get(i).copied().unwrap_or(0) + carry;
        out.push(sum % 10);
        carry = sum / 10;
    }
    if carry > 0 {
        out.push(carry);
    }
    out
}

/// 要求 a >= b
fn sub_digits(a: &[u8], b: &[u8]) -> Vec<u8> {
    debug_assert!(cmp_digits(a, b) != Ordering::Less);
    let mut out = Vec::with_capacity(a.len());
    let mut borrow = 0i8;
    for i in 0..a.len() {
        let mut diff = a[i] as i8 - b.get(i).copied().unwrap_or(0) as i8 - borrow;
        if diff < 0 {
            diff += 10;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out.push(diff as u8);
    }
    trim(&mut out);
    out
}

/// 竖式乘法，部分积先累加再统一进位
fn mul_digits(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut cells = vec![0u32; a.len() + b.len()];
    for (i, &da) in a.iter().enumerate() {
        if da == 0 {
            continue;
        }
        for (j, &db) in b.iter().enumerate() {
            cells[i + j] += da as u32 * db as u32;
        }
    }
    let mut out = Vec::with_capacity(cells.len());
    let mut carry = 0u32;
    for cell in cells {
        let cur = cell + carry;
        out.push((cur % 10) as u8);
        carry = cur / 10;
    }
    while carry > 0 {
        out.push((carry % 10) as u8);
        carry /= 10;
    }
    trim(&mut out);
    out
}

/// 乘以 10^k
fn shift_up(a: &[u8], k: usize) -> Vec<u8> {
    let mut out = vec![0u8; k];
    out.extend_from_slice(a);
    out
}

/// 除以 10^k（截断）
fn shift_down(a: &[u8], k: usize) -> Vec<u8> {
    if k >= a.len() {
        vec![0]
    } else {
        a[k..].to_vec()
    }
}

/// 试商长除，返回 (商, 余数)，要求 b 非零
fn divmod(a: &[u8], b: &[u8]) -> (Vec<u8>, Vec<u8>) {
    debug_assert!(!is_zero_digits(b));
    let mut quotient = vec![0u8; a.len()];
    let mut rem: Vec<u8> = vec![0];
    for i in (0..a.len()).rev() {
        // rem = rem * 10 + a[i]
        rem.insert(0, a[i]);
        trim(&mut rem);
        let mut digit = 0u8;
        while cmp_digits(&rem, b) != Ordering::Less {
            rem = sub_digits(&rem, b);
            digit += 1;
        }
        quotient[i] = digit;
    }
    trim(&mut quotient);
    trim(&mut rem);
    (quotient, rem)
}

/// 原地除以 2（截断）
fn halve(v: &mut Vec<u8>) {
    let mut rem = 0u8;
    for d in v.iter_mut().rev() {
        let cur = rem * 10 + *d;
        *d = cur / 2;
        rem = cur % 2;
    }
    trim(v);
}

/// 整数平方根（牛顿迭代，向下取整）
fn isqrt_digits(n: &[u8]) -> Vec<u8> {
    if is_zero_digits(n) {
        return vec![0];
    }
    let sig = n.iter().rposition(|&d| d != 0).map_or(0, |i| i + 1);
    // 初值 10^ceil(sig/2)，保证大于等于真值
    let mut x = shift_up(&[1], sig.div_ceil(2));
    loop {
        let (q, _) = divmod(n, &x);
        let mut y = add_digits(&x, &q);
        halve(&mut y);
        if cmp_digits(&y, &x) != Ordering::Less {
            return x;
        }
        x = y;
    }
}

/// 转 u64，溢出返回 None
fn digits_to_u64(a: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    for &d in a.iter().rev() {
        value = value.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(value)
}

/// 把数字序列对齐到目标 scale（只升不降）
fn aligned(n: &Number, scale: usize) -> Vec<u8> {
    shift_up(n.raw_digits(), scale - n.scale())
}

// ===== Number 运算层 =====

impl Number {
    /// 取反（零保持非负）
    pub fn negated(&self) -> Self {
        Self::from_parts(!self.raw_negative(), self.raw_digits().to_vec(), self.scale())
    }

    /// 截断为无符号整数；负数或超出 u64 范围返回 None
    pub fn to_u64(&self) -> Option<u64> {
        if self.is_negative() {
            return None;
        }
        digits_to_u64(&self.raw_digits()[self.scale()..])
    }

    /// 数值比较（与 scale 无关：1 与 1.0 相等）
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.raw_negative(), other.raw_negative()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        let scale = self.scale().max(other.scale());
        let abs = cmp_digits(&aligned(self, scale), &aligned(other, scale));
        if self.raw_negative() {
            abs.reverse()
        } else {
            abs
        }
    }

    /// 加法，scale = max(sa, sb)
    pub fn add(&self, other: &Self) -> Self {
        let scale = self.scale().max(other.scale());
        let a = aligned(self, scale);
        let b = aligned(other, scale);

        if self.raw_negative() == other.raw_negative() {
            return Self::from_parts(self.raw_negative(), add_digits(&a, &b), scale);
        }
        // 异号：绝对值大的一方决定符号
        match cmp_digits(&a, &b) {
            Ordering::Equal => Self::from_parts(false, vec![0], scale),
            Ordering::Greater => {
                Self::from_parts(self.raw_negative(), sub_digits(&a, &b), scale)
            }
            Ordering::Less => Self::from_parts(other.raw_negative(), sub_digits(&b, &a), scale),
        }
    }

    /// 减法
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.negated())
    }

    /// 乘法，scale = sa + sb
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_parts(
            self.raw_negative() != other.raw_negative(),
            mul_digits(self.raw_digits(), other.raw_digits()),
            self.scale() + other.scale(),
        )
    }

    /// 除法，结果截断到给定 scale（向零取整）
    ///
    /// a/b = trunc(A * 10^(scale+sb-sa) / B)，其中 A、B 为
    /// 去掉小数点后的整数。截断的复合性保证负偏移时
    /// 先截断被除数不影响商。
    pub fn div(&self, other: &Self, scale: usize) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivideByZero);
        }
        let shift = scale as isize + other.scale() as isize - self.scale() as isize;
        let numerator = if shift >= 0 {
            shift_up(self.raw_digits(), shift as usize)
        } else {
            shift_down(self.raw_digits(), (-shift) as usize)
        };
        let (quotient, _) = divmod(&numerator, other.raw_digits());
        Ok(Self::from_parts(
            self.raw_negative() != other.raw_negative(),
            quotient,
            scale,
        ))
    }

    /// 取余：a - (a/b)*b，除法在给定 scale 下进行
    ///
    /// 结果符号与被除数一致，scale 为 max(sa, scale+sb)。
    pub fn rem(&self, other: &Self, scale: usize) -> Result<Self, NumberError> {
        let quotient = self.div(other, scale)?;
        Ok(self.sub(&quotient.mul(other)))
    }

    /// 开平方，结果 scale = max(sa, scale)，向下截断
    pub fn sqrt(&self, scale: usize) -> Result<Self, NumberError> {
        if self.is_negative() {
            return Err(NumberError::NegativeRoot);
        }
        let result_scale = self.scale().max(scale);
        // 被开方数放大到 2*result_scale 位小数，整数开方后恰好落在 result_scale
        let shift = 2 * result_scale - self.scale();
        let n = shift_up(self.raw_digits(), shift);
        Ok(Self::from_parts(false, isqrt_digits(&n), result_scale))
    }

    /// 乘方，指数截断为整数
    ///
    /// 正指数：精确算出 a^e 后截断到 min(sa*e, max(scale, sa))。
    /// 负指数：1 / a^|e|，结果 scale 为给定 scale。
    pub fn pow(&self, exponent: &Self, scale: usize) -> Result<Self, NumberError> {
        let exp_int = exponent.truncated(0);
        let negative_exp = exp_int.is_negative();
        let e = digits_to_u64(exp_int.raw_digits())
            .filter(|&e| e <= EXPONENT_LIMIT)
            .ok_or(NumberError::HugeExponent)?;

        if e == 0 {
            return Ok(Self::one());
        }

        // 快速幂，全精度累积
        let mut acc = Self::one();
        let mut base = self.clone();
        let mut n = e;
        while n > 0 {
            if n & 1 == 1 {
                acc = acc.mul(&base);
            }
            n >>= 1;
            if n > 0 {
                base = base.mul(&base);
            }
        }

        if negative_exp {
            return Self::one().div(&acc, scale);
        }
        let target = acc.scale().min(scale.max(self.scale()));
        Ok(acc.truncated(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> Number {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_mixed_signs() {
        assert_eq!(num("3").add(&num("4")).to_string(), "7");
        assert_eq!(num("3").add(&num("_4")).to_string(), "-1");
        assert_eq!(num("_3").add(&num("4")).to_string(), "1");
        assert_eq!(num("_3").add(&num("_4")).to_string(), "-7");
        assert_eq!(num("5").add(&num("_5")).to_string(), "0");
    }

    #[test]
    fn test_add_scale_is_max() {
        assert_eq!(num("1.5").add(&num("2.25")).to_string(), "3.75");
        assert_eq!(num("1.5").add(&num("2.25")).scale(), 2);
        assert_eq!(num("0.1").add(&num("0.2")).to_string(), ".3");
    }

    #[test]
    fn test_sub() {
        assert_eq!(num("10").sub(&num("3")).to_string(), "7");
        assert_eq!(num("3").sub(&num("10")).to_string(), "-7");
        assert_eq!(num("1.00").sub(&num("1")).to_string(), ".00");
    }

    #[test]
    fn test_mul_scale_is_sum() {
        let p = num("1.5").mul(&num("2.5"));
        assert_eq!(p.to_string(), "3.75");
        assert_eq!(p.scale(), 2);
        assert_eq!(num("_3").mul(&num("4")).to_string(), "-12");
        assert_eq!(num("_3").mul(&num("_4")).to_string(), "12");
        assert_eq!(num("0.00").mul(&num("5.0")).to_string(), ".000");
    }

    #[test]
    fn test_mul_large() {
        let a = num("123456789123456789");
        let b = num("987654321987654321");
        assert_eq!(
            a.mul(&b).to_string(),
            "121932631356500531347203169112635269"
        );
    }

    #[test]
    fn test_div_truncates_toward_zero() {
        assert_eq!(num("10").div(&num("3"), 0).unwrap().to_string(), "3");
        assert_eq!(num("10").div(&num("3"), 2).unwrap().to_string(), "3.33");
        assert_eq!(num("_10").div(&num("3"), 0).unwrap().to_string(), "-3");
        assert_eq!(num("_10").div(&num("3"), 2).unwrap().to_string(), "-3.33");
        assert_eq!(num("1").div(&num("8"), 3).unwrap().to_string(), ".125");
    }

    #[test]
    fn test_div_fractional_operands() {
        // 被除数 scale 大于请求 scale：负偏移路径
        assert_eq!(num("3.14159").div(&num("1"), 2).unwrap().to_string(), "3.14");
        assert_eq!(num("7.5").div(&num("2.5"), 0).unwrap().to_string(), "3");
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(num("1").div(&num("0"), 0), Err(NumberError::DivideByZero));
        assert_eq!(num("1").div(&num("0.00"), 2), Err(NumberError::DivideByZero));
    }

    #[test]
    fn test_rem() {
        assert_eq!(num("10").rem(&num("3"), 0).unwrap().to_string(), "1");
        assert_eq!(num("_10").rem(&num("3"), 0).unwrap().to_string(), "-1");
        // scale 2 下：10/3 = 3.33，10 - 9.99 = .01
        assert_eq!(num("10").rem(&num("3"), 2).unwrap().to_string(), ".01");
        assert_eq!(num("10").rem(&num("0"), 0), Err(NumberError::DivideByZero));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(num("2").sqrt(4).unwrap().to_string(), "1.4142");
        assert_eq!(num("16").sqrt(0).unwrap().to_string(), "4");
        assert_eq!(num("0").sqrt(0).unwrap().to_string(), "0");
        // 操作数 scale 大于请求 scale 时取操作数的
        assert_eq!(num("2.00").sqrt(0).unwrap().to_string(), "1.41");
        assert_eq!(num("_4").sqrt(0), Err(NumberError::NegativeRoot));
    }

    #[test]
    fn test_pow() {
        assert_eq!(num("2").pow(&num("10"), 0).unwrap().to_string(), "1024");
        assert_eq!(num("2").pow(&num("0"), 0).unwrap().to_string(), "1");
        assert_eq!(num("_2").pow(&num("3"), 0).unwrap().to_string(), "-8");
        assert_eq!(num("_2").pow(&num("2"), 0).unwrap().to_string(), "4");
        // 小数指数截断
        assert_eq!(num("2").pow(&num("2.9"), 0).unwrap().to_string(), "4");
    }

    #[test]
    fn test_pow_scale_rule() {
        // sa*e = 2 <= max(scale, sa)
        assert_eq!(num("1.5").pow(&num("2"), 5).unwrap().to_string(), "2.25");
        // sa*e = 4 > max(0, 1)：截断到 1 位
        assert_eq!(num("1.5").pow(&num("4"), 0).unwrap().to_string(), "5.0");
    }

    #[test]
    fn test_pow_negative_exponent() {
        assert_eq!(num("2").pow(&num("_2"), 4).unwrap().to_string(), ".2500");
        assert_eq!(num("2").pow(&num("_2"), 0).unwrap().to_string(), "0");
        assert_eq!(
            num("0").pow(&num("_1"), 0),
            Err(NumberError::DivideByZero)
        );
    }

    #[test]
    fn test_pow_huge_exponent() {
        assert_eq!(
            num("2").pow(&num("99999999999999999999"), 0),
            Err(NumberError::HugeExponent)
        );
        assert_eq!(
            num("2").pow(&num("1000001"), 0),
            Err(NumberError::HugeExponent)
        );
    }

    #[test]
    fn test_compare_ignores_scale() {
        use std::cmp::Ordering::*;
        assert_eq!(num("1").compare(&num("1.000")), Equal);
        assert_eq!(num("1.5").compare(&num("1.25")), Greater);
        assert_eq!(num("_1").compare(&num("1")), Less);
        assert_eq!(num("_2").compare(&num("_1")), Less);
        assert_eq!(num("0").compare(&num("_0.0")), Equal);
    }

    #[test]
    fn test_to_u64() {
        assert_eq!(num("42").to_u64(), Some(42));
        assert_eq!(num("42.9").to_u64(), Some(42));
        assert_eq!(num("_1").to_u64(), None);
        assert_eq!(num("99999999999999999999999").to_u64(), None);
    }

    #[test]
    fn test_negated() {
        assert_eq!(num("5").negated().to_string(), "-5");
        assert_eq!(num("_5").negated().to_string(), "5");
        assert_eq!(num("0").negated().to_string(), "0");
    }
}
