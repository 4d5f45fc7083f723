//! 运行时值
//!
//! 计算器的栈是双类型的：数字或字符串（宏体）。
//! 两者都可以压栈、存寄存器、被 p/P 打印；
//! 算术指令只接受数字，执行指令只接受字符串。

use std::fmt;

use super::number::Number;

/// 栈上的值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 十进制数
    Number(Number),
    /// 字符串（宏体，不含外层方括号）
    Str(String),
}

impl Value {
    /// 类型名，用于错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl fmt::Display for Value {
    /// p 命令的显示形态：数字按 dc 规则，字符串原样（无方括号）
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_name() {
        let n = Value::Number(Number::zero());
        let s = Value::Str("1 2 +".to_string());
        assert_eq!(n.type_name(), "number");
        assert_eq!(s.type_name(), "string");
        assert!(n.is_number());
        assert!(s.is_str());
    }

    #[test]
    fn test_value_display() {
        let n: Value = "3.50".parse::<Number>().unwrap().into();
        assert_eq!(n.to_string(), "3.50");
        let s: Value = "p p".to_string().into();
        assert_eq!(s.to_string(), "p p");
    }
}
