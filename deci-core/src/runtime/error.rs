//! 运行时错误
//!
//! dc 的传统实现靠 longjmp 回到主循环；这里全部错误沿调用链
//! 以 Result 向上传播。除 IO 失败外都是可恢复的：主循环报告
//! 后继续读下一条语句，机器状态（栈、寄存器、scale）保持原样。

use thiserror::Error;

use super::number::NumberError;

/// 虚拟机运行时错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// 操作数不足
    #[error("stack empty: '{op}' needs more operands")]
    StackUnderflow { op: &'static str },

    /// 操作数类型不符
    #[error("'{op}' expects a different type, found {found}")]
    TypeMismatch { op: &'static str, found: &'static str },

    /// 除零
    #[error("divide by zero")]
    DivideByZero,

    /// 负数开方
    #[error("square root of negative number")]
    NegativeRoot,

    /// 寄存器栈为空
    #[error("register '{}' is empty", register_name(*.reg))]
    RegisterEmpty { reg: u16 },

    /// 宏递归超限
    #[error("macro recursion too deep")]
    RecursionLimit,

    /// 主栈深度超限
    #[error("stack overflow")]
    StackOverflow,

    /// 乘方指数超限
    #[error("exponent too large")]
    HugeExponent,

    /// 宏体含语法错误
    #[error("bad macro: {0}")]
    MacroSyntax(String),

    /// 用户请求中断
    #[error("interrupted")]
    Interrupted,

    /// IO 失败（不可恢复）
    #[error("io error: {0}")]
    Io(String),

    /// 内部不变量被破坏
    #[error("internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// 是否不可恢复
    ///
    /// 只有 IO 失败会终止整个会话，其余错误报告后继续执行。
    pub fn is_fatal(&self) -> bool {
        matches!(self, RuntimeError::Io(_))
    }
}

impl From<NumberError> for RuntimeError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::DivideByZero => RuntimeError::DivideByZero,
            NumberError::NegativeRoot => RuntimeError::NegativeRoot,
            NumberError::HugeExponent => RuntimeError::HugeExponent,
        }
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Io(err.to_string())
    }
}

/// 寄存器显示名：可打印 ASCII 显示字符本身，其余显示编号
fn register_name(reg: u16) -> String {
    match u8::try_from(reg) {
        Ok(byte) if byte.is_ascii_graphic() => (byte as char).to_string(),
        _ => format!("#{reg}"),
    }
}
