//! 语法错误
//!
//! 词法与汇编阶段的错误都带源位置。顶层的恢复策略是
//! 跳到下一行重来，错误本身不携带恢复逻辑。

use thiserror::Error;

use crate::kit::SourcePosition;

/// 语法错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// 字符串缺右方括号
    #[error("unterminated string")]
    UnterminatedString,
    /// 数字字面量残缺（孤立的 `_` 或 `.`）
    #[error("malformed number")]
    MalformedNumber,
    /// 寄存器命令后面没有寄存器名
    #[error("'{0}' needs a register name")]
    MissingRegister(char),
    /// 不认识的命令字符
    #[error("unknown command {0:?}")]
    UnknownCommand(char),
    /// 单条语句常量表溢出
    #[error("too many constants in one statement")]
    TooManyConstants,
}

/// 带位置的语法错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at {line}:{column}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, position: SourcePosition) -> Self {
        Self {
            kind,
            line: position.line,
            column: position.column,
        }
    }
}
