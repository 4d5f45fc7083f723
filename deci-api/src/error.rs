//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use thiserror::Error;

use deci_config::Phase;
use deci_core::compiler::{SyntaxError, SyntaxErrorKind};
use deci_core::RuntimeError;

/// Deci 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeciError {
    /// 语法错误（带源位置）
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    /// 运行时错误
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl DeciError {
    /// 获取错误行号（如果有）
    pub fn line(&self) -> Option<usize> {
        match self {
            DeciError::Syntax(e) => Some(e.line),
            DeciError::Runtime(_) => None,
        }
    }

    /// 获取错误列号（如果有）
    pub fn column(&self) -> Option<usize> {
        match self {
            DeciError::Syntax(e) => Some(e.column),
            DeciError::Runtime(_) => None,
        }
    }

    /// 获取错误阶段
    pub fn phase(&self) -> Phase {
        match self {
            DeciError::Syntax(_) => Phase::Assembler,
            DeciError::Runtime(RuntimeError::Io(_)) => Phase::Io,
            DeciError::Runtime(_) => Phase::Vm,
        }
    }

    /// 会话是否还能继续（报告后继续读下一条语句）
    pub fn is_recoverable(&self) -> bool {
        match self {
            DeciError::Syntax(_) => true,
            DeciError::Runtime(e) => !e.is_fatal(),
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，上层应用可以序列化为 JSON。
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            phase: self.phase().as_str(),
            line: self.line(),
            column: self.column(),
            error_kind: self.kind_name(),
            message: self.to_string(),
        }
    }

    /// 错误类型名（可用于程序化处理）
    fn kind_name(&self) -> String {
        match self {
            DeciError::Syntax(e) => match e.kind {
                SyntaxErrorKind::UnterminatedString => "UnterminatedString",
                SyntaxErrorKind::MalformedNumber => "MalformedNumber",
                SyntaxErrorKind::MissingRegister(_) => "MissingRegister",
                SyntaxErrorKind::UnknownCommand(_) => "UnknownCommand",
                SyntaxErrorKind::TooManyConstants => "TooManyConstants",
            }
            .to_string(),
            DeciError::Runtime(e) => match e {
                RuntimeError::StackUnderflow { .. } => "StackUnderflow",
                RuntimeError::TypeMismatch { .. } => "TypeMismatch",
                RuntimeError::DivideByZero => "DivideByZero",
                RuntimeError::NegativeRoot => "NegativeRoot",
                RuntimeError::RegisterEmpty { .. } => "RegisterEmpty",
                RuntimeError::RecursionLimit => "RecursionLimit",
                RuntimeError::StackOverflow => "StackOverflow",
                RuntimeError::HugeExponent => "HugeExponent",
                RuntimeError::MacroSyntax(_) => "MacroSyntax",
                RuntimeError::Interrupted => "Interrupted",
                RuntimeError::Io(_) => "Io",
                RuntimeError::Internal(_) => "Internal",
            }
            .to_string(),
        }
    }
}

/// 结构化错误报告
///
/// 上层应用（CLI、Web）可以根据自己的需求格式化。
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    /// 错误阶段: lexer, assembler, vm, io
    pub phase: &'static str,
    /// 错误行号（1-based，如果有）
    pub line: Option<usize>,
    /// 错误列号（1-based，如果有）
    pub column: Option<usize>,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => {
                write!(f, "[{}:{}] {} error: {}", line, col, self.phase, self.message)
            }
            _ => write!(f, "{} error: {}", self.phase, self.message),
        }
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式（Web API 使用）
    ///
    /// 不依赖 serde，手动构建 JSON 字符串。
    pub fn to_json(&self) -> String {
        let line = self
            .line
            .map(|l| l.to_string())
            .unwrap_or_else(|| "null".to_string());
        let col = self
            .column
            .map(|c| c.to_string())
            .unwrap_or_else(|| "null".to_string());

        format!(
            r#"{{"phase":"{}","line":{},"column":{},"error_kind":"{}","message":"{}"}}"#,
            self.phase,
            line,
            col,
            escape_json(&self.error_kind),
            escape_json(&self.message)
        )
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}

/// 简单的 JSON 字符串转义
fn escape_json(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
