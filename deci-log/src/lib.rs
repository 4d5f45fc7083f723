//! deci-log - 结构化日志系统
//!
//! 为 deci 的词法、汇编与执行阶段设计的日志系统，特点：
//! - **显式传递**：无全局 logger，`Arc<Logger>` 随配置传入各阶段
//! - **非阻塞**：级别不匹配时零格式化开销
//! - **可回放**：环形缓冲 sink 保留最后 N 条日志，供测试断言与崩溃诊断
//!
//! # 快速开始
//!
//! ```ignore
//! use deci_log::{Level, Logger, debug};
//!
//! let logger = Logger::new(Level::Debug).with_sink(deci_log::StderrSink);
//! debug!(logger, "scale set to {}", 5);
//! ```

mod macros;
mod record;

mod logger;
mod ring_buffer;

pub use logger::{LogSink, Logger, StderrSink, StdoutSink};
pub use record::{Level, Record};
pub use ring_buffer::LogRingBuffer;

// 宏通过 #[macro_export] 自动导出到 crate 根：
// trace!, debug!, info!, warn!, error!, log!

/// 日志结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// 日志系统错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 无法解析的级别名
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),
}

impl std::str::FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "silent" => Ok(Level::Silent),
            other => Err(Error::UnknownLevel(other.to_string())),
        }
    }
}
