//! 基础设施工具
//!
//! 与计算器语义无关的通用组件：位置追踪、字节流。

pub mod position;
pub mod stream;

pub use position::SourcePosition;
pub use stream::{ByteStream, StreamResult};
