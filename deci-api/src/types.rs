//! API 类型定义
//!
//! 汇编和执行的输入输出类型。

use deci_core::Chunk;

/// 汇编输出
#[derive(Debug)]
pub struct CompileOutput {
    /// 字节码块
    pub chunk: Chunk,
}

/// 执行输出
#[derive(Debug)]
pub struct ExecuteOutput {
    /// 捕获的标准输出（捕获模式下，否则为空）
    pub stdout: String,
    /// 是否收到 q（会话应当结束）
    pub quit: bool,
}
