//! 字节流抽象
//!
//! 为词法分析器提供可增量填充的字节流：
//! 支持位置追踪、任意深度预读和流式 EOF 语义。
//! 预读永不消费，词法分析器因此可以在输入不完整时原地等待，
//! 不会把半个 token 吃掉。

use std::collections::VecDeque;

use super::position::SourcePosition;

/// 流式读取结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamResult<T> {
    /// 成功读取
    Ok(T),
    /// 需要更多输入（流式场景）
    Incomplete,
    /// 流已结束
    Eof,
}

/// 字节流
pub struct ByteStream {
    /// 尚未消费的字节
    buffer: VecDeque<u8>,
    /// 当前位置
    position: SourcePosition,
    /// 流是否已关闭（EOF 已知）
    is_closed: bool,
}

impl ByteStream {
    /// 创建空流
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
            position: SourcePosition::start(),
            is_closed: false,
        }
    }

    /// 获取当前位置
    pub fn position(&self) -> SourcePosition {
        self.position
    }

    /// 流是否已关闭
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// 向流中写入数据（生产者接口）
    ///
    /// 已关闭的流拒绝新输入。
    pub fn feed(&mut self, data: &[u8]) -> bool {
        if self.is_closed {
            return false;
        }
        self.buffer.extend(data.iter().copied());
        true
    }

    /// 关闭流（标记 EOF）
    pub fn close(&mut self) {
        self.is_closed = true;
    }

    /// 预读第 offset 个字节（不消费）
    pub fn try_peek(&self, offset: usize) -> StreamResult<u8> {
        match self.buffer.get(offset) {
            Some(&byte) => StreamResult::Ok(byte),
            None if self.is_closed => StreamResult::Eof,
            None => StreamResult::Incomplete,
        }
    }

    /// 消费 n 个已预读过的字节
    ///
    /// 仅在 try_peek 确认过这些字节存在后调用。
    pub fn consume(&mut self, n: usize) {
        for _ in 0..n {
            if let Some(byte) = self.buffer.pop_front() {
                self.position.advance(byte);
            }
        }
    }

}

impl Default for ByteStream {
    fn default() -> Self {
        Self::new()
    }
}
