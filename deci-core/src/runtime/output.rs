//! 输出缓冲
//!
//! 固定容量的字节缓冲，落在任意 `Write + Send` sink 之上。
//! 缓冲写满或遇到换行时冲刷；flush 循环处理部分写入与
//! EINTR，写出 0 字节视为 sink 已断开。
//!
//! 不变量：used <= capacity 恒成立。

use std::io::{ErrorKind, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::RuntimeError;

/// 输出缓冲
pub struct OutBuffer {
    sink: Box<dyn Write + Send>,
    buffer: Vec<u8>,
    capacity: usize,
}

impl OutBuffer {
    /// 包装一个 sink，容量至少为 1
    pub fn new(sink: Box<dyn Write + Send>, capacity: usize) -> Self {
        Self {
            sink,
            buffer: Vec::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// 当前缓冲占用（测试用）
    pub fn used(&self) -> usize {
        self.buffer.len()
    }

    /// 写一个字节；缓冲满先冲刷，换行后立即冲刷
    pub fn putc(&mut self, byte: u8) -> Result<(), RuntimeError> {
        if self.buffer.len() == self.capacity {
            self.flush()?;
        }
        self.buffer.push(byte);
        if byte == b'\n' {
            self.flush()?;
        }
        Ok(())
    }

    /// 写一段字节
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), RuntimeError> {
        for &byte in bytes {
            self.putc(byte)?;
        }
        Ok(())
    }

    /// 写一个字符串
    pub fn write_str(&mut self, s: &str) -> Result<(), RuntimeError> {
        self.write_bytes(s.as_bytes())
    }

    /// 冲刷缓冲
    ///
    /// 循环处理部分写入；EINTR 重试，Ok(0) 报 IO 错误。
    pub fn flush(&mut self) -> Result<(), RuntimeError> {
        let mut written = 0;
        while written < self.buffer.len() {
            match self.sink.write(&self.buffer[written..]) {
                Ok(0) => {
                    self.buffer.clear();
                    return Err(RuntimeError::Io("output sink closed".to_string()));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.clear();
                    return Err(e.into());
                }
            }
        }
        self.buffer.clear();
        self.sink.flush()?;
        Ok(())
    }
}

/// 可跨线程克隆的输出缓冲句柄
///
/// 虚拟机持有一份走正常写入路径；信号处理线程可另持一份，
/// 在升级退出前对残留字节做尽力冲刷。
#[derive(Clone)]
pub struct SharedOutput {
    inner: Arc<Mutex<OutBuffer>>,
}

impl SharedOutput {
    pub fn new(sink: Box<dyn Write + Send>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(OutBuffer::new(sink, capacity))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OutBuffer> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 当前缓冲占用（测试用）
    pub fn used(&self) -> usize {
        self.lock().used()
    }

    pub fn putc(&self, byte: u8) -> Result<(), RuntimeError> {
        self.lock().putc(byte)
    }

    pub fn write_str(&self, s: &str) -> Result<(), RuntimeError> {
        self.lock().write_str(s)
    }

    pub fn flush(&self) -> Result<(), RuntimeError> {
        self.lock().flush()
    }

    /// 尽力冲刷：主线程正持锁写入时直接放弃，不阻塞调用方
    pub fn try_flush(&self) {
        if let Ok(mut out) = self.inner.try_lock() {
            let _ = out.flush();
        }
    }
}

/// 测试与 API 捕获用的共享 sink
///
/// 克隆体共享同一字节缓冲，可以一边持有 OutBuffer 一边读取输出。
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出已写入的全部内容（按 UTF-8 宽松解码）
    pub fn contents(&self) -> String {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&guard).into_owned()
    }

    /// 清空已捕获的内容
    pub fn clear(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
