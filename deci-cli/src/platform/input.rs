//! 不预读的行输入
//!
//! REPL 主循环和 ? 命令共享同一个 stdin。这里逐字节读取，
//! 一方读完一行就停，不会把下一行吞进自己的缓冲区。

use std::io::{self, BufRead, Read};

pub struct LineInput<R> {
    inner: R,
    pending: Option<u8>,
}

impl<R: Read> LineInput<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: None,
        }
    }
}

impl<R: Read> Read for LineInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(byte) = self.pending.take() {
            buf[0] = byte;
            return Ok(1);
        }
        self.inner.read(&mut buf[..1])
    }
}

impl<R: Read> BufRead for LineInput<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pending.is_none() {
            let mut byte = [0u8; 1];
            if self.inner.read(&mut byte)? > 0 {
                self.pending = Some(byte[0]);
            }
        }
        Ok(match &self.pending {
            Some(byte) => std::slice::from_ref(byte),
            None => &[],
        })
    }

    fn consume(&mut self, amt: usize) {
        if amt > 0 {
            self.pending = None;
        }
    }
}
