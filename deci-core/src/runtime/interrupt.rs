//! 中断标志
//!
//! 信号处理线程置位，虚拟机在每条指令分发前检查。
//! 这是唯一跨线程共享的状态，原子布尔即可，不需要锁。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 可克隆的中断标志
///
/// 克隆体共享同一底层原子量：信号处理器持有一份，
/// 虚拟机持有一份。
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    inner: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求中断（信号处理器调用，async-signal-safe）
    pub fn trigger(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// 是否有未处理的中断
    pub fn is_set(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// 取走中断：返回旧值并复位
    ///
    /// 虚拟机在安全点调用，保证一次 Ctrl-C 只取消一次执行。
    pub fn take(&self) -> bool {
        self.inner.swap(false, Ordering::SeqCst)
    }

    /// 复位
    pub fn clear(&self) {
        self.inner.store(false, Ordering::SeqCst);
    }
}
