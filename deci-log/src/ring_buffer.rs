//! 日志环形缓冲 sink
//!
//! 固定容量，写满后覆盖最旧记录。测试用它断言日志内容，
//! CLI 崩溃诊断时可以 dump 最后 N 条。

use crate::logger::LogSink;
use crate::record::Record;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 日志环形缓冲区
///
/// Clone 共享同一块缓冲（内部 Arc）。
#[derive(Clone)]
pub struct LogRingBuffer {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    records: VecDeque<Record>,
    capacity: usize,
    /// 被覆盖丢弃的记录数
    dropped: u64,
}

impl LogRingBuffer {
    /// 创建容量为 capacity 的环形缓冲
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                dropped: 0,
            })),
        }
    }

    /// 当前记录数
    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.records.len()).unwrap_or(0)
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 被覆盖丢弃的记录数
    pub fn dropped(&self) -> u64 {
        self.inner.lock().map(|g| g.dropped).unwrap_or(0)
    }

    /// 清空缓冲
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.records.clear();
            guard.dropped = 0;
        }
    }

    /// 导出所有记录（从旧到新）
    pub fn dump_records(&self) -> Vec<Record> {
        self.inner
            .lock()
            .map(|g| g.records.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl LogSink for LogRingBuffer {
    fn write(&self, record: &Record) {
        if let Ok(mut guard) = self.inner.lock() {
            if guard.records.len() == guard.capacity {
                guard.records.pop_front();
                guard.dropped += 1;
            }
            guard.records.push_back(record.clone());
        }
    }
}
