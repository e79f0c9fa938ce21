//! DropTail（尾丢弃）输出队列
//!
//! 当通道已满或消费者已离开时，直接丢弃新到达的实体并计数。

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

pub struct OutputQueue<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
    dropped: Arc<AtomicU64>,
}

/// 创建一条容量为 `capacity` 的尾丢弃队列（容量至少为 1）。
pub fn drop_tail<T>(name: &'static str, capacity: usize) -> (OutputQueue<T>, mpsc::Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let queue = OutputQueue {
        name,
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (queue, rx)
}

impl<T> OutputQueue<T> {
    /// 入队：成功返回 Ok；若被丢弃则返回 Err(item)
    pub fn push(&self, item: T) -> Result<(), T> {
        match self.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(item)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(queue = self.name, dropped, "队列已满，丢弃");
                Err(item)
            }
            Err(TrySendError::Closed(item)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(queue = self.name, "消费者已关闭，丢弃");
                Err(item)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn drop_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

impl<T> Clone for OutputQueue<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> fmt::Debug for OutputQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputQueue")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("dropped", &self.dropped())
            .finish()
    }
}
