//! 解码统计
//!
//! 解码任务与管线句柄之间共享，计数器用原子量。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct DecodeStats {
    records: AtomicU64,
    dropped_records: AtomicU64,
    parse_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeSnapshot {
    pub records: u64,
    pub dropped_records: u64,
    pub parse_errors: u64,
}

impl DecodeStats {
    pub(crate) fn record_decoded(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped_records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DecodeSnapshot {
        DecodeSnapshot {
            records: self.records.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}
