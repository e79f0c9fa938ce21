//! 按时间戳释放的 FIFO 缓冲
//!
//! 同一种实体严格按到达顺序释放；释放条件只看队首。

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::model::{
    DriverRoster, DriverState, PositionSample, RaceControlMessage, RadioClip, SessionAggregate,
    TelemetrySample, WeatherSample,
};

pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

macro_rules! impl_timestamped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Timestamped for $ty {
                fn timestamp(&self) -> DateTime<Utc> {
                    self.timestamp
                }
            }
        )*
    };
}

impl_timestamped!(
    DriverRoster,
    DriverState,
    PositionSample,
    RaceControlMessage,
    RadioClip,
    SessionAggregate,
    TelemetrySample,
    WeatherSample,
);

#[derive(Debug)]
pub struct TimedBuffer<T> {
    q: VecDeque<T>,
}

impl<T> Default for TimedBuffer<T> {
    fn default() -> Self {
        Self { q: VecDeque::new() }
    }
}

impl<T: Timestamped> TimedBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.q.push_back(item);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.q.pop_front()
    }

    pub fn front_timestamp(&self) -> Option<DateTime<Utc>> {
        self.q.front().map(Timestamped::timestamp)
    }

    /// 弹出队首所有时间戳不晚于 `until` 的实体。
    pub fn drain_due(&mut self, until: DateTime<Utc>) -> Vec<T> {
        let mut due = Vec::new();
        while self.front_timestamp().is_some_and(|ts| ts <= until) {
            if let Some(item) = self.q.pop_front() {
                due.push(item);
            }
        }
        due
    }

    /// 丢弃队首所有时间戳不晚于 `until` 的实体，返回丢弃数量。
    pub fn discard_due(&mut self, until: DateTime<Utc>) -> usize {
        let before = self.q.len();
        while self.front_timestamp().is_some_and(|ts| ts <= until) {
            self.q.pop_front();
        }
        before - self.q.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.q.iter()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}
