//! 时间轴合并
//!
//! 会话开始时间 = 时钟流第一行的 Utc 减去该行偏移。之后以固定步长推进虚拟时间，
//! 每一步按固定流顺序释放各流中到期的记录；全部流读尽后追加一条结束哨兵。

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::feed::{Record, StreamName, parse_offset, parse_time};
use crate::model::SessionKind;

use super::cursor::StreamCursor;
use super::error::ReplayError;
use super::source::{NOT_FOUND_RESPONSE, StreamSource};

/// 2018 年及以前的归档没有这些流。
const FIRST_YEAR_WITH_POSITION: i32 = 2019;

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub session: SessionKind,
    pub year: Option<i32>,
    pub step: TimeDelta,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            session: SessionKind::Race,
            year: None,
            step: TimeDelta::seconds(1),
        }
    }
}

impl ReplayOptions {
    pub fn includes(&self, stream: StreamName) -> bool {
        match stream {
            StreamName::Position | StreamName::ContentStreams => {
                self.year.is_none_or(|year| year >= FIRST_YEAR_WITH_POSITION)
            }
            StreamName::LapCount => self.session.is_race_like(),
            _ => true,
        }
    }
}

pub struct TimelineMerge {
    cursors: Vec<StreamCursor>,
    session_start: DateTime<Utc>,
    now: DateTime<Utc>,
    step: TimeDelta,
    ready: VecDeque<Record>,
    finished: bool,
}

impl TimelineMerge {
    /// 打开所有选中的流。时钟流缺失是致命错误；其他流缺失只记录日志。
    pub fn open(source: &dyn StreamSource, opts: &ReplayOptions) -> Result<Self, ReplayError> {
        let session_start = session_start_time(source)?;
        info!(session_start = %session_start, session = %opts.session, "📼 开始合并归档流");

        let mut cursors = Vec::new();
        for stream in StreamName::ORDERED {
            if !opts.includes(stream) {
                debug!(stream = %stream, "按会话类别/年份跳过该流");
                continue;
            }
            let lines = source.open(stream)?;
            if lines.is_none() {
                warn!(stream = %stream, "归档中没有该流，视为空");
            }
            cursors.push(StreamCursor::new(stream, lines, session_start));
        }

        Ok(Self {
            cursors,
            session_start,
            now: session_start,
            step: if opts.step > TimeDelta::zero() { opts.step } else { TimeDelta::seconds(1) },
            ready: VecDeque::new(),
            finished: false,
        })
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    /// 下一步将要释放的虚拟时间上界。
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// 推进一步，返回本步到期的全部记录（可能为空）。
    pub fn step(&mut self) -> Vec<Record> {
        let mut due = Vec::new();
        for cursor in &mut self.cursors {
            cursor.release_due(self.now, &mut due);
        }
        self.now += self.step;
        due
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursors.iter().all(StreamCursor::is_exhausted)
    }
}

impl Iterator for TimelineMerge {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(record) = self.ready.pop_front() {
                return Some(record);
            }
            if self.finished {
                return None;
            }
            let due = self.step();
            if due.is_empty() && self.is_exhausted() {
                self.finished = true;
                info!(now = %self.now, "🏁 归档流全部读尽");
                return Some(Record::end_of_data());
            }
            self.ready.extend(due);
        }
    }
}

/// 由时钟流第一行推出会话开始时间。
pub fn session_start_time(source: &dyn StreamSource) -> Result<DateTime<Utc>, ReplayError> {
    let stream = StreamName::ExtrapolatedClock;
    let mut lines = source.open(stream)?.ok_or(ReplayError::MissingClock)?;
    let first = lines
        .next()
        .transpose()
        .map_err(|source| ReplayError::Read {
            stream: stream.to_string(),
            source,
        })?
        .ok_or(ReplayError::MissingClock)?;
    if first.trim() == NOT_FOUND_RESPONSE {
        return Err(ReplayError::MissingClock);
    }

    let invalid = |reason: &str| ReplayError::InvalidClock {
        reason: reason.to_string(),
    };
    let start = first.find('{').ok_or_else(|| invalid("no payload"))?;
    let offset = start
        .checked_sub(12)
        .and_then(|from| first.get(from..start))
        .ok_or_else(|| invalid("no clock offset before payload"))?;
    let offset = parse_offset(offset)?;

    let payload: Value = serde_json::from_str(first[start..].trim_end())
        .map_err(|err| invalid(&format!("payload is not json: {err}")))?;
    let utc = payload
        .get("Utc")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing Utc"))?;
    let utc = parse_time(utc)?;
    Ok(utc - offset)
}
