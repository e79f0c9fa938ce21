//! 单个流的读取游标
//!
//! 每行形如 `HH:MM:SS.mmm<payload>`：未压缩流的载荷以 `{` 开始，压缩流的载荷是
//! 带引号的 base64 文本。偏移前可能有不可见字符，只取载荷前的 12 个字符。

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::feed::{Record, StreamName, TimeParseError, format_time, parse_offset};

use super::source::{NOT_FOUND_RESPONSE, StreamLines};

const OFFSET_LEN: usize = 12;

pub(crate) struct StreamCursor {
    stream: StreamName,
    lines: Option<StreamLines>,
    session_start: DateTime<Utc>,
    pending: Option<(DateTime<Utc>, String)>,
    first_line: bool,
}

impl StreamCursor {
    pub(crate) fn new(stream: StreamName, lines: Option<StreamLines>, session_start: DateTime<Utc>) -> Self {
        Self {
            stream,
            lines,
            session_start,
            pending: None,
            first_line: true,
        }
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.lines.is_none() && self.pending.is_none()
    }

    /// 把所有时间戳不晚于 `now` 的记录追加到 `out`。
    pub(crate) fn release_due(&mut self, now: DateTime<Utc>, out: &mut Vec<Record>) {
        loop {
            if self.pending.is_none() {
                self.pending = self.next_entry();
            }
            let Some((at, _)) = &self.pending else {
                return;
            };
            if *at > now {
                return;
            }
            if let Some((at, payload)) = self.pending.take() {
                out.push(Record::new(self.stream.as_str(), payload.into_bytes(), format_time(at)));
            }
        }
    }

    /// 读取下一条可解析的行；读尽或出错时关闭游标。
    fn next_entry(&mut self) -> Option<(DateTime<Utc>, String)> {
        loop {
            let line = match self.lines.as_mut()?.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    warn!(stream = %self.stream, error = %err, "读取归档流失败，停止该流");
                    self.lines = None;
                    return None;
                }
                None => {
                    debug!(stream = %self.stream, "归档流读取完毕");
                    self.lines = None;
                    return None;
                }
            };
            if std::mem::take(&mut self.first_line) && line.trim() == NOT_FOUND_RESPONSE {
                warn!(stream = %self.stream, "归档流不存在");
                self.lines = None;
                return None;
            }
            if line.trim().is_empty() {
                continue;
            }
            match split_line(self.stream, &line, self.session_start) {
                Ok(entry) => return Some(entry),
                Err(err) => debug!(stream = %self.stream, error = %err, "跳过无法解析的行"),
            }
        }
    }
}

/// 拆出一行的时间戳与载荷。
pub(crate) fn split_line(
    stream: StreamName,
    line: &str,
    session_start: DateTime<Utc>,
) -> Result<(DateTime<Utc>, String), TimeParseError> {
    let line = line.trim_end();
    let marker = if stream.is_compressed() { '"' } else { '{' };
    let start = line.find(marker).ok_or_else(|| TimeParseError {
        value: line.to_string(),
        reason: "no payload on line",
    })?;
    let offset = start
        .checked_sub(OFFSET_LEN)
        .and_then(|from| line.get(from..start))
        .ok_or_else(|| TimeParseError {
            value: line.to_string(),
            reason: "no clock offset before payload",
        })?;
    let at = session_start + parse_offset(offset)?;

    let payload = if stream.is_compressed() {
        let body = &line[start + 1..];
        body.strip_suffix('"').unwrap_or(body)
    } else {
        &line[start..]
    };
    Ok((at, payload.to_string()))
}
