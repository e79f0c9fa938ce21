//! 时间语法
//!
//! - 时间戳：RFC 3339，或不带时区的 `YYYY-MM-DDTHH:MM:SS[.fffffff]`（按 UTC 处理）
//! - 时长：`[+|-][[H:]M:]S[.fff]`，例如 `+1:23.456`
//! - 时钟：`H:MM:SS`（剩余时间）
//! - 归档偏移：`HH:MM:SS.mmm`（每行前缀，相对会话开始）

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const NANOS_PER_SEC: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to parse '{value}': {reason}")]
pub struct TimeParseError {
    pub value: String,
    pub reason: &'static str,
}

impl TimeParseError {
    fn new(value: &str, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }
}

/// catch-up 快照使用的时间戳：时间轴上的"尚未设定"。
pub fn catchup_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

pub fn is_unset(ts: DateTime<Utc>) -> bool {
    ts <= catchup_epoch()
}

pub fn parse_time(value: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| TimeParseError::new(value, "not a recognized timestamp"))
}

pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.format(OUTPUT_FORMAT).to_string()
}

/// 解析 feed 时长文本；前导 `+` 被忽略，前导 `-` 得到负值。
pub fn parse_duration(value: &str) -> Result<TimeDelta, TimeParseError> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'+') => (false, &trimmed[1..]),
        Some(b'-') => (true, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if body.is_empty() {
        return Err(TimeParseError::new(value, "empty duration"));
    }

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() > 3 {
        return Err(TimeParseError::new(value, "too many ':' separated fields"));
    }
    let (leading, seconds) = parts.split_at(parts.len() - 1);

    let mut minutes: i64 = 0;
    for part in leading {
        let field = digits(value, part)?;
        minutes = minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(field))
            .ok_or_else(|| TimeParseError::new(value, "duration out of range"))?;
    }

    let (whole, fraction) = seconds[0].split_once('.').unwrap_or((seconds[0], ""));
    let secs = digits(value, whole)?;
    let nanos = fraction_nanos(value, fraction)?;

    let total = minutes
        .checked_mul(60)
        .and_then(|s| s.checked_add(secs))
        .and_then(|s| s.checked_mul(NANOS_PER_SEC))
        .and_then(|n| n.checked_add(nanos))
        .ok_or_else(|| TimeParseError::new(value, "duration out of range"))?;

    let delta = TimeDelta::nanoseconds(total);
    Ok(if negative { -delta } else { delta })
}

/// `H:MM:SS` 形式的时钟读数。
pub fn parse_clock(value: &str) -> Result<TimeDelta, TimeParseError> {
    if value.trim().split(':').count() != 3 {
        return Err(TimeParseError::new(value, "expected H:MM:SS"));
    }
    parse_duration(value)
}

/// 归档行前缀 `HH:MM:SS.mmm`。
pub fn parse_offset(value: &str) -> Result<TimeDelta, TimeParseError> {
    let bytes = value.as_bytes();
    if bytes.len() != 12 || bytes[2] != b':' || bytes[5] != b':' || bytes[8] != b'.' {
        return Err(TimeParseError::new(value, "expected HH:MM:SS.mmm"));
    }
    parse_duration(value)
}

fn digits(value: &str, field: &str) -> Result<i64, TimeParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::new(value, "expected decimal digits"));
    }
    field
        .parse()
        .map_err(|_| TimeParseError::new(value, "duration out of range"))
}

fn fraction_nanos(value: &str, fraction: &str) -> Result<i64, TimeParseError> {
    if fraction.is_empty() {
        return Ok(0);
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::new(value, "expected decimal fraction"));
    }
    let mut nanos: i64 = 0;
    for (i, b) in fraction.bytes().take(9).enumerate() {
        nanos += i64::from(b - b'0') * 10_i64.pow(8 - i as u32);
    }
    Ok(nanos)
}
