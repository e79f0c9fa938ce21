//! 会话级流
//!
//! SessionInfo、SessionStatus、SessionData、LapCount、ExtrapolatedClock、Heartbeat。
//! 会话类型变化或状态变为 Started 时，所有车手的单场字段被清空并重新发出。

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::feed::{StreamName, parse_clock, parse_time};
use crate::model::{DriverState, EventType, SessionAggregate, SessionStatus};

use super::decoder::Decoder;
use super::shape::{bool_field, count_field, number_field, ordered_entries, str_field};

impl Decoder {
    pub(super) fn decode_session_info(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> (SessionAggregate, Vec<DriverState>) {
        if let Some(name) = payload.get("Meeting").and_then(|m| str_field(m, "Name")) {
            self.aggregate.name = name.to_string();
        }
        self.aggregate.heartbeat = true;

        let mut resets = Vec::new();
        if let Some(name) = str_field(payload, "Name") {
            match EventType::from_session_name(name) {
                Some(event_type) if event_type != self.aggregate.event_type => {
                    info!(from = ?self.aggregate.event_type, to = ?event_type, "🔄 会话类型变化，重置车手状态");
                    self.aggregate.event_type = event_type;
                    resets = self.reset_drivers(timestamp);
                }
                Some(_) => {}
                None => self.parse_error(
                    StreamName::SessionInfo,
                    timestamp,
                    "Name",
                    format!("unknown session type '{name}'"),
                ),
            }
        }

        self.aggregate.timestamp = timestamp;
        (self.aggregate.clone(), resets)
    }

    pub(super) fn decode_session_status(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> (SessionAggregate, Vec<DriverState>) {
        let mut resets = Vec::new();
        match str_field(payload, "Status") {
            Some(status) => match SessionStatus::from_feed(status) {
                Some(status) => {
                    self.aggregate.status = status;
                    self.aggregate.status_at = Some(timestamp);
                    if status == SessionStatus::Started {
                        info!("🚦 会话开始，重置车手状态");
                        resets = self.reset_drivers(timestamp);
                    }
                }
                None => self.parse_error(
                    StreamName::SessionStatus,
                    timestamp,
                    "Status",
                    format!("unhandled status '{status}'"),
                ),
            },
            None => self.parse_error(StreamName::SessionStatus, timestamp, "Status", "missing"),
        }

        self.aggregate.timestamp = timestamp;
        (self.aggregate.clone(), resets)
    }

    /// 每个序列条目产出一份快照，时间戳取条目自身的 Utc。
    pub(super) fn decode_session_data(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Vec<SessionAggregate> {
        let series = payload
            .get("Series")
            .and_then(|s| ordered_entries(s))
            .or_else(|| payload.get("StatusSeries").and_then(|s| ordered_entries(s)));
        let Some(series) = series else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(series.len());
        for (_, entry) in series {
            if let Some(part) = number_field(entry, "QualifyingPart") {
                match EventType::from_qualifying_part(part as i64) {
                    Some(event_type) => self.aggregate.event_type = event_type,
                    None => self.parse_error(
                        StreamName::SessionData,
                        timestamp,
                        "QualifyingPart",
                        format!("unhandled value {part}"),
                    ),
                }
            }
            match str_field(entry, "Utc").map(parse_time) {
                Some(Ok(at)) => self.aggregate.timestamp = at,
                Some(Err(err)) => self.parse_error(StreamName::SessionData, timestamp, "Utc", err),
                None => self.aggregate.timestamp = timestamp,
            }
            events.push(self.aggregate.clone());
        }
        events
    }

    pub(super) fn decode_lap_count(&mut self, payload: &Value, timestamp: DateTime<Utc>) -> SessionAggregate {
        if let Some(lap) = count_field(payload, "CurrentLap") {
            self.aggregate.current_lap = lap;
        }
        if let Some(total) = count_field(payload, "TotalLaps") {
            self.aggregate.total_laps = total;
        }
        self.aggregate.timestamp = timestamp;
        self.aggregate.clone()
    }

    pub(super) fn decode_extrapolated_clock(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> SessionAggregate {
        let stream = StreamName::ExtrapolatedClock;
        if let Some(remaining) = str_field(payload, "Remaining") {
            match parse_clock(remaining) {
                Ok(remaining) => self.aggregate.remaining_time = remaining,
                Err(err) => self.parse_error(stream, timestamp, "Remaining", err),
            }
        }

        if let Some(extrapolating) = bool_field(payload, "Extrapolating") {
            if extrapolating {
                match str_field(payload, "Utc").map(parse_time) {
                    Some(Ok(start)) => self.aggregate.session_start_time = Some(start),
                    Some(Err(err)) => self.parse_error(stream, timestamp, "Utc", err),
                    None => self.parse_error(stream, timestamp, "Utc", "missing"),
                }
            }
            self.aggregate.clock_stopped = !extrapolating;
        }

        self.aggregate.timestamp = timestamp;
        self.aggregate.clone()
    }

    pub(super) fn decode_heartbeat(&mut self, timestamp: DateTime<Utc>) -> SessionAggregate {
        self.aggregate.heartbeat = true;
        self.aggregate.timestamp = timestamp;
        self.aggregate.clone()
    }

    fn reset_drivers(&mut self, timestamp: DateTime<Utc>) -> Vec<DriverState> {
        self.drivers
            .values_mut()
            .map(|driver| {
                driver.reset_for_new_session(timestamp);
                driver.clone()
            })
            .collect()
    }
}
