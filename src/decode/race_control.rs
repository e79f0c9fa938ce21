//! RaceControlMessages：赛事指挥
//!
//! 每条消息原样转发；特定消息文本与旗帜同时更新会话聚合状态，
//! 排位赛中挥方格旗时维修区内的车手被标记为已完赛。

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::feed::{StreamName, parse_time};
use crate::model::{
    DrsState, DriverState, FlagScope, FlagState, MAX_SEGMENTS, RaceControlMessage, SafetyCarState,
    SessionAggregate,
};

use super::decoder::Decoder;
use super::shape::{count_field, number_field, ordered_entries, str_field};

const STREAM: StreamName = StreamName::RaceControlMessages;

#[derive(Debug, Default)]
pub(super) struct RaceControlOutput {
    pub messages: Vec<RaceControlMessage>,
    pub events: Vec<SessionAggregate>,
    pub drivers: Vec<DriverState>,
}

impl Decoder {
    pub(super) fn decode_race_control(&mut self, payload: &Value, timestamp: DateTime<Utc>) -> RaceControlOutput {
        let mut out = RaceControlOutput::default();
        let Some(messages) = payload.get("Messages").and_then(|m| ordered_entries(m)) else {
            self.parse_error(STREAM, timestamp, "Messages", "expected a list or an object");
            return out;
        };
        for (_, msg) in messages {
            self.read_race_control_message(msg, timestamp, &mut out);
        }
        out
    }

    fn read_race_control_message(&mut self, msg: &Value, timestamp: DateTime<Utc>, out: &mut RaceControlOutput) {
        let at = match str_field(msg, "Utc").map(parse_time) {
            Some(Ok(at)) => at,
            Some(Err(err)) => {
                self.parse_error(STREAM, timestamp, "Utc", err);
                return;
            }
            None => {
                self.parse_error(STREAM, timestamp, "Utc", "missing");
                return;
            }
        };
        let text = str_field(msg, "Message").unwrap_or_default();
        let flag_text = str_field(msg, "Flag");
        let flag = flag_text.and_then(FlagState::from_feed).unwrap_or_default();
        let scope_text = str_field(msg, "Scope").unwrap_or_default();

        // feed 中分段从 1 开始编号，0 无效
        let sector = if scope_text == "Sector" {
            number_field(msg, "Sector")
                .map(|s| s as i64 - 1)
                .filter(|s| (0..MAX_SEGMENTS as i64).contains(s))
                .map(|s| s as usize)
        } else {
            None
        };
        let scope = match scope_text {
            "Track" => Some(FlagScope::Track),
            "Sector" => sector.map(FlagScope::Sector),
            "Driver" => Some(FlagScope::Driver),
            _ => None,
        };
        if scope_text == "Sector" && sector.is_none() {
            self.parse_error(STREAM, at, "Sector", "sector outside track layout");
        }

        out.messages.push(RaceControlMessage {
            timestamp: at,
            message: text.to_string(),
            flag,
            scope,
            lap: count_field(msg, "Lap"),
            category: str_field(msg, "Category").map(str::to_string),
        });

        let changed = match text {
            "GREEN LIGHT - PIT EXIT OPEN" => {
                self.aggregate.pit_exit_open = true;
                true
            }
            "RED LIGHT - PIT EXIT CLOSED" => {
                self.aggregate.pit_exit_open = false;
                true
            }
            "VIRTUAL SAFETY CAR DEPLOYED" => self.set_safety_car(SafetyCarState::VirtualDeployed),
            "VIRTUAL SAFETY CAR ENDING" => self.set_safety_car(SafetyCarState::VirtualEnding),
            "SAFETY CAR DEPLOYED" => self.set_safety_car(SafetyCarState::Deployed),
            "SAFETY CAR IN THIS LAP" => self.set_safety_car(SafetyCarState::Ending),
            "DRS ENABLED" => {
                self.aggregate.drs_enabled = DrsState::Enabled;
                true
            }
            "DRS DISABLED" => {
                self.aggregate.drs_enabled = DrsState::Disabled;
                true
            }
            _ => false,
        };
        if changed {
            self.aggregate.timestamp = at;
            out.events.push(self.aggregate.clone());
        }

        let Some(flag_text) = flag_text else {
            return;
        };
        if !flag_text.is_empty() && FlagState::from_feed(flag_text).is_none() {
            self.parse_error(STREAM, at, "Flag", format!("unhandled flag '{flag_text}'"));
            return;
        }

        let track = scope_text == "Track";
        match flag {
            FlagState::Red | FlagState::Yellow | FlagState::DoubleYellow => {
                if track {
                    self.aggregate.track_status = flag;
                }
                if let Some(sector) = sector {
                    self.aggregate.segment_flags[sector] = flag;
                }
            }
            FlagState::Green => {
                if track {
                    self.aggregate.track_status = FlagState::Green;
                    self.aggregate.safety_car = SafetyCarState::Clear;
                }
                if scope_text == "Sector" {
                    if let Some(sector) = sector {
                        self.aggregate.segment_flags[sector] = FlagState::Green;
                    }
                } else {
                    self.aggregate.segment_flags.fill(FlagState::Green);
                }
            }
            FlagState::Chequered => {
                self.aggregate.track_status = FlagState::Chequered;
                if self.aggregate.event_type.is_qualifying_stage() {
                    for driver in self.drivers.values_mut() {
                        if driver.location.in_pits() {
                            driver.chequered_flag = true;
                            driver.timestamp = at;
                            out.drivers.push(driver.clone());
                        }
                    }
                }
            }
            _ => return,
        }
        self.aggregate.timestamp = at;
        out.events.push(self.aggregate.clone());
    }

    fn set_safety_car(&mut self, state: SafetyCarState) -> bool {
        self.aggregate.safety_car = state;
        true
    }
}
