//! TeamRadio：车队无线电片段
//!
//! 音频通过资源存储按路径取回；取不到的片段记录后跳过。

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::feed::{StreamName, parse_time};
use crate::model::RadioClip;

use super::decoder::Decoder;
use super::shape::{count_field, ordered_entries, str_field};

const STREAM: StreamName = StreamName::TeamRadio;

impl Decoder {
    pub(super) fn decode_team_radio(&self, payload: &Value, timestamp: DateTime<Utc>) -> Vec<RadioClip> {
        let Some(captures) = payload.get("Captures").and_then(|c| ordered_entries(c)) else {
            self.parse_error(STREAM, timestamp, "Captures", "expected a list or an object");
            return Vec::new();
        };

        let mut clips = Vec::new();
        for (_, capture) in captures {
            let Some(path) = str_field(capture, "Path") else {
                self.parse_error(STREAM, timestamp, "Path", "missing");
                continue;
            };
            let at = match str_field(capture, "Utc").map(parse_time) {
                Some(Ok(at)) => at,
                Some(Err(err)) => {
                    self.parse_error(STREAM, timestamp, "Utc", err);
                    continue;
                }
                None => timestamp,
            };
            let number = str_field(capture, "RacingNumber").unwrap_or_default();
            let audio = match self.assets.team_radio(path) {
                Ok(audio) => audio,
                Err(err) => {
                    warn!(path, error = %err, "🔇 无线电音频获取失败，跳过");
                    continue;
                }
            };
            clips.push(RadioClip {
                timestamp: at,
                driver_number: number.parse().ok().or_else(|| count_field(capture, "RacingNumber")).unwrap_or(0),
                driver_name: self.drivers.get(number).map(|d| d.name.clone()).unwrap_or_default(),
                path: path.to_string(),
                audio,
            });
        }
        clips
    }
}
