//! Position.z：车辆坐标
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::feed::{StreamName, parse_time};
use crate::model::PositionSample;

use super::decoder::Decoder;
use super::shape::{number_field, str_field};

const STREAM: StreamName = StreamName::Position;

impl Decoder {
    pub(super) fn decode_position(&self, payload: &Value, timestamp: DateTime<Utc>) -> Vec<PositionSample> {
        let mut samples = Vec::new();
        let Some(batches) = payload.get("Position").and_then(Value::as_array) else {
            self.parse_error(STREAM, timestamp, "Position", "expected a list");
            return samples;
        };

        for batch in batches {
            let at = match str_field(batch, "Timestamp").map(parse_time) {
                Some(Ok(at)) => at,
                Some(Err(err)) => {
                    self.parse_error(STREAM, timestamp, "Timestamp", err);
                    timestamp
                }
                None => timestamp,
            };
            let Some(entries) = batch.get("Entries").and_then(Value::as_object) else {
                continue;
            };
            for (number, entry) in entries {
                let Ok(driver_number) = number.parse::<u32>() else {
                    self.parse_error(STREAM, timestamp, "Entries", format!("unexpected car key '{number}'"));
                    continue;
                };
                samples.push(PositionSample {
                    timestamp: at,
                    driver_number,
                    x: number_field(entry, "X").unwrap_or_default(),
                    y: number_field(entry, "Y").unwrap_or_default(),
                    z: number_field(entry, "Z").unwrap_or_default(),
                    status: str_field(entry, "Status").map(str::to_string),
                });
            }
        }
        samples
    }
}
