//! TimingAppData：发车位与轮胎
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::feed::StreamName;
use crate::model::{DriverState, TireCompound};

use super::decoder::Decoder;
use super::shape::{count_field, ordered_entries, str_field};

const STREAM: StreamName = StreamName::TimingAppData;

impl Decoder {
    pub(super) fn decode_timing_app_data(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Vec<DriverState> {
        let Some(lines) = payload.get("Lines").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut updated = Vec::new();
        for (number, line) in lines {
            let Some(mut driver) = self.drivers.get(number).cloned() else {
                continue;
            };
            driver.timestamp = timestamp;

            if let Some(grid) = str_field(line, "GridPos").map(str::trim).filter(|g| !g.is_empty()) {
                match grid.parse() {
                    Ok(pos) => driver.position = pos,
                    Err(_) => self.parse_error(STREAM, timestamp, "GridPos", format!("'{grid}'")),
                }
            }

            if let Some(stints) = line.get("Stints") {
                match ordered_entries(stints) {
                    Some(entries) => {
                        for (_, stint) in entries {
                            self.merge_stint(&mut driver, stint, timestamp);
                        }
                    }
                    None => self.parse_error(STREAM, timestamp, "Stints", "expected a list or an object"),
                }
            }

            self.drivers.insert(number.clone(), driver.clone());
            updated.push(driver);
        }
        updated
    }

    fn merge_stint(&self, driver: &mut DriverState, stint: &Value, ts: DateTime<Utc>) {
        if let Some(compound) = str_field(stint, "Compound") {
            match TireCompound::from_feed(compound) {
                Some(tire) => driver.tire = tire,
                None => self.parse_error(STREAM, ts, "Compound", format!("unhandled compound '{compound}'")),
            }
        }
        if let Some(laps) = count_field(stint, "TotalLaps") {
            driver.laps_on_tire = laps;
        }
    }
}
