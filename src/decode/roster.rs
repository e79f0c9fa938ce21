//! DriverList：建立车手状态
//!
//! 每个车号只创建一次，之后的 DriverList 更新不会改写已有车手。

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::feed::StreamName;
use crate::model::{DriverRoster, DriverState, RgbColor};

use super::decoder::Decoder;
use super::shape::{count_field, ordered_entries, str_field};

impl Decoder {
    pub(super) fn decode_driver_list(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Option<DriverRoster> {
        let Some(entries) = ordered_entries(payload) else {
            self.parse_error(StreamName::DriverList, timestamp, "<root>", "expected an object");
            return None;
        };

        let mut added = Vec::new();
        for (key, info) in entries {
            if key == "_kf" || self.drivers.contains_key(&key) || !info.is_object() {
                continue;
            }
            let Ok(number) = key.parse::<u32>() else {
                self.parse_error(StreamName::DriverList, timestamp, "RacingNumber", format!("'{key}'"));
                continue;
            };

            let mut driver = DriverState::new(number, timestamp);
            driver.position = count_field(info, "Line").unwrap_or(0);
            driver.name = str_field(info, "FullName").unwrap_or_default().to_string();
            driver.short_name = str_field(info, "Tla").unwrap_or_default().to_string();
            driver.team = str_field(info, "TeamName").unwrap_or_default().to_string();
            if let Some(hex) = str_field(info, "TeamColour") {
                match RgbColor::from_hex(hex) {
                    Some(color) => driver.color = color,
                    None => self.parse_error(
                        StreamName::DriverList,
                        timestamp,
                        "TeamColour",
                        format!("'{hex}' is not a hex colour"),
                    ),
                }
            }
            driver.hex_color = driver.color.to_hex();

            added.push(driver.info());
            self.drivers.insert(key, driver);
        }

        if added.is_empty() {
            return None;
        }
        Some(DriverRoster {
            timestamp,
            drivers: added,
        })
    }
}
