//! CarData.z：遥测通道
//!
//! 通道 0 转速、2 速度、3 档位、4 油门、5 刹车、45 DRS。

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::feed::{StreamName, parse_time};
use crate::model::{DriverState, TelemetrySample};

use super::decoder::Decoder;
use super::shape::str_field;

const STREAM: StreamName = StreamName::CarData;

/// DRS 通道中表示襟翼打开的取值。
const DRS_OPEN: [i64; 3] = [10, 12, 14];
const DRS_CHANNEL: &str = "45";

impl Decoder {
    pub(super) fn decode_car_data(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> (Vec<TelemetrySample>, Vec<DriverState>) {
        let mut samples = Vec::new();
        let mut drivers = Vec::new();
        let Some(entries) = payload.get("Entries").and_then(Value::as_array) else {
            self.parse_error(STREAM, timestamp, "Entries", "expected a list");
            return (samples, drivers);
        };

        let selection = self.telemetry.borrow().clone();
        let want_telemetry = self.caps.telemetry;
        for entry in entries {
            let sample_at = match str_field(entry, "Utc").map(parse_time) {
                Some(Ok(at)) => at,
                Some(Err(err)) => {
                    self.parse_error(STREAM, timestamp, "Utc", err);
                    timestamp
                }
                None => timestamp,
            };
            let Some(cars) = entry.get("Cars").and_then(Value::as_object) else {
                continue;
            };

            for (number, car) in cars {
                let Ok(car_number) = number.parse::<u32>() else {
                    self.parse_error(STREAM, timestamp, "Cars", format!("unexpected car key '{number}'"));
                    continue;
                };
                let Some(channels) = car.get("Channels").and_then(Value::as_object) else {
                    continue;
                };

                // 未选中的车辆只读 DRS 通道
                if !(want_telemetry && selection.allows(car_number)) {
                    if let Some(drs) = channels.get(DRS_CHANNEL).and_then(Value::as_f64) {
                        self.track_drs(number, DRS_OPEN.contains(&(drs as i64)), timestamp, &mut drivers);
                    }
                    continue;
                }

                let mut sample = TelemetrySample::new(sample_at, car_number);
                for (id, value) in channels {
                    let Some(value) = value.as_f64() else {
                        self.parse_error(STREAM, timestamp, "Channels", format!("channel {id} is not numeric"));
                        continue;
                    };
                    match id.as_str() {
                        "0" => sample.rpm = value,
                        "2" => sample.speed = value,
                        "3" => sample.gear = value,
                        "4" => sample.throttle = value,
                        "5" => sample.brake = value,
                        DRS_CHANNEL => sample.drs_open = DRS_OPEN.contains(&(value as i64)),
                        _ => self.parse_error(STREAM, timestamp, "Channels", format!("unhandled channel {id}")),
                    }
                }
                self.track_drs(number, sample.drs_open, timestamp, &mut drivers);
                samples.push(sample);
            }
        }
        (samples, drivers)
    }

    fn track_drs(&mut self, number: &str, open: bool, timestamp: DateTime<Utc>, changed: &mut Vec<DriverState>) {
        if let Some(driver) = self.drivers.get_mut(number) {
            if driver.drs_open != open {
                driver.drs_open = open;
                driver.timestamp = timestamp;
                changed.push(driver.clone());
            }
        }
    }
}
