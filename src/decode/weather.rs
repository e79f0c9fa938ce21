//! WeatherData
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::WeatherSample;

use super::decoder::Decoder;
use super::shape::number_field;

impl Decoder {
    pub(super) fn decode_weather(&self, payload: &Value, timestamp: DateTime<Utc>) -> WeatherSample {
        let field = |key: &str| number_field(payload, key).unwrap_or_default();
        WeatherSample {
            timestamp,
            air_temp: field("AirTemp"),
            humidity: field("Humidity"),
            air_pressure: field("Pressure"),
            rainfall: rainfall(payload.get("Rainfall")),
            track_temp: field("TrackTemp"),
            wind_direction: field("WindDirection"),
            wind_speed: field("WindSpeed"),
        }
    }
}

fn rainfall(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
        _ => false,
    }
}
