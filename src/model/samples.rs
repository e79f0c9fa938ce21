//! 独立样本与消息
//!
//! 遥测、位置、天气、赛事指挥、车队无线电以及车手名单。

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::millis;
use super::session::FlagState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor {
        r: 0xff,
        g: 0xff,
        b: 0xff,
    };

    /// `RRGGBB`，可带前导 `#`。
    pub fn from_hex(hex: &str) -> Option<RgbColor> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(RgbColor {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverInfo {
    pub start_position: u32,
    pub name: String,
    pub short_name: String,
    pub number: u32,
    pub team: String,
    pub hex_color: String,
    pub color: RgbColor,
}

/// 一批新出现的车手。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverRoster {
    pub timestamp: DateTime<Utc>,
    pub drivers: Vec<DriverInfo>,
}

/// 旗帜作用范围。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagScope {
    Track,
    /// 0 起始的分段下标
    Sector(usize),
    Driver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceControlMessage {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub flag: FlagState,
    pub scope: Option<FlagScope>,
    pub lap: Option<u32>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    pub driver_number: u32,
    pub rpm: f64,
    pub speed: f64,
    pub gear: f64,
    pub throttle: f64,
    pub brake: f64,
    pub drs_open: bool,
}

impl TelemetrySample {
    pub fn new(timestamp: DateTime<Utc>, driver_number: u32) -> Self {
        Self {
            timestamp,
            driver_number,
            rpm: 0.0,
            speed: 0.0,
            gear: 0.0,
            throttle: 0.0,
            brake: 0.0,
            drs_open: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSample {
    pub timestamp: DateTime<Utc>,
    pub driver_number: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    pub air_temp: f64,
    pub humidity: f64,
    pub air_pressure: f64,
    pub rainfall: bool,
    pub track_temp: f64,
    pub wind_direction: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadioClip {
    pub timestamp: DateTime<Utc>,
    pub driver_number: u32,
    pub driver_name: String,
    pub path: String,
    #[serde(skip)]
    pub audio: Vec<u8>,
}

/// 节拍模式下每个节拍发出的虚拟时间与剩余时间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventTime {
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "millis::serialize")]
    pub remaining: TimeDelta,
}
