//! 能力开关
//!
//! 决定哪些实体会被发往下游；带状态的流无论开关如何都会被解释。

use serde::{Deserialize, Serialize};

use crate::feed::StreamName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub event_time: bool,
    pub event: bool,
    pub race_control: bool,
    pub weather: bool,
    pub timing: bool,
    pub telemetry: bool,
    pub location: bool,
    pub team_radio: bool,
}

impl Capabilities {
    pub const fn all() -> Self {
        Self {
            event_time: true,
            event: true,
            race_control: true,
            weather: true,
            timing: true,
            telemetry: true,
            location: true,
            team_radio: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            event_time: false,
            event: false,
            race_control: false,
            weather: false,
            timing: false,
            telemetry: false,
            location: false,
            team_radio: false,
        }
    }

    /// 无状态流的载荷是否值得解码；其余流总是需要解释。
    pub fn decodes(&self, stream: StreamName) -> bool {
        match stream {
            StreamName::Position => self.location,
            StreamName::CarData => self.telemetry || self.timing,
            StreamName::WeatherData => self.weather,
            StreamName::TeamRadio => self.team_radio,
            _ => true,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}
