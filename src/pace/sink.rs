use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::model::{
    DriverRoster, DriverState, PositionSample, RaceControlMessage, RadioClip, SessionAggregate,
    TelemetrySample, WeatherSample,
};

/// 解码器的输出端。实现必须是非阻塞的。
pub trait EventSink: Send + Sync {
    fn add_drivers(&self, roster: DriverRoster);
    fn add_timing(&self, driver: DriverState);
    fn add_event(&self, event: SessionAggregate);
    fn add_race_control(&self, msg: RaceControlMessage);
    fn add_weather(&self, weather: WeatherSample);
    fn add_telemetry(&self, sample: TelemetrySample);
    fn add_location(&self, sample: PositionSample);
    fn add_radio(&self, clip: RadioClip);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacerState {
    #[default]
    Running,
    Paused,
}

/// 回放控制。立即模式下除暂停标记外都是空操作。
pub trait Pacer: EventSink {
    fn pause(&self);
    fn resume(&self);
    fn is_paused(&self) -> bool;
    fn skip_laps(&self, laps: u32);
    fn skip_to_session_start(&self);
    fn increment_time(&self, by: TimeDelta);
    /// 尚未释放的缓冲实体数
    fn buffered(&self) -> usize;

    fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    fn state(&self) -> PacerState {
        if self.is_paused() {
            PacerState::Paused
        } else {
            PacerState::Running
        }
    }
}
