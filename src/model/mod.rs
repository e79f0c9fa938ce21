//! 领域模型
//!
//! 解码器产出、节拍器（pacer）转发的全部实体类型。

// 子模块声明
mod driver;
mod samples;
mod session;
mod slots;

// 重新导出公共接口
pub use driver::{CarLocation, DriverState, PitStop, SectorTime, SegmentStatus, TireCompound};
pub use samples::{
    DriverInfo, DriverRoster, EventTime, FlagScope, PositionSample, RaceControlMessage, RadioClip,
    RgbColor, TelemetrySample, WeatherSample,
};
pub use session::{
    DrsState, EventType, FlagState, SafetyCarState, SessionAggregate, SessionKind, SessionStatus,
};
pub use slots::{MAX_SEGMENTS, Slots};

/// 以毫秒序列化 `TimeDelta`。
pub(crate) mod millis {
    use chrono::TimeDelta;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(value.num_milliseconds())
    }

    pub fn serialize_opt<S: Serializer>(value: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => s.serialize_some(&v.num_milliseconds()),
            None => s.serialize_none(),
        }
    }
}
