//! 流名称（Stream names）
//!
//! 归档与实时 feed 共用同一套流名称；以 `.z` 结尾的流载荷是 base64 + deflate 压缩的。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 已知的 feed 流。
///
/// `EndOfData` 与 `Catchup` 是合成流：前者标记回放结束，后者携带订阅时的全量快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StreamName {
    DriverList,
    SessionInfo,
    LapCount,
    ExtrapolatedClock,
    TrackStatus,
    TimingData,
    TimingAppData,
    SessionStatus,
    SessionData,
    Heartbeat,
    TimingStats,
    CarData,
    Position,
    WeatherData,
    RaceControlMessages,
    TopThree,
    AudioStreams,
    TeamRadio,
    ContentStreams,
    EndOfData,
    Catchup,
}

impl StreamName {
    /// 归档回放与 catch-up 的固定处理顺序。
    pub const ORDERED: [StreamName; 19] = [
        StreamName::DriverList,
        StreamName::SessionInfo,
        StreamName::LapCount,
        StreamName::ExtrapolatedClock,
        StreamName::TrackStatus,
        StreamName::TimingData,
        StreamName::TimingAppData,
        StreamName::SessionStatus,
        StreamName::SessionData,
        StreamName::Heartbeat,
        StreamName::TimingStats,
        StreamName::CarData,
        StreamName::Position,
        StreamName::WeatherData,
        StreamName::RaceControlMessages,
        StreamName::TopThree,
        StreamName::AudioStreams,
        StreamName::TeamRadio,
        StreamName::ContentStreams,
    ];

    pub const COMPRESSED_SUFFIX: &'static str = ".z";

    pub fn as_str(self) -> &'static str {
        match self {
            StreamName::DriverList => "DriverList",
            StreamName::SessionInfo => "SessionInfo",
            StreamName::LapCount => "LapCount",
            StreamName::ExtrapolatedClock => "ExtrapolatedClock",
            StreamName::TrackStatus => "TrackStatus",
            StreamName::TimingData => "TimingData",
            StreamName::TimingAppData => "TimingAppData",
            StreamName::SessionStatus => "SessionStatus",
            StreamName::SessionData => "SessionData",
            StreamName::Heartbeat => "Heartbeat",
            StreamName::TimingStats => "TimingStats",
            StreamName::CarData => "CarData.z",
            StreamName::Position => "Position.z",
            StreamName::WeatherData => "WeatherData",
            StreamName::RaceControlMessages => "RaceControlMessages",
            StreamName::TopThree => "TopThree",
            StreamName::AudioStreams => "AudioStreams",
            StreamName::TeamRadio => "TeamRadio",
            StreamName::ContentStreams => "ContentStreams",
            StreamName::EndOfData => "EndOfData",
            StreamName::Catchup => "Catchup",
        }
    }

    pub fn parse(name: &str) -> Option<StreamName> {
        if name == StreamName::EndOfData.as_str() {
            return Some(StreamName::EndOfData);
        }
        if name == StreamName::Catchup.as_str() {
            return Some(StreamName::Catchup);
        }
        StreamName::ORDERED
            .into_iter()
            .find(|stream| stream.as_str() == name)
    }

    pub fn is_compressed(self) -> bool {
        self.as_str().ends_with(Self::COMPRESSED_SUFFIX)
    }

    /// 归档目录中的文件名，例如 `CarData.z.jsonStream`。
    pub fn file_name(self) -> String {
        format!("{}.jsonStream", self.as_str())
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
