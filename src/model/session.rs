//! 会话聚合状态
//!
//! 整场会话只有一个 `SessionAggregate`，每次变化都会以完整快照向下游发送。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::millis;
use super::slots::Slots;

/// 构造管线时选定的会话类别，决定重算规则与回放流选择。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Practice1,
    Practice2,
    Practice3,
    Qualifying,
    Sprint,
    #[default]
    Race,
    PreSeason,
}

impl SessionKind {
    pub fn is_race_like(self) -> bool {
        matches!(self, SessionKind::Race | SessionKind::Sprint)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Practice1 => "practice1",
            SessionKind::Practice2 => "practice2",
            SessionKind::Practice3 => "practice3",
            SessionKind::Qualifying => "qualifying",
            SessionKind::Sprint => "sprint",
            SessionKind::Race => "race",
            SessionKind::PreSeason => "pre_season",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "practice1" | "practice_1" | "fp1" => Ok(SessionKind::Practice1),
            "practice2" | "practice_2" | "fp2" => Ok(SessionKind::Practice2),
            "practice3" | "practice_3" | "fp3" => Ok(SessionKind::Practice3),
            "qualifying" | "quali" => Ok(SessionKind::Qualifying),
            "sprint" => Ok(SessionKind::Sprint),
            "race" => Ok(SessionKind::Race),
            "pre_season" | "preseason" => Ok(SessionKind::PreSeason),
            _ => Err(format!("unknown session kind: {s}")),
        }
    }
}

/// feed 报告的会话（阶段）类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    Unknown,
    Practice1,
    Practice2,
    Practice3,
    Qualifying0,
    Qualifying1,
    Qualifying2,
    Qualifying3,
    Sprint,
    Race,
    PreSeason,
}

impl EventType {
    /// SessionInfo 中的会话名称。
    pub fn from_session_name(name: &str) -> Option<EventType> {
        match name {
            "Race" => Some(EventType::Race),
            "Qualifying" | "Sprint Qualifying" | "Sprint Shootout" => Some(EventType::Qualifying1),
            "Sprint" => Some(EventType::Sprint),
            "Practice 1" => Some(EventType::Practice1),
            "Practice 2" => Some(EventType::Practice2),
            "Practice 3" => Some(EventType::Practice3),
            "Pre-Season Test" | "Day 1" | "Day 2" | "Day 3" => Some(EventType::PreSeason),
            _ => None,
        }
    }

    pub fn from_qualifying_part(part: i64) -> Option<EventType> {
        match part {
            0 => Some(EventType::Qualifying0),
            1 => Some(EventType::Qualifying1),
            2 => Some(EventType::Qualifying2),
            3 => Some(EventType::Qualifying3),
            _ => None,
        }
    }

    /// 排位赛 Q1-Q3 阶段。
    pub fn is_qualifying_stage(self) -> bool {
        matches!(
            self,
            EventType::Qualifying1 | EventType::Qualifying2 | EventType::Qualifying3
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Unknown,
    Inactive,
    Started,
    Aborted,
    Finished,
    Finalised,
    Ended,
}

impl SessionStatus {
    pub fn from_feed(status: &str) -> Option<SessionStatus> {
        match status {
            "Inactive" => Some(SessionStatus::Inactive),
            "Started" => Some(SessionStatus::Started),
            "Aborted" => Some(SessionStatus::Aborted),
            "Finished" => Some(SessionStatus::Finished),
            "Finalised" => Some(SessionStatus::Finalised),
            "Ends" => Some(SessionStatus::Ended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagState {
    #[default]
    None,
    Green,
    Yellow,
    DoubleYellow,
    Red,
    Chequered,
    Blue,
    BlackAndWhite,
}

impl FlagState {
    /// 赛事指挥消息中的旗帜文本。
    pub fn from_feed(flag: &str) -> Option<FlagState> {
        match flag {
            "GREEN" | "CLEAR" => Some(FlagState::Green),
            "YELLOW" => Some(FlagState::Yellow),
            "DOUBLE YELLOW" => Some(FlagState::DoubleYellow),
            "RED" => Some(FlagState::Red),
            "CHEQUERED" => Some(FlagState::Chequered),
            "BLUE" => Some(FlagState::Blue),
            "BLACK AND WHITE" => Some(FlagState::BlackAndWhite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCarState {
    #[default]
    Clear,
    VirtualDeployed,
    VirtualEnding,
    Deployed,
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrsState {
    #[default]
    Unknown,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SessionAggregate {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub event_type: EventType,

    pub status: SessionStatus,
    /// 最近一次 SessionStatus 记录的时间，用于定位会话开始。
    pub status_at: Option<DateTime<Utc>>,
    pub heartbeat: bool,

    pub current_lap: u32,
    pub total_laps: u32,
    /// 三个计时段各自的分段数，首次观测后不再改变。
    pub sector_segments: [usize; 3],
    pub total_segments: usize,
    pub segment_flags: Slots<FlagState>,

    pub pit_exit_open: bool,
    pub track_status: FlagState,
    pub safety_car: SafetyCarState,

    #[serde(serialize_with = "millis::serialize")]
    pub remaining_time: TimeDelta,
    pub session_start_time: Option<DateTime<Utc>>,
    pub clock_stopped: bool,

    pub drs_enabled: DrsState,
}

impl SessionAggregate {
    pub fn segment_layout_known(&self) -> bool {
        self.sector_segments[0] != 0
    }
}
