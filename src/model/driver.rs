//! 车手计时状态
//!
//! 每位车手一个 `DriverState`，由 TimingData / TimingAppData / CarData 等流增量合并。

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::millis;
use super::samples::{DriverInfo, RgbColor};
use super::slots::Slots;

/// 单个计时分段的状态（feed 状态码映射而来）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    #[default]
    None,
    Yellow,
    Green,
    Invalid,
    Purple,
    Red,
    Pitlane,
    Unrecognized,
}

impl SegmentStatus {
    /// feed 状态码；返回 `None` 表示完全未知的码。
    pub fn from_code(code: i64) -> Option<SegmentStatus> {
        match code {
            2048 => Some(SegmentStatus::Yellow),
            2049 => Some(SegmentStatus::Green),
            2050 => Some(SegmentStatus::Invalid),
            2051 => Some(SegmentStatus::Purple),
            2052 => Some(SegmentStatus::Red),
            2064 => Some(SegmentStatus::Pitlane),
            // 出现过但含义未公开的码
            2065 | 2066 | 2068 => Some(SegmentStatus::Unrecognized),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CarLocation {
    #[default]
    Unknown,
    Pitlane,
    PitExit,
    OutLap,
    OnTrack,
    Retired,
    Stopped,
}

impl CarLocation {
    pub fn in_pits(self) -> bool {
        matches!(self, CarLocation::Pitlane | CarLocation::PitExit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TireCompound {
    #[default]
    Unknown,
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Test,
    HyperSoft,
    UltraSoft,
    SuperSoft,
}

impl TireCompound {
    pub fn from_feed(name: &str) -> Option<TireCompound> {
        match name {
            "SOFT" => Some(TireCompound::Soft),
            "MEDIUM" => Some(TireCompound::Medium),
            "HARD" => Some(TireCompound::Hard),
            "INTERMEDIATE" => Some(TireCompound::Intermediate),
            "WET" => Some(TireCompound::Wet),
            "TEST_UNKNOWN" | "TEST" => Some(TireCompound::Test),
            "HYPERSOFT" => Some(TireCompound::HyperSoft),
            "ULTRASOFT" => Some(TireCompound::UltraSoft),
            "SUPERSOFT" => Some(TireCompound::SuperSoft),
            "UNKNOWN" | "C" => Some(TireCompound::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SectorTime {
    #[serde(serialize_with = "millis::serialize")]
    pub time: TimeDelta,
    pub personal_fastest: bool,
    pub overall_fastest: bool,
}

/// 一次进出维修区的记录。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PitStop {
    pub lap: u32,
    pub entry: DateTime<Utc>,
    pub exit: Option<DateTime<Utc>>,
    #[serde(serialize_with = "millis::serialize_opt")]
    pub pitlane_time: Option<TimeDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverState {
    pub timestamp: DateTime<Utc>,

    pub number: u32,
    pub name: String,
    pub short_name: String,
    pub team: String,
    pub hex_color: String,
    pub color: RgbColor,

    pub position: u32,
    #[serde(serialize_with = "millis::serialize")]
    pub time_diff_to_fastest: TimeDelta,
    #[serde(serialize_with = "millis::serialize")]
    pub time_diff_to_position_ahead: TimeDelta,
    #[serde(serialize_with = "millis::serialize")]
    pub gap_to_leader: TimeDelta,

    pub previous_segment_index: usize,
    pub segments: Slots<SegmentStatus>,
    pub sectors: [SectorTime; 3],

    #[serde(serialize_with = "millis::serialize")]
    pub last_lap: TimeDelta,
    pub last_lap_personal_fastest: bool,
    pub last_lap_overall_fastest: bool,
    #[serde(serialize_with = "millis::serialize")]
    pub fastest_lap: TimeDelta,
    pub overall_fastest_lap: bool,

    pub knocked_out_of_qualifying: bool,
    pub chequered_flag: bool,

    pub tire: TireCompound,
    pub laps_on_tire: u32,
    pub lap: u32,
    pub drs_open: bool,
    pub pit_stops: u32,
    pub pit_stop_history: Vec<PitStop>,
    pub location: CarLocation,

    pub speed_trap: u32,
    pub speed_trap_personal_fastest: bool,
    pub speed_trap_overall_fastest: bool,
}

impl DriverState {
    pub fn new(number: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            number,
            name: String::new(),
            short_name: String::new(),
            team: String::new(),
            hex_color: RgbColor::WHITE.to_hex(),
            color: RgbColor::WHITE,
            position: 0,
            time_diff_to_fastest: TimeDelta::zero(),
            time_diff_to_position_ahead: TimeDelta::zero(),
            gap_to_leader: TimeDelta::zero(),
            previous_segment_index: 0,
            segments: Slots::default(),
            sectors: [SectorTime::default(); 3],
            last_lap: TimeDelta::zero(),
            last_lap_personal_fastest: false,
            last_lap_overall_fastest: false,
            fastest_lap: TimeDelta::zero(),
            overall_fastest_lap: false,
            knocked_out_of_qualifying: false,
            chequered_flag: false,
            tire: TireCompound::Unknown,
            laps_on_tire: 0,
            lap: 0,
            drs_open: false,
            pit_stops: 0,
            pit_stop_history: Vec::new(),
            location: CarLocation::Unknown,
            speed_trap: 0,
            speed_trap_personal_fastest: false,
            speed_trap_overall_fastest: false,
        }
    }

    /// 新会话开始：清空圈速/分段相关字段，保留身份信息与轮胎/进站记录。
    pub fn reset_for_new_session(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
        self.chequered_flag = false;
        self.sectors = [SectorTime::default(); 3];
        self.fastest_lap = TimeDelta::zero();
        self.overall_fastest_lap = false;
        self.time_diff_to_fastest = TimeDelta::zero();
        self.time_diff_to_position_ahead = TimeDelta::zero();
        self.gap_to_leader = TimeDelta::zero();
        self.last_lap = TimeDelta::zero();
        self.last_lap_personal_fastest = false;
        self.last_lap_overall_fastest = false;
        self.speed_trap = 0;
        self.speed_trap_personal_fastest = false;
        self.speed_trap_overall_fastest = false;
        self.segments = Slots::default();
        self.previous_segment_index = 0;
        self.location = CarLocation::Unknown;
    }

    /// 更新位置；赛道与维修区之间的切换会写入进站历史。
    pub fn set_location(&mut self, next: CarLocation, at: DateTime<Utc>) {
        let on_track = matches!(self.location, CarLocation::OnTrack | CarLocation::OutLap);
        if next == CarLocation::Pitlane && on_track {
            self.pit_stop_history.push(PitStop {
                lap: self.lap,
                entry: at,
                exit: None,
                pitlane_time: None,
            });
        } else if self.location == CarLocation::Pitlane && next != CarLocation::Pitlane {
            if let Some(stop) = self
                .pit_stop_history
                .last_mut()
                .filter(|stop| stop.exit.is_none())
            {
                stop.exit = Some(at);
                stop.pitlane_time = Some(at - stop.entry);
            }
        }
        self.location = next;
    }

    pub fn info(&self) -> DriverInfo {
        DriverInfo {
            start_position: self.position,
            name: self.name.clone(),
            short_name: self.short_name.clone(),
            number: self.number,
            team: self.team.clone(),
            hex_color: self.hex_color.clone(),
            color: self.color,
        }
    }
}
