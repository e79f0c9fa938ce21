//! 分段状态与车辆位置推断
//!
//! 分段下标跨三个计时段连续编号；第三段之后回到第一段视为新的一圈。

use chrono::{DateTime, Utc};

use crate::feed::StreamName;
use crate::model::{CarLocation, DriverState, MAX_SEGMENTS, SegmentStatus};

use super::decoder::Decoder;

impl Decoder {
    /// 写入一个分段状态；返回 `Some(state)` 表示该变化应参与位置推断。
    pub(super) fn apply_segment(
        &self,
        driver: &mut DriverState,
        sector: usize,
        segment: usize,
        code: i64,
        timestamp: DateTime<Utc>,
    ) -> Option<SegmentStatus> {
        if code == 0 {
            return None;
        }

        let [s1, s2, _] = self.aggregate.sector_segments;
        let index = match sector {
            0 => segment,
            1 => s1 + segment,
            _ => s1 + s2 + segment,
        };
        if index >= MAX_SEGMENTS {
            self.parse_error(
                StreamName::TimingData,
                timestamp,
                "Segments",
                format!("segment index {index} beyond track layout"),
            );
            return None;
        }

        let state = SegmentStatus::from_code(code).unwrap_or_else(|| {
            self.parse_error(
                StreamName::TimingData,
                timestamp,
                "Status",
                format!("unhandled segment status {code}"),
            );
            SegmentStatus::None
        });

        let last_sector_start = s1 + s2;
        let previous = driver.previous_segment_index;
        let use_change = index >= previous || (previous > last_sector_start && index < s1);

        match sector {
            0 => {
                // 上一个分段在第三段：新的一圈开始
                if previous > last_sector_start {
                    driver.segments.fill(SegmentStatus::None);
                }
                driver.segments[index] = state;
                if index > previous || previous > last_sector_start {
                    driver.previous_segment_index = index;
                }
            }
            1 => {
                driver.segments[index] = state;
                if index > previous {
                    driver.previous_segment_index = index;
                }
            }
            _ => {
                // 已进入新的一圈时迟到的第三段数据
                if previous >= s1 {
                    driver.segments[index] = state;
                    if index > previous {
                        driver.previous_segment_index = index;
                    }
                }
            }
        }

        use_change.then_some(state)
    }
}

/// 根据最新分段状态推断车辆位置。
pub(super) fn update_location(driver: &mut DriverState, state: SegmentStatus, at: DateTime<Utc>) {
    let on_track = matches!(driver.location, CarLocation::OutLap | CarLocation::OnTrack);
    let next = if state == SegmentStatus::None && !on_track {
        CarLocation::Pitlane
    } else if state == SegmentStatus::Pitlane {
        CarLocation::Pitlane
    } else if driver.segments[0] == SegmentStatus::Pitlane
        || driver.segments[1] == SegmentStatus::Pitlane
    {
        CarLocation::OutLap
    } else {
        CarLocation::OnTrack
    };
    driver.set_location(next, at);
}
