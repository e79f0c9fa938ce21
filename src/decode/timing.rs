//! TimingData：计时看板
//!
//! 逐行合并车手计时字段；整体最快圈变化时按会话类别重算差距或最快圈标记。

use std::cmp::Ordering;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::{debug, trace};

use crate::feed::{StreamName, parse_duration};
use crate::model::{CarLocation, DriverState, EventType, FlagState, MAX_SEGMENTS, SessionKind};

use super::decoder::Decoder;
use super::segments::update_location;
use super::shape::{bool_field, count_field, number_field, ordered_entries, str_field};

const STREAM: StreamName = StreamName::TimingData;

/// 被套圈车辆的差距文本，例如 `LAP 12` 或 `1L`。
fn is_lapped(value: &str) -> bool {
    value.contains("LAP") || value.ends_with('L')
}

impl Decoder {
    pub(super) fn decode_timing_data(
        &mut self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Vec<DriverState> {
        let Some(lines) = payload.get("Lines").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut updated = Vec::new();
        let mut fastest_lap = None;
        for (number, line) in lines {
            let Some(mut driver) = self.drivers.get(number).cloned() else {
                trace!(number = %number, "未知车号，跳过");
                continue;
            };
            if !line.is_object() {
                self.parse_error(STREAM, timestamp, "Lines", format!("line for {number} is not an object"));
                continue;
            }
            driver.timestamp = timestamp;
            if self.merge_timing_line(&mut driver, line, timestamp) {
                fastest_lap = Some(driver.last_lap);
            }
            self.drivers.insert(number.clone(), driver.clone());
            updated.push(driver);
        }

        let Some(fastest) = fastest_lap else {
            return updated;
        };
        match self.session {
            SessionKind::Qualifying => self.recompute_qualifying_gaps(fastest, timestamp),
            SessionKind::Race | SessionKind::Sprint => self.recompute_overall_fastest(fastest, timestamp),
            _ => updated,
        }
    }

    /// 合并一行；返回该行是否带来新的整体最快圈。
    fn merge_timing_line(&mut self, driver: &mut DriverState, line: &Value, ts: DateTime<Utc>) -> bool {
        if let Some(stops) = count_field(line, "NumberOfPitStops") {
            driver.pit_stops = stops;
        }
        match line.get("Position") {
            Some(Value::String(pos)) if !pos.trim().is_empty() => match pos.trim().parse() {
                Ok(pos) => driver.position = pos,
                Err(_) => self.parse_error(STREAM, ts, "Position", format!("'{pos}'")),
            },
            Some(Value::Number(_)) => {
                if let Some(pos) = count_field(line, "Position") {
                    driver.position = pos;
                }
            }
            _ => {}
        }

        if let Some(v) = str_field(line, "TimeDiffToFastest") {
            self.merge_gap(&mut driver.time_diff_to_fastest, v, "TimeDiffToFastest", ts);
        }
        if let Some(v) = str_field(line, "TimeDiffToPositionAhead") {
            self.merge_gap(&mut driver.time_diff_to_position_ahead, v, "TimeDiffToPositionAhead", ts);
        }
        if let Some(v) = str_field(line, "GapToLeader") {
            self.merge_gap(&mut driver.gap_to_leader, v, "GapToLeader", ts);
        }
        match line.get("IntervalToPositionAhead") {
            Some(interval) if interval.is_object() => {
                if let Some(v) = str_field(interval, "Value") {
                    self.merge_gap(
                        &mut driver.time_diff_to_position_ahead,
                        v,
                        "IntervalToPositionAhead",
                        ts,
                    );
                }
            }
            _ => {
                // 正赛领跑者没有前车
                if self.aggregate.event_type == EventType::Race && driver.position == 1 {
                    driver.time_diff_to_position_ahead = TimeDelta::zero();
                }
            }
        }
        if let Some(stats) = line.get("Stats").and_then(|s| ordered_entries(s)) {
            for (_, stat) in stats {
                if let Some(v) = str_field(stat, "TimeDiffToPositionAhead") {
                    self.merge_gap(&mut driver.time_diff_to_position_ahead, v, "Stats", ts);
                }
                if let Some(v) = str_field(stat, "TimeDiffToFastest") {
                    self.merge_gap(&mut driver.time_diff_to_fastest, v, "Stats", ts);
                }
            }
        }

        if let Some(laps) = count_field(line, "NumberOfLaps") {
            driver.lap = laps;
            if driver.location == CarLocation::OutLap {
                driver.location = CarLocation::OnTrack;
            }
        }

        if let Some(sectors) = line.get("Sectors") {
            match ordered_entries(sectors) {
                Some(entries) => {
                    self.observe_segment_layout(&entries, ts);
                    for (key, sector) in entries {
                        match key.parse::<usize>() {
                            Ok(idx) if idx < 3 => self.merge_sector(driver, idx, sector, ts),
                            _ => self.parse_error(STREAM, ts, "Sectors", format!("unexpected sector key '{key}'")),
                        }
                    }
                }
                None => self.parse_error(STREAM, ts, "Sectors", "expected a list or an object"),
            }
        }

        // 显式状态覆盖分段推断的位置
        if bool_field(line, "Stopped") == Some(true) {
            driver.location = CarLocation::Stopped;
        }
        if bool_field(line, "Retired") == Some(true) {
            driver.location = CarLocation::Retired;
        }

        if let Some(v) = line.get("BestLapTime").and_then(|b| str_field(b, "Value")) {
            if let Some(time) = self.lap_time(v, "BestLapTime", ts) {
                driver.fastest_lap = time;
            }
        }

        let mut new_overall_fastest = false;
        if let Some(last) = line.get("LastLapTime").filter(|l| l.is_object()) {
            if let Some(v) = str_field(last, "Value").filter(|v| !v.trim().is_empty()) {
                if let Some(time) = self.lap_time(v, "LastLapTime", ts) {
                    driver.last_lap = time;
                }
            }
            if let Some(overall) = bool_field(last, "OverallFastest") {
                driver.last_lap_overall_fastest = overall;
                if overall {
                    driver.overall_fastest_lap = true;
                    new_overall_fastest = true;
                }
            }
            if let Some(personal) = bool_field(last, "PersonalFastest") {
                driver.last_lap_personal_fastest = personal;
            }
        }

        if let Some(trap) = line.get("Speeds").and_then(|s| s.get("ST")) {
            if let Some(v) = str_field(trap, "Value") {
                let v = v.trim();
                if v.is_empty() {
                    driver.speed_trap = 0;
                } else {
                    match v.parse() {
                        Ok(speed) => driver.speed_trap = speed,
                        Err(_) => self.parse_error(STREAM, ts, "Speeds.ST", format!("'{v}'")),
                    }
                }
            }
            if let Some(overall) = bool_field(trap, "OverallFastest") {
                driver.speed_trap_overall_fastest = overall;
            }
            if let Some(personal) = bool_field(trap, "PersonalFastest") {
                driver.speed_trap_personal_fastest = personal;
            }
        }

        if let Some(out) = bool_field(line, "KnockedOut") {
            driver.knocked_out_of_qualifying = out;
        }

        new_overall_fastest
    }

    fn merge_sector(&mut self, driver: &mut DriverState, idx: usize, sector: &Value, ts: DateTime<Utc>) {
        if let Some(entries) = sector.get("Segments").and_then(|s| ordered_entries(s)) {
            for (key, segment) in entries {
                let Ok(segment_index) = key.parse::<usize>() else {
                    self.parse_error(STREAM, ts, "Segments", format!("unexpected segment key '{key}'"));
                    continue;
                };
                let Some(code) = number_field(segment, "Status") else {
                    continue;
                };
                if let Some(state) = self.apply_segment(driver, idx, segment_index, code as i64, ts) {
                    update_location(driver, state, ts);
                }
            }
        }

        if let Some(v) = str_field(sector, "Value") {
            if let Some(time) = self.lap_time(v, "Sector Value", ts) {
                driver.sectors[idx].time = time;
                if idx == 2 {
                    if self.aggregate.track_status == FlagState::Chequered {
                        driver.chequered_flag = true;
                    }
                    if !time.is_zero() {
                        driver.laps_on_tire += 1;
                    }
                }
            }
        }
        if let Some(overall) = bool_field(sector, "OverallFastest") {
            driver.sectors[idx].overall_fastest = overall;
        }
        if let Some(personal) = bool_field(sector, "PersonalFastest") {
            driver.sectors[idx].personal_fastest = personal;
        }
    }

    /// 首次看到三个计时段都带分段列表时记录赛道分段布局。
    fn observe_segment_layout(&mut self, entries: &[(String, &Value)], ts: DateTime<Utc>) {
        if self.aggregate.segment_layout_known() {
            return;
        }
        let mut counts = [0usize; 3];
        for (i, count) in counts.iter_mut().enumerate() {
            let key = i.to_string();
            let Some(segments) = entries
                .iter()
                .find(|(k, _)| *k == key)
                .and_then(|(_, sector)| sector.get("Segments"))
                .and_then(Value::as_array)
            else {
                return;
            };
            *count = segments.len();
        }
        if counts[0] == 0 {
            return;
        }
        let total: usize = counts.iter().sum();
        if total > MAX_SEGMENTS {
            self.parse_error(STREAM, ts, "Segments", format!("{total} segments exceeds {MAX_SEGMENTS}"));
        }
        self.aggregate.sector_segments = counts;
        self.aggregate.total_segments = total.min(MAX_SEGMENTS);
        debug!(sectors = ?counts, total = self.aggregate.total_segments, "🗺️  记录赛道分段布局");
    }

    /// 差距字段：空串为零，套圈文本保留原值，解析失败记录后保留原值。
    fn merge_gap(&self, target: &mut TimeDelta, value: &str, field: &str, ts: DateTime<Utc>) {
        let value = value.trim();
        if value.is_empty() {
            *target = TimeDelta::zero();
            return;
        }
        if is_lapped(value) {
            return;
        }
        match parse_duration(value) {
            Ok(gap) => *target = gap,
            Err(err) => self.parse_error(STREAM, ts, field, err),
        }
    }

    fn lap_time(&self, value: &str, field: &str, ts: DateTime<Utc>) -> Option<TimeDelta> {
        let value = value.trim();
        if value.is_empty() {
            return Some(TimeDelta::zero());
        }
        match parse_duration(value) {
            Ok(time) => Some(time),
            Err(err) => {
                self.parse_error(STREAM, ts, field, err);
                None
            }
        }
    }

    /// 排位赛：按最快圈升序排列全部车手，重算与最快者、与前车的差距。
    fn recompute_qualifying_gaps(&mut self, fastest: TimeDelta, ts: DateTime<Utc>) -> Vec<DriverState> {
        let mut ordered: Vec<(String, DriverState)> = self
            .drivers
            .iter()
            .map(|(key, driver)| (key.clone(), driver.clone()))
            .collect();
        ordered.sort_by(|a, b| fastest_lap_order(a.1.fastest_lap, b.1.fastest_lap));

        for i in 0..ordered.len() {
            let ahead = if i == 0 { None } else { Some(ordered[i - 1].1.fastest_lap) };
            let driver = &mut ordered[i].1;
            driver.timestamp = ts;
            match ahead {
                None => {
                    driver.time_diff_to_fastest = TimeDelta::zero();
                    driver.time_diff_to_position_ahead = TimeDelta::zero();
                }
                Some(ahead) if driver.fastest_lap > TimeDelta::zero() => {
                    driver.time_diff_to_position_ahead = driver.fastest_lap - ahead;
                    driver.time_diff_to_fastest = driver.fastest_lap - fastest;
                }
                Some(_) => {}
            }
            if driver.time_diff_to_fastest < TimeDelta::zero() {
                let gap = driver.time_diff_to_fastest;
                self.parse_error(STREAM, ts, "TimeDiffToFastest", format!("negative gap {gap}"));
            }
        }

        for (key, driver) in &ordered {
            self.drivers.insert(key.clone(), driver.clone());
        }
        ordered.into_iter().map(|(_, driver)| driver).collect()
    }

    /// 正赛/冲刺赛：只有最快圈等于新整体最快圈的车手带最快圈标记。
    fn recompute_overall_fastest(&mut self, fastest: TimeDelta, ts: DateTime<Utc>) -> Vec<DriverState> {
        self.drivers
            .values_mut()
            .map(|driver| {
                driver.overall_fastest_lap = driver.fastest_lap == fastest;
                driver.timestamp = ts;
                driver.clone()
            })
            .collect()
    }
}

/// 升序；没有圈速（零）的排在最后。
fn fastest_lap_order(a: TimeDelta, b: TimeDelta) -> Ordering {
    let zero = TimeDelta::zero();
    match (a <= zero, b <= zero) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(&b),
    }
}
