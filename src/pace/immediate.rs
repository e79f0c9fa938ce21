//! 立即模式：实体到达即写入输出队列
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::TimeDelta;
use tracing::debug;

use crate::model::{
    DriverRoster, DriverState, EventTime, PositionSample, RaceControlMessage, RadioClip, SessionAggregate,
    TelemetrySample, WeatherSample,
};
use crate::queue::OutputSenders;

use super::sink::{EventSink, Pacer, PacerState};

#[derive(Debug)]
pub struct Immediate {
    out: OutputSenders,
    emit_event_time: bool,
    paused: AtomicBool,
}

impl Immediate {
    pub fn new(out: OutputSenders, emit_event_time: bool, initial: PacerState) -> Self {
        Self {
            out,
            emit_event_time,
            paused: AtomicBool::new(initial == PacerState::Paused),
        }
    }
}

impl EventSink for Immediate {
    fn add_drivers(&self, roster: DriverRoster) {
        let _ = self.out.drivers.push(roster);
    }

    fn add_timing(&self, driver: DriverState) {
        let _ = self.out.timing.push(driver);
    }

    fn add_event(&self, event: SessionAggregate) {
        if self.emit_event_time {
            let _ = self.out.event_time.push(EventTime {
                timestamp: event.timestamp,
                remaining: event.remaining_time,
            });
        }
        let _ = self.out.event.push(event);
    }

    fn add_race_control(&self, msg: RaceControlMessage) {
        let _ = self.out.race_control.push(msg);
    }

    fn add_weather(&self, weather: WeatherSample) {
        let _ = self.out.weather.push(weather);
    }

    fn add_telemetry(&self, sample: TelemetrySample) {
        let _ = self.out.telemetry.push(sample);
    }

    fn add_location(&self, sample: PositionSample) {
        let _ = self.out.location.push(sample);
    }

    fn add_radio(&self, clip: RadioClip) {
        let _ = self.out.radio.push(clip);
    }
}

impl Pacer for Immediate {
    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn skip_laps(&self, laps: u32) {
        debug!(laps, "立即模式不支持按圈跳跃");
    }

    fn skip_to_session_start(&self) {
        debug!("立即模式不支持跳到会话开始");
    }

    fn increment_time(&self, by: TimeDelta) {
        debug!(by = %by, "立即模式不支持推进时间");
    }

    fn buffered(&self) -> usize {
        0
    }
}
