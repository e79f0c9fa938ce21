//! 全部输出队列
//!
//! `OutputSenders` 由节拍器持有；`Outputs` 交给调用方消费。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::{
    DriverRoster, DriverState, EventTime, PositionSample, RaceControlMessage, RadioClip, SessionAggregate,
    TelemetrySample, WeatherSample,
};

use super::drop_tail::{OutputQueue, drop_tail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueCapacities {
    pub weather: usize,
    pub race_control: usize,
    pub timing: usize,
    pub event: usize,
    pub telemetry: usize,
    pub location: usize,
    pub event_time: usize,
    pub radio: usize,
    pub drivers: usize,
}

impl Default for QueueCapacities {
    fn default() -> Self {
        Self {
            weather: 100,
            race_control: 100,
            timing: 10_000,
            event: 1_000,
            telemetry: 1_000,
            location: 1_000,
            event_time: 10,
            radio: 100,
            drivers: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSenders {
    pub weather: OutputQueue<WeatherSample>,
    pub race_control: OutputQueue<RaceControlMessage>,
    pub timing: OutputQueue<DriverState>,
    pub event: OutputQueue<SessionAggregate>,
    pub telemetry: OutputQueue<TelemetrySample>,
    pub location: OutputQueue<PositionSample>,
    pub event_time: OutputQueue<EventTime>,
    pub radio: OutputQueue<RadioClip>,
    pub drivers: OutputQueue<DriverRoster>,
}

#[derive(Debug)]
pub struct Outputs {
    pub weather: mpsc::Receiver<WeatherSample>,
    pub race_control: mpsc::Receiver<RaceControlMessage>,
    pub timing: mpsc::Receiver<DriverState>,
    pub event: mpsc::Receiver<SessionAggregate>,
    pub telemetry: mpsc::Receiver<TelemetrySample>,
    pub location: mpsc::Receiver<PositionSample>,
    pub event_time: mpsc::Receiver<EventTime>,
    pub radio: mpsc::Receiver<RadioClip>,
    pub drivers: mpsc::Receiver<DriverRoster>,
}

pub fn output_queues(capacities: &QueueCapacities) -> (OutputSenders, Outputs) {
    let (weather, weather_rx) = drop_tail("weather", capacities.weather);
    let (race_control, race_control_rx) = drop_tail("race_control", capacities.race_control);
    let (timing, timing_rx) = drop_tail("timing", capacities.timing);
    let (event, event_rx) = drop_tail("event", capacities.event);
    let (telemetry, telemetry_rx) = drop_tail("telemetry", capacities.telemetry);
    let (location, location_rx) = drop_tail("location", capacities.location);
    let (event_time, event_time_rx) = drop_tail("event_time", capacities.event_time);
    let (radio, radio_rx) = drop_tail("radio", capacities.radio);
    let (drivers, drivers_rx) = drop_tail("drivers", capacities.drivers);

    let senders = OutputSenders {
        weather,
        race_control,
        timing,
        event,
        telemetry,
        location,
        event_time,
        radio,
        drivers,
    };
    let outputs = Outputs {
        weather: weather_rx,
        race_control: race_control_rx,
        timing: timing_rx,
        event: event_rx,
        telemetry: telemetry_rx,
        location: location_rx,
        event_time: event_time_rx,
        radio: radio_rx,
        drivers: drivers_rx,
    };
    (senders, outputs)
}

/// 与发送端共享的丢弃计数；不持有通道，因此不会阻止通道关闭。
#[derive(Debug, Clone)]
pub struct DropCounters {
    counters: [Arc<AtomicU64>; 9],
}

impl OutputSenders {
    pub fn drop_counters(&self) -> DropCounters {
        DropCounters {
            counters: [
                self.weather.drop_counter(),
                self.race_control.drop_counter(),
                self.timing.drop_counter(),
                self.event.drop_counter(),
                self.telemetry.drop_counter(),
                self.location.drop_counter(),
                self.event_time.drop_counter(),
                self.radio.drop_counter(),
                self.drivers.drop_counter(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropStats {
    pub weather: u64,
    pub race_control: u64,
    pub timing: u64,
    pub event: u64,
    pub telemetry: u64,
    pub location: u64,
    pub event_time: u64,
    pub radio: u64,
    pub drivers: u64,
}

impl DropStats {
    pub fn total(&self) -> u64 {
        self.weather
            + self.race_control
            + self.timing
            + self.event
            + self.telemetry
            + self.location
            + self.event_time
            + self.radio
            + self.drivers
    }
}

impl DropCounters {
    pub fn snapshot(&self) -> DropStats {
        let load = |i: usize| self.counters[i].load(Ordering::Relaxed);
        DropStats {
            weather: load(0),
            race_control: load(1),
            timing: load(2),
            event: load(3),
            telemetry: load(4),
            location: load(5),
            event_time: load(6),
            radio: load(7),
            drivers: load(8),
        }
    }
}
