//! 节拍模式
//!
//! 每种实体一个按时间戳释放的缓冲；固定节拍推进虚拟时钟，释放所有时间戳不晚于
//! 当前虚拟时间的实体。写入输出队列从不阻塞，队列满时实体被丢弃。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::feed::is_unset;
use crate::model::{
    DriverRoster, DriverState, EventTime, PositionSample, RaceControlMessage, RadioClip, SessionAggregate,
    SessionStatus, TelemetrySample, WeatherSample,
};
use crate::queue::{OutputQueue, OutputSenders};

use super::buffer::{TimedBuffer, Timestamped};
use super::clock::VirtualClock;
use super::sink::{EventSink, Pacer, PacerState};

#[derive(Debug, Clone, Copy)]
pub struct PacedConfig {
    pub tick_interval: Duration,
    pub emit_event_time: bool,
    pub initial_state: PacerState,
}

impl Default for PacedConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            emit_event_time: true,
            initial_state: PacerState::Running,
        }
    }
}

#[derive(Debug)]
pub struct Paced {
    out: OutputSenders,
    cfg: PacedConfig,
    step: TimeDelta,

    // 锁顺序：clock -> events -> 其余缓冲
    clock: Mutex<VirtualClock>,
    events: Mutex<TimedBuffer<SessionAggregate>>,
    race_control: Mutex<TimedBuffer<RaceControlMessage>>,
    weather: Mutex<TimedBuffer<WeatherSample>>,
    timing: Mutex<TimedBuffer<DriverState>>,
    telemetry: Mutex<TimedBuffer<TelemetrySample>>,
    location: Mutex<TimedBuffer<PositionSample>>,
    radio: Mutex<TimedBuffer<RadioClip>>,
    drivers: Mutex<TimedBuffer<DriverRoster>>,

    paused: AtomicBool,
    pending_laps: AtomicU32,
    pending_offset_ms: AtomicI64,
    skip_to_start: AtomicBool,
}

impl Paced {
    pub fn new(out: OutputSenders, cfg: PacedConfig) -> Self {
        let step = TimeDelta::from_std(cfg.tick_interval).unwrap_or(TimeDelta::milliseconds(500));
        Self {
            out,
            cfg,
            step,
            clock: Mutex::new(VirtualClock::default()),
            events: Mutex::new(TimedBuffer::new()),
            race_control: Mutex::new(TimedBuffer::new()),
            weather: Mutex::new(TimedBuffer::new()),
            timing: Mutex::new(TimedBuffer::new()),
            telemetry: Mutex::new(TimedBuffer::new()),
            location: Mutex::new(TimedBuffer::new()),
            radio: Mutex::new(TimedBuffer::new()),
            drivers: Mutex::new(TimedBuffer::new()),
            paused: AtomicBool::new(cfg.initial_state == PacerState::Paused),
            pending_laps: AtomicU32::new(0),
            pending_offset_ms: AtomicI64::new(0),
            skip_to_start: AtomicBool::new(false),
        }
    }

    pub fn clock(&self) -> VirtualClock {
        self.clock.lock().clone()
    }

    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.clock.lock().now
    }

    /// 推进一个节拍。
    pub fn tick(&self) {
        if self.is_paused() {
            trace!("已暂停，跳过节拍");
            return;
        }

        let mut clock = self.clock.lock();
        {
            let mut events = self.events.lock();
            if self.skip_to_start.swap(false, Ordering::SeqCst) {
                self.apply_skip_to_start(&mut clock, &events);
            }

            if clock.now.is_none() {
                if let Some(first) = events.iter().find(|e| !is_unset(e.timestamp)) {
                    clock.now = Some(first.timestamp);
                    clock.clock_stopped = first.clock_stopped;
                    debug!(baseline = %first.timestamp, "⏱️  以会话快照确定虚拟时钟基线");
                }
            }

            let laps = self.pending_laps.swap(0, Ordering::SeqCst);
            if laps > 0 {
                self.apply_lap_skip(&mut clock, &mut events, laps);
            } else if let Some(now) = clock.now {
                for event in events.drain_due(now) {
                    self.release_event(&mut clock, event);
                }
            }
        }

        if clock.now.is_none() {
            clock.now = self.earliest_buffered();
            if let Some(baseline) = clock.now {
                debug!(baseline = %baseline, "⏱️  以最早缓冲实体确定虚拟时钟基线");
            }
        }
        let Some(mut now) = clock.now else {
            return;
        };

        release(&self.drivers, &self.out.drivers, now);
        release(&self.race_control, &self.out.race_control, now);
        release(&self.weather, &self.out.weather, now);
        release(&self.timing, &self.out.timing, now);
        release(&self.telemetry, &self.out.telemetry, now);
        release(&self.location, &self.out.location, now);
        release(&self.radio, &self.out.radio, now);

        let offset = self.pending_offset_ms.swap(0, Ordering::SeqCst);
        if offset != 0 {
            now += TimeDelta::milliseconds(offset);
            self.discard_radio(now);
            debug!(offset_ms = offset, now = %now, "⏩ 手动推进虚拟时间");
        }
        clock.now = Some(now);
        clock.update_remaining();

        if self.cfg.emit_event_time {
            let _ = self.out.event_time.push(EventTime {
                timestamp: now,
                remaining: clock.remaining,
            });
        }
        clock.now = Some(now + self.step);
    }

    /// 按固定节拍运行，直到关停信号。
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.cfg.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.cfg.tick_interval.as_millis() as u64, "▶️  节拍任务启动");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => self.tick(),
            }
        }
        info!("⏹️  节拍任务结束");
    }

    fn release_event(&self, clock: &mut VirtualClock, event: SessionAggregate) {
        let snapshot = event.clone();
        if self.out.event.push(event).is_ok() {
            clock.observe(&snapshot);
        }
    }

    fn apply_lap_skip(&self, clock: &mut VirtualClock, events: &mut TimedBuffer<SessionAggregate>, laps: u32) {
        let target = clock.current_lap.saturating_add(laps);
        let mut last = None;
        while clock.current_lap < target {
            let Some(event) = events.pop_front() else {
                break;
            };
            last = Some(event.timestamp);
            self.release_event(clock, event);
        }
        if let Some(at) = last {
            clock.now = Some(at);
            self.discard_radio(at);
        }
        debug!(laps, target, reached = clock.current_lap, "⏩ 按圈跳跃");
    }

    fn apply_skip_to_start(&self, clock: &mut VirtualClock, events: &TimedBuffer<SessionAggregate>) {
        match session_start_target(events) {
            Some(at) => {
                clock.now = Some(at);
                self.discard_radio(at);
                debug!(start = %at, "⏩ 跳到会话开始");
            }
            None => debug!("缓冲中没有可跳转的会话开始"),
        }
    }

    fn discard_radio(&self, until: DateTime<Utc>) {
        let discarded = self.radio.lock().discard_due(until);
        if discarded > 0 {
            trace!(discarded, "跳过时间段内的无线电片段");
        }
    }

    fn earliest_buffered(&self) -> Option<DateTime<Utc>> {
        [
            front(&self.race_control),
            front(&self.weather),
            front(&self.timing),
            front(&self.telemetry),
            front(&self.location),
            front(&self.radio),
            front(&self.drivers),
        ]
        .into_iter()
        .flatten()
        .filter(|ts| !is_unset(*ts))
        .min()
    }
}

fn front<T: Timestamped>(buffer: &Mutex<TimedBuffer<T>>) -> Option<DateTime<Utc>> {
    buffer.lock().front_timestamp()
}

fn release<T: Timestamped>(buffer: &Mutex<TimedBuffer<T>>, out: &OutputQueue<T>, now: DateTime<Utc>) {
    let due = buffer.lock().drain_due(now);
    for item in due {
        let _ = out.push(item);
    }
}

/// 会话开始的跳转目标。
///
/// 状态记录按 `status_at` 去重；缓冲开头若已处于 Started 则先越过这一段，
/// 之后第一段连续 Started 记录中的最后一条即为目标（中断后重新开始的情况）。
pub(crate) fn session_start_target(events: &TimedBuffer<SessionAggregate>) -> Option<DateTime<Utc>> {
    let mut records: Vec<(SessionStatus, DateTime<Utc>)> = Vec::new();
    for event in events.iter() {
        let at = event.status_at.unwrap_or(event.timestamp);
        if is_unset(at) {
            continue;
        }
        if records.last().is_some_and(|(_, last)| *last == at) {
            continue;
        }
        records.push((event.status, at));
    }

    let started = |i: &usize| records.get(*i).is_some_and(|(s, _)| *s == SessionStatus::Started);
    let mut i = 0;
    while started(&i) {
        i += 1;
    }
    while i < records.len() && !started(&i) {
        i += 1;
    }
    if i >= records.len() {
        return None;
    }
    while started(&(i + 1)) {
        i += 1;
    }
    Some(records[i].1)
}

impl EventSink for Paced {
    fn add_drivers(&self, roster: DriverRoster) {
        self.drivers.lock().push(roster);
    }

    fn add_timing(&self, driver: DriverState) {
        self.timing.lock().push(driver);
    }

    fn add_event(&self, event: SessionAggregate) {
        self.events.lock().push(event);
    }

    fn add_race_control(&self, msg: RaceControlMessage) {
        self.race_control.lock().push(msg);
    }

    fn add_weather(&self, weather: WeatherSample) {
        self.weather.lock().push(weather);
    }

    fn add_telemetry(&self, sample: TelemetrySample) {
        self.telemetry.lock().push(sample);
    }

    fn add_location(&self, sample: PositionSample) {
        self.location.lock().push(sample);
    }

    fn add_radio(&self, clip: RadioClip) {
        self.radio.lock().push(clip);
    }
}

impl Pacer for Paced {
    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("⏸️  暂停");
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        info!("▶️  继续");
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn skip_laps(&self, laps: u32) {
        self.pending_laps.fetch_add(laps, Ordering::SeqCst);
    }

    fn skip_to_session_start(&self) {
        self.skip_to_start.store(true, Ordering::SeqCst);
    }

    fn increment_time(&self, by: TimeDelta) {
        self.pending_offset_ms
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    fn buffered(&self) -> usize {
        self.events.lock().len()
            + self.race_control.lock().len()
            + self.weather.lock().len()
            + self.timing.lock().len()
            + self.telemetry.lock().len()
            + self.location.lock().len()
            + self.radio.lock().len()
            + self.drivers.lock().len()
    }
}
