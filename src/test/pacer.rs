use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::{DriverState, RadioClip, SessionAggregate, SessionStatus};
use crate::pace::{EventSink, Immediate, Paced, PacedConfig, Pacer, PacerState, TimedBuffer};
use crate::queue::{DropCounters, Outputs, QueueCapacities, output_queues};

use super::{at, at_ms};

fn paced(capacities: QueueCapacities, initial_state: PacerState) -> (Paced, Outputs, DropCounters) {
    let (senders, outputs) = output_queues(&capacities);
    let drops = senders.drop_counters();
    let cfg = PacedConfig {
        tick_interval: Duration::from_millis(500),
        emit_event_time: true,
        initial_state,
    };
    (Paced::new(senders, cfg), outputs, drops)
}

fn event(ts: DateTime<Utc>) -> SessionAggregate {
    SessionAggregate {
        timestamp: ts,
        ..SessionAggregate::default()
    }
}

fn status(ts: DateTime<Utc>, status: SessionStatus) -> SessionAggregate {
    SessionAggregate {
        timestamp: ts,
        status,
        status_at: Some(ts),
        ..SessionAggregate::default()
    }
}

fn lap(ts: DateTime<Utc>, current_lap: u32) -> SessionAggregate {
    SessionAggregate {
        timestamp: ts,
        current_lap,
        ..SessionAggregate::default()
    }
}

fn clip(ts: DateTime<Utc>) -> RadioClip {
    RadioClip {
        timestamp: ts,
        driver_number: 1,
        driver_name: "Max VERSTAPPEN".to_string(),
        path: "TeamRadio/clip.mp3".to_string(),
        audio: Vec::new(),
    }
}

fn drain<T>(rx: &mut tokio::sync::mpsc::Receiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}

#[test]
fn timed_buffer_releases_only_from_the_head() {
    let mut buffer = TimedBuffer::new();
    buffer.push(DriverState::new(1, at(2)));
    buffer.push(DriverState::new(44, at(1)));

    assert!(buffer.drain_due(at(1)).is_empty(), "head is not due yet");
    let due = buffer.drain_due(at(2));
    let numbers: Vec<u32> = due.iter().map(|d| d.number).collect();
    assert_eq!(numbers, vec![1, 44]);
    assert!(buffer.is_empty());
}

#[test]
fn paced_releases_entities_as_the_clock_reaches_them() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_timing(DriverState::new(1, at(0)));
    pacer.add_timing(DriverState::new(1, at(1)));
    pacer.add_timing(DriverState::new(1, at(2)));

    pacer.tick();
    assert_eq!(drain(&mut out.timing).len(), 1, "baseline is the earliest buffered entity");
    pacer.tick();
    assert!(drain(&mut out.timing).is_empty());
    pacer.tick();
    assert_eq!(drain(&mut out.timing).len(), 1);

    assert_eq!(pacer.current_time(), Some(at_ms(1_500)));
    assert_eq!(pacer.buffered(), 1);
    let ticks = drain(&mut out.event_time);
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks[2].timestamp, at(1));
}

#[test]
fn paced_baseline_prefers_session_events() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_timing(DriverState::new(1, at(0)));
    pacer.add_event(event(at(10)));

    pacer.tick();
    assert_eq!(drain(&mut out.event).len(), 1);
    assert_eq!(drain(&mut out.timing).len(), 1, "earlier entities are released with the baseline");
    assert_eq!(pacer.current_time(), Some(at_ms(10_500)));
}

#[test]
fn full_output_queue_drops_without_blocking() {
    let capacities = QueueCapacities {
        timing: 1,
        ..QueueCapacities::default()
    };
    let (pacer, mut out, drops) = paced(capacities, PacerState::Running);
    for number in [1, 16, 44] {
        pacer.add_timing(DriverState::new(number, at(0)));
    }

    pacer.tick();
    let delivered = drain(&mut out.timing);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].number, 1);
    let dropped = drops.snapshot();
    assert_eq!(dropped.timing, 2);
    assert_eq!(dropped.total(), 2);
}

#[test]
fn skip_to_session_start_jumps_to_the_latest_restart() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_event(status(at(0), SessionStatus::Aborted));
    pacer.add_event(status(at(600), SessionStatus::Started));
    pacer.add_event(status(at(900), SessionStatus::Started));
    pacer.add_event(status(at(4_000), SessionStatus::Finished));
    pacer.add_radio(clip(at(300)));
    pacer.add_radio(clip(at(1_000)));

    pacer.skip_to_session_start();
    pacer.tick();

    assert_eq!(drain(&mut out.event).len(), 3);
    assert_eq!(pacer.clock().status, SessionStatus::Started);
    assert_eq!(pacer.current_time(), Some(at_ms(900_500)));
    assert!(drain(&mut out.radio).is_empty(), "radio before the jump is discarded");
    assert_eq!(pacer.buffered(), 2);
}

#[test]
fn skip_to_session_start_ignores_a_stale_leading_start() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_event(status(at(0), SessionStatus::Started));
    pacer.add_event(status(at(100), SessionStatus::Inactive));
    pacer.add_event(status(at(200), SessionStatus::Started));
    pacer.add_event(status(at(300), SessionStatus::Started));
    pacer.add_event(status(at(400), SessionStatus::Finished));

    pacer.skip_to_session_start();
    pacer.tick();

    assert_eq!(drain(&mut out.event).len(), 4);
    assert_eq!(pacer.current_time(), Some(at_ms(300_500)));
}

#[test]
fn skip_to_session_start_without_a_start_keeps_the_clock() {
    let (pacer, _out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_event(status(at(0), SessionStatus::Inactive));
    pacer.skip_to_session_start();
    pacer.tick();
    assert_eq!(pacer.current_time(), Some(at_ms(500)));
}

#[test]
fn skip_laps_releases_events_until_the_target_lap() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    for n in 1..=4 {
        pacer.add_event(lap(at((i64::from(n) - 1) * 60), n));
    }
    pacer.add_timing(DriverState::new(1, at(10)));
    pacer.add_timing(DriverState::new(1, at(70)));
    pacer.add_timing(DriverState::new(1, at(130)));

    pacer.tick();
    assert_eq!(pacer.clock().current_lap, 1);

    pacer.skip_laps(2);
    pacer.tick();
    assert_eq!(pacer.clock().current_lap, 3);
    assert_eq!(drain(&mut out.event).len(), 3);
    assert_eq!(drain(&mut out.timing).len(), 2);
    assert_eq!(pacer.current_time(), Some(at_ms(120_500)));
}

#[test]
fn paused_pacer_does_not_advance() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Paused);
    pacer.add_timing(DriverState::new(1, at(0)));

    pacer.tick();
    assert!(pacer.is_paused());
    assert_eq!(pacer.current_time(), None);
    assert!(drain(&mut out.event_time).is_empty());

    pacer.toggle_pause();
    assert_eq!(pacer.state(), PacerState::Running);
    pacer.tick();
    assert_eq!(drain(&mut out.timing).len(), 1);

    pacer.pause();
    pacer.tick();
    pacer.resume();
    assert_eq!(pacer.current_time(), Some(at_ms(500)));
}

#[test]
fn increment_time_moves_the_clock_and_discards_radio() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_timing(DriverState::new(1, at(0)));
    pacer.add_radio(clip(at(5)));
    pacer.add_radio(clip(at(20)));

    pacer.tick();
    pacer.increment_time(TimeDelta::seconds(10));
    pacer.tick();

    assert!(drain(&mut out.radio).is_empty());
    assert_eq!(pacer.buffered(), 1, "only the later clip remains");
    let ticks = drain(&mut out.event_time);
    assert_eq!(ticks.last().map(|t| t.timestamp), Some(at_ms(10_500)));
    assert_eq!(pacer.current_time(), Some(at(11)));
}

#[test]
fn remaining_time_counts_down_while_the_clock_runs() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_event(SessionAggregate {
        timestamp: at(0),
        session_start_time: Some(at(0)),
        remaining_time: TimeDelta::hours(1),
        clock_stopped: false,
        ..SessionAggregate::default()
    });

    pacer.tick();
    pacer.tick();
    let ticks = drain(&mut out.event_time);
    assert_eq!(ticks[0].remaining, TimeDelta::hours(1));
    assert_eq!(ticks[1].remaining, TimeDelta::milliseconds(3_599_500));
}

#[test]
fn remaining_time_holds_while_the_clock_is_stopped() {
    let (pacer, mut out, _drops) = paced(QueueCapacities::default(), PacerState::Running);
    pacer.add_event(SessionAggregate {
        timestamp: at(0),
        session_start_time: Some(at(0)),
        remaining_time: TimeDelta::minutes(18),
        clock_stopped: true,
        ..SessionAggregate::default()
    });

    pacer.tick();
    pacer.tick();
    let ticks = drain(&mut out.event_time);
    assert!(ticks.iter().all(|t| t.remaining == TimeDelta::minutes(18)));
}

#[test]
fn immediate_forwards_on_arrival() {
    let (senders, mut out) = output_queues(&QueueCapacities::default());
    let pacer = Immediate::new(senders, true, PacerState::Running);
    pacer.add_event(SessionAggregate {
        timestamp: at(5),
        remaining_time: TimeDelta::seconds(60),
        ..SessionAggregate::default()
    });
    pacer.add_timing(DriverState::new(44, at(3)));
    pacer.skip_laps(3);
    pacer.increment_time(TimeDelta::seconds(30));

    assert_eq!(drain(&mut out.event).len(), 1);
    assert_eq!(drain(&mut out.timing).len(), 1);
    let ticks = drain(&mut out.event_time);
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].timestamp, at(5));
    assert_eq!(ticks[0].remaining, TimeDelta::seconds(60));
    assert_eq!(pacer.buffered(), 0);

    pacer.toggle_pause();
    assert!(pacer.is_paused());
}
