use crate::model::WeatherSample;
use crate::queue::{QueueCapacities, drop_tail, output_queues};

use super::at;

fn weather(secs: i64) -> WeatherSample {
    WeatherSample {
        timestamp: at(secs),
        ..WeatherSample::default()
    }
}

#[test]
fn drop_tail_queue_enforces_capacity_and_preserves_order() {
    let (q, mut rx) = drop_tail("weather", 2);
    assert_eq!(q.name(), "weather");
    assert_eq!(q.capacity(), 2);
    assert!(q.is_empty());

    assert!(q.push(weather(1)).is_ok());
    assert!(q.push(weather(2)).is_ok());
    assert_eq!(q.len(), 2);

    let dropped = q.push(weather(3)).expect_err("should drop");
    assert_eq!(dropped.timestamp, at(3));
    assert_eq!(q.dropped(), 1);

    assert_eq!(rx.try_recv().expect("first").timestamp, at(1));
    assert_eq!(rx.try_recv().expect("second").timestamp, at(2));
    assert!(rx.try_recv().is_err());
    assert!(q.push(weather(4)).is_ok(), "space frees up once the consumer reads");
}

#[test]
fn drop_tail_queue_counts_pushes_after_consumer_leaves() {
    let (q, rx) = drop_tail("weather", 4);
    drop(rx);
    assert!(q.push(weather(1)).is_err());
    assert_eq!(q.dropped(), 1);
}

#[test]
fn zero_capacity_is_raised_to_one() {
    let (q, _rx) = drop_tail::<WeatherSample>("event_time", 0);
    assert_eq!(q.capacity(), 1);
}

#[test]
fn output_queues_share_drop_counters_with_senders() {
    let capacities = QueueCapacities {
        weather: 1,
        ..QueueCapacities::default()
    };
    let (senders, _outputs) = output_queues(&capacities);
    let counters = senders.drop_counters();

    assert!(senders.weather.push(weather(1)).is_ok());
    assert!(senders.weather.push(weather(2)).is_err());
    assert!(senders.weather.push(weather(3)).is_err());

    let stats = counters.snapshot();
    assert_eq!(stats.weather, 2);
    assert_eq!(stats.timing, 0);
    assert_eq!(stats.total(), 2);
}

#[test]
fn default_capacities_match_the_feed_rates() {
    let caps = QueueCapacities::default();
    assert_eq!(caps.timing, 10_000);
    assert_eq!(caps.event_time, 10);
    assert_eq!(caps.weather, 100);
    assert_eq!(caps.telemetry, 1_000);
}
