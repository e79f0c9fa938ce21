use std::io::Cursor;

use serde_json::json;

use crate::feed::{Record, StreamName, decode_payload, format_time};
use crate::model::SessionKind;
use crate::replay::{
    ArchiveReader, MemorySource, NOT_FOUND_RESPONSE, ReplayError, ReplayOptions, TimelineMerge, session_start_time,
};

use super::{at, at_ms, deflate_base64};

const CLOCK: &str = "\u{feff}00:00:05.000{\"Utc\":\"2023-03-05T15:00:05.000Z\",\"Remaining\":\"2:00:00\",\"Extrapolating\":false}\n";

fn source() -> MemorySource {
    let position = deflate_base64(br#"{"Position":[]}"#);
    MemorySource::new()
        .with(StreamName::ExtrapolatedClock, CLOCK)
        .with(StreamName::DriverList, "00:00:00.100{\"1\":{\"Tla\":\"VER\"}}\n")
        .with(
            StreamName::TimingData,
            "00:00:00.500{\"Lines\":{}}\n\n00:00:02.000{\"Lines\":{\"1\":{}}}\n",
        )
        .with(StreamName::SessionStatus, "00:00:01.000{\"Status\":\"Started\"}\n")
        .with(StreamName::Position, format!("00:00:00.300\"{position}\"\n"))
        .with(StreamName::LapCount, NOT_FOUND_RESPONSE)
}

fn opts(session: SessionKind, year: Option<i32>) -> ReplayOptions {
    ReplayOptions {
        session,
        year,
        ..ReplayOptions::default()
    }
}

#[test]
fn session_start_is_clock_utc_minus_offset() {
    assert_eq!(session_start_time(&source()).expect("start"), at(0));
}

#[test]
fn missing_or_unreadable_clock_is_fatal() {
    let empty = MemorySource::new().with(StreamName::DriverList, "00:00:00.100{}\n");
    assert!(matches!(
        TimelineMerge::open(&empty, &ReplayOptions::default()),
        Err(ReplayError::MissingClock)
    ));

    let not_found = MemorySource::new().with(StreamName::ExtrapolatedClock, NOT_FOUND_RESPONSE);
    assert!(matches!(session_start_time(&not_found), Err(ReplayError::MissingClock)));

    let no_offset = MemorySource::new().with(StreamName::ExtrapolatedClock, "{\"Utc\":\"2023-03-05T15:00:05Z\"}\n");
    assert!(matches!(
        session_start_time(&no_offset),
        Err(ReplayError::InvalidClock { .. })
    ));

    let bad_offset =
        MemorySource::new().with(StreamName::ExtrapolatedClock, "00:00:0x.000{\"Utc\":\"2023-03-05T15:00:05Z\"}\n");
    assert!(matches!(session_start_time(&bad_offset), Err(ReplayError::ClockTime(_))));
}

#[test]
fn merge_orders_by_time_then_stream_and_ends_with_sentinel() {
    let merge = TimelineMerge::open(&source(), &opts(SessionKind::Race, Some(2023))).expect("open merge");
    assert_eq!(merge.session_start(), at(0));

    let records: Vec<Record> = merge.collect();
    let streams: Vec<&str> = records.iter().map(|r| r.stream.as_str()).collect();
    assert_eq!(
        streams,
        vec![
            "DriverList",
            "TimingData",
            "SessionStatus",
            "Position.z",
            "TimingData",
            "ExtrapolatedClock",
            "EndOfData"
        ]
    );
    assert_eq!(records[0].timestamp, format_time(at_ms(100)));
    assert_eq!(records[4].timestamp, format_time(at(2)));
    assert!(records.last().expect("sentinel").is_end_of_data());

    let position = decode_payload(true, &records[3].payload).expect("compressed payload");
    assert_eq!(position, json!({ "Position": [] }));
}

#[test]
fn old_seasons_skip_position_and_non_races_skip_lap_count() {
    let merge = TimelineMerge::open(&source(), &opts(SessionKind::Race, Some(2018))).expect("open merge");
    assert!(merge.into_iter().all(|r| r.stream != "Position.z"));

    assert!(!opts(SessionKind::Race, Some(2018)).includes(StreamName::ContentStreams));
    assert!(opts(SessionKind::Race, None).includes(StreamName::Position));
    assert!(opts(SessionKind::Sprint, None).includes(StreamName::LapCount));
    assert!(!opts(SessionKind::Qualifying, None).includes(StreamName::LapCount));
    assert!(!opts(SessionKind::Practice2, None).includes(StreamName::LapCount));
}

#[test]
fn merge_steps_release_due_records() {
    let mut merge = TimelineMerge::open(&source(), &opts(SessionKind::Race, None)).expect("open merge");
    assert!(merge.step().is_empty(), "nothing is due at the session start");
    assert_eq!(merge.step().len(), 4);
    assert_eq!(merge.now(), at(2));
    assert_eq!(merge.step().len(), 1);
    assert!(!merge.is_exhausted());
}

#[test]
fn archive_reader_yields_three_line_records() {
    let capture = "TimingData\n{\"Lines\":{}}\n2023-03-05T15:00:01Z\nHeartbeat\n{}\n2023-03-05T15:00:02Z\n";
    let records: Vec<Record> = ArchiveReader::new(Cursor::new(capture)).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].stream, "TimingData");
    assert_eq!(records[0].payload, b"{\"Lines\":{}}".to_vec());
    assert_eq!(records[1].timestamp, "2023-03-05T15:00:02Z");
    assert!(records[2].is_end_of_data());
}

#[test]
fn archive_reader_stops_at_a_truncated_record() {
    let capture = "TimingData\n{}\n2023-03-05T15:00:01Z\nHeartbeat\n{}\n";
    let records: Vec<Record> = ArchiveReader::new(Cursor::new(capture)).collect();
    assert_eq!(records.len(), 2);
    assert!(records[1].is_end_of_data());
}
