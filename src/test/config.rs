use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::TimeDelta;

use crate::config::{Pacing, PipelineConfig};
use crate::error::Error;
use crate::model::SessionKind;
use crate::pace::PacerState;

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("livetiming-rs-{}-{nanos}-{name}", std::process::id()));
    fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn defaults_cover_every_field() {
    let cfg = PipelineConfig::default();
    assert_eq!(cfg.session, SessionKind::Race);
    assert_eq!(cfg.pacing, Pacing::Immediate);
    assert_eq!(cfg.initial_state, PacerState::Running);
    assert_eq!(cfg.tick_interval(), Duration::from_millis(500));
    assert_eq!(cfg.replay_step(), TimeDelta::seconds(1));
    assert_eq!(cfg.record_buffer, 100_000);
    assert!(cfg.capabilities.telemetry);
}

#[test]
fn json_file_overrides_only_given_fields() {
    let path = temp_file(
        "config.json",
        r#"{
            "session": "qualifying",
            "pacing": "paced",
            "initial_state": "paused",
            "capabilities": { "telemetry": false },
            "queues": { "timing": 5 }
        }"#,
    );
    let cfg = PipelineConfig::from_json_file(&path).expect("load config");
    assert_eq!(cfg.session, SessionKind::Qualifying);
    assert!(cfg.is_paced());
    assert_eq!(cfg.initial_state, PacerState::Paused);
    assert!(!cfg.capabilities.telemetry);
    assert!(cfg.capabilities.timing);
    assert_eq!(cfg.queues.timing, 5);
    assert_eq!(cfg.queues.weather, 100);
    assert_eq!(cfg.tick_interval_ms, 500);

    let _ = fs::remove_file(&path);
}

#[test]
fn malformed_and_missing_files_are_reported() {
    let path = temp_file("bad.json", r#"{ "pacing": "warp" }"#);
    assert!(matches!(PipelineConfig::from_json_file(&path), Err(Error::Config { .. })));
    let _ = fs::remove_file(&path);

    let missing = std::env::temp_dir().join("livetiming-rs-definitely-missing.json");
    assert!(matches!(PipelineConfig::from_json_file(&missing), Err(Error::Io { .. })));
}

#[test]
fn session_kind_parses_common_spellings() {
    assert_eq!("fp1".parse::<SessionKind>(), Ok(SessionKind::Practice1));
    assert_eq!("Sprint".parse::<SessionKind>(), Ok(SessionKind::Sprint));
    assert_eq!("pre-season".parse::<SessionKind>(), Ok(SessionKind::PreSeason));
    assert!("warmup".parse::<SessionKind>().is_err());
}
