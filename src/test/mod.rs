mod config;
mod pacer;
mod queues;
mod replay;

use std::io::Write;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::assets::NullAssets;
use crate::decode::{Capabilities, Decoder};
use crate::feed::{StreamName, parse_time};
use crate::model::{
    DriverRoster, DriverState, PositionSample, RaceControlMessage, RadioClip, SessionAggregate, SessionKind,
    TelemetrySample, WeatherSample,
};
use crate::pace::EventSink;

/// 记录解码器全部输出的 sink。
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    pub drivers: Mutex<Vec<DriverRoster>>,
    pub timing: Mutex<Vec<DriverState>>,
    pub events: Mutex<Vec<SessionAggregate>>,
    pub race_control: Mutex<Vec<RaceControlMessage>>,
    pub weather: Mutex<Vec<WeatherSample>>,
    pub telemetry: Mutex<Vec<TelemetrySample>>,
    pub location: Mutex<Vec<PositionSample>>,
    pub radio: Mutex<Vec<RadioClip>>,
}

impl EventSink for RecordingSink {
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

pub(crate) fn decoder(caps: Capabilities, session: SessionKind) -> (Decoder, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let decoder = Decoder::new(caps, session, sink.clone(), Arc::new(NullAssets));
    (decoder, sink)
}

/// 2023-03-05T15:00:00Z 之后 `secs` 秒。
pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    base() + TimeDelta::seconds(secs)
}

pub(crate) fn at_ms(ms: i64) -> DateTime<Utc> {
    base() + TimeDelta::milliseconds(ms)
}

fn base() -> DateTime<Utc> {
    parse_time("2023-03-05T15:00:00Z").expect("base time")
}

pub(crate) fn roster() -> Value {
    json!({
        "1": {
            "RacingNumber": "1",
            "FullName": "Max VERSTAPPEN",
            "Tla": "VER",
            "TeamName": "Red Bull Racing",
            "TeamColour": "3671C6",
            "Line": 1
        },
        "16": {
            "RacingNumber": "16",
            "FullName": "Charles LECLERC",
            "Tla": "LEC",
            "TeamName": "Ferrari",
            "TeamColour": "E8002D",
            "Line": 3
        },
        "44": {
            "RacingNumber": "44",
            "FullName": "Lewis HAMILTON",
            "Tla": "HAM",
            "TeamName": "Mercedes",
            "TeamColour": "27F4D2",
            "Line": 2
        }
    })
}

/// 三段分段布局 [3, 2, 3]；车手 1 的第一个分段为 `first_status`。
pub(crate) fn layout(first_status: i64) -> Value {
    json!({
        "Lines": {
            "1": {
                "Sectors": [
                    { "Segments": [ { "Status": first_status }, { "Status": 0 }, { "Status": 0 } ] },
                    { "Segments": [ { "Status": 0 }, { "Status": 0 } ] },
                    { "Segments": [ { "Status": 0 }, { "Status": 0 }, { "Status": 0 } ] }
                ]
            }
        }
    })
}

pub(crate) fn with_roster(session: SessionKind) -> (Decoder, Arc<RecordingSink>) {
    let (mut decoder, sink) = decoder(Capabilities::all(), session);
    decoder.handle(StreamName::DriverList, &roster(), at(0));
    (decoder, sink)
}

pub(crate) fn deflate_base64(data: &[u8]) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("deflate");
    STANDARD.encode(encoder.finish().expect("finish deflate"))
}

pub(crate) fn gzip_base64(data: &[u8]) -> String {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("gzip");
    STANDARD.encode(encoder.finish().expect("finish gzip"))
}
