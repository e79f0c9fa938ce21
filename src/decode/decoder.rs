use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::assets::AssetStore;
use crate::feed::{Record, StreamName, catchup_epoch, decode_payload, parse_time};
use crate::model::{DriverState, SessionAggregate, SessionKind};
use crate::pace::EventSink;

use super::capabilities::Capabilities;
use super::stats::DecodeStats;

/// 单条记录处理后的去向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    EndOfData,
}

/// 遥测车辆过滤；`None` 表示全部车辆。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySelection(Option<Arc<BTreeSet<u32>>>);

impl TelemetrySelection {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn only(cars: impl IntoIterator<Item = u32>) -> Self {
        Self(Some(Arc::new(cars.into_iter().collect())))
    }

    pub fn allows(&self, car: u32) -> bool {
        self.0.as_ref().is_none_or(|cars| cars.contains(&car))
    }
}

pub struct Decoder {
    pub(super) caps: Capabilities,
    pub(super) session: SessionKind,
    /// 键为 feed 中的车号字符串
    pub(super) drivers: BTreeMap<String, DriverState>,
    pub(super) aggregate: SessionAggregate,
    sink: Arc<dyn EventSink>,
    pub(super) assets: Arc<dyn AssetStore>,
    pub(super) telemetry: watch::Receiver<TelemetrySelection>,
    stats: Arc<DecodeStats>,
}

impl Decoder {
    pub fn new(
        caps: Capabilities,
        session: SessionKind,
        sink: Arc<dyn EventSink>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        let (_selection, telemetry) = watch::channel(TelemetrySelection::all());
        Self {
            caps,
            session,
            drivers: BTreeMap::new(),
            aggregate: SessionAggregate::default(),
            sink,
            assets,
            telemetry,
            stats: Arc::new(DecodeStats::default()),
        }
    }

    pub fn with_telemetry_selection(mut self, selection: watch::Receiver<TelemetrySelection>) -> Self {
        self.telemetry = selection;
        self
    }

    pub fn stats(&self) -> Arc<DecodeStats> {
        Arc::clone(&self.stats)
    }

    pub fn driver(&self, number: &str) -> Option<&DriverState> {
        self.drivers.get(number)
    }

    pub fn drivers(&self) -> impl Iterator<Item = &DriverState> {
        self.drivers.values()
    }

    pub fn aggregate(&self) -> &SessionAggregate {
        &self.aggregate
    }

    /// 处理一条原始记录。
    ///
    /// 载荷无法解码的记录计入丢弃统计后跳过，不影响后续记录。
    pub fn process(&mut self, record: &Record) -> Flow {
        let Some(stream) = record.stream_name() else {
            debug!(stream = %record.stream, "忽略未知流");
            return Flow::Continue;
        };
        match stream {
            StreamName::EndOfData => return Flow::EndOfData,
            StreamName::Catchup => {
                self.replay_catchup(record);
                return Flow::Continue;
            }
            _ => {}
        }
        if !self.caps.decodes(stream) {
            trace!(stream = %stream, "下游未请求，跳过解码");
            return Flow::Continue;
        }

        let payload = match decode_payload(stream.is_compressed(), &record.payload) {
            Ok(payload) => payload,
            Err(err) => {
                self.stats.record_dropped();
                error!(stream = %stream, timestamp = %record.timestamp, error = %err, "❌ 载荷解码失败，丢弃记录");
                return Flow::Continue;
            }
        };
        let timestamp = match parse_time(&record.timestamp) {
            Ok(ts) => ts,
            Err(err) => {
                self.parse_error(stream, catchup_epoch(), "timestamp", err);
                catchup_epoch()
            }
        };

        self.stats.record_decoded();
        self.handle(stream, &payload, timestamp);
        Flow::Continue
    }

    /// 订阅快照：按固定流顺序逐个解释，时间戳一律为未设定。
    fn replay_catchup(&mut self, record: &Record) {
        let bundle: Value = match serde_json::from_slice(&record.payload) {
            Ok(bundle) => bundle,
            Err(err) => {
                self.stats.record_dropped();
                error!(error = %err, "❌ catch-up 快照解析失败");
                return;
            }
        };
        let Some(streams) = bundle.as_object() else {
            self.stats.record_dropped();
            error!("❌ catch-up 快照不是对象");
            return;
        };

        self.stats.record_decoded();
        let at = catchup_epoch();
        for stream in StreamName::ORDERED {
            if matches!(
                stream,
                StreamName::TeamRadio | StreamName::ContentStreams | StreamName::AudioStreams
            ) || !self.caps.decodes(stream)
            {
                continue;
            }
            let Some(data) = streams.get(stream.as_str()) else {
                continue;
            };
            if !stream.is_compressed() {
                self.handle(stream, data, at);
                continue;
            }
            let Some(text) = data.as_str() else {
                self.parse_error(stream, at, "<root>", "compressed snapshot is not a string");
                continue;
            };
            match decode_payload(true, text.as_bytes()) {
                Ok(payload) => self.handle(stream, &payload, at),
                Err(err) => {
                    self.stats.record_dropped();
                    error!(stream = %stream, error = %err, "❌ catch-up 压缩数据解码失败");
                }
            }
        }
        info!(drivers = self.drivers.len(), "📥 catch-up 快照处理完成");
    }

    /// 按流名称分派到对应解释器，并按能力开关转发结果。
    #[tracing::instrument(skip_all, fields(stream = %stream, timestamp = %timestamp))]
    pub fn handle(&mut self, stream: StreamName, payload: &Value, timestamp: DateTime<Utc>) {
        let caps = self.caps;
        match stream {
            StreamName::DriverList => {
                if let Some(roster) = self.decode_driver_list(payload, timestamp) {
                    self.sink.add_drivers(roster);
                }
            }
            StreamName::SessionInfo => {
                let (event, resets) = self.decode_session_info(payload, timestamp);
                self.emit_event(event);
                self.emit_timing(resets);
            }
            StreamName::SessionStatus => {
                let (event, resets) = self.decode_session_status(payload, timestamp);
                self.emit_event(event);
                self.emit_timing(resets);
            }
            StreamName::SessionData => {
                for event in self.decode_session_data(payload, timestamp) {
                    self.emit_event(event);
                }
            }
            StreamName::LapCount => {
                let event = self.decode_lap_count(payload, timestamp);
                self.emit_event(event);
            }
            StreamName::ExtrapolatedClock => {
                let event = self.decode_extrapolated_clock(payload, timestamp);
                self.emit_event(event);
            }
            StreamName::Heartbeat => {
                let event = self.decode_heartbeat(timestamp);
                self.emit_event(event);
            }
            StreamName::TimingData => {
                let drivers = self.decode_timing_data(payload, timestamp);
                self.emit_timing(drivers);
            }
            StreamName::TimingAppData => {
                let drivers = self.decode_timing_app_data(payload, timestamp);
                self.emit_timing(drivers);
            }
            StreamName::CarData => {
                if !caps.telemetry && !caps.timing {
                    return;
                }
                let (samples, drivers) = self.decode_car_data(payload, timestamp);
                if caps.telemetry {
                    for sample in samples {
                        self.sink.add_telemetry(sample);
                    }
                }
                self.emit_timing(drivers);
            }
            StreamName::Position => {
                if caps.location {
                    for sample in self.decode_position(payload, timestamp) {
                        self.sink.add_location(sample);
                    }
                }
            }
            StreamName::WeatherData => {
                if caps.weather {
                    self.sink.add_weather(self.decode_weather(payload, timestamp));
                }
            }
            StreamName::RaceControlMessages => {
                let decoded = self.decode_race_control(payload, timestamp);
                if caps.race_control {
                    for msg in decoded.messages {
                        self.sink.add_race_control(msg);
                    }
                }
                for event in decoded.events {
                    self.emit_event(event);
                }
                self.emit_timing(decoded.drivers);
            }
            StreamName::TeamRadio => {
                if caps.team_radio {
                    for clip in self.decode_team_radio(payload, timestamp) {
                        self.sink.add_radio(clip);
                    }
                }
            }
            StreamName::TrackStatus
            | StreamName::TimingStats
            | StreamName::TopThree
            | StreamName::AudioStreams
            | StreamName::ContentStreams => trace!("流不参与解释"),
            StreamName::EndOfData | StreamName::Catchup => {}
        }
    }

    fn emit_event(&self, event: SessionAggregate) {
        if self.caps.event {
            self.sink.add_event(event);
        }
    }

    fn emit_timing(&self, drivers: Vec<DriverState>) {
        if self.caps.timing {
            for driver in drivers {
                self.sink.add_timing(driver);
            }
        }
    }

    pub(super) fn parse_error(
        &self,
        stream: StreamName,
        timestamp: DateTime<Utc>,
        field: &str,
        reason: impl fmt::Display,
    ) {
        self.stats.parse_error();
        warn!(stream = %stream, timestamp = %timestamp, field, %reason, "⚠️ 字段解析失败");
    }

    /// 解码任务主循环：直到收到结束哨兵、输入关闭或关停信号。
    pub async fn run(
        mut self,
        mut records: mpsc::Receiver<Record>,
        mut shutdown: watch::Receiver<bool>,
        end_of_data: watch::Sender<bool>,
    ) {
        info!(session = %self.session, "▶️  解码任务启动");
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
                next = records.recv() => match next {
                    Some(record) => {
                        if self.process(&record) == Flow::EndOfData {
                            info!("🏁 收到结束哨兵");
                            end_of_data.send_replace(true);
                            break;
                        }
                    }
                    None => {
                        debug!("输入通道已关闭");
                        end_of_data.send_replace(true);
                        break;
                    }
                },
            }
        }
        let stats = self.stats.snapshot();
        info!(
            records = stats.records,
            dropped = stats.dropped_records,
            parse_errors = stats.parse_errors,
            "⏹️  解码任务结束"
        );
    }
}
