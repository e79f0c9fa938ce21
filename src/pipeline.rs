//! 管线（Pipeline）
//!
//! 把生产者、解码器与节拍器连成一组任务：
//! - 生产者：时间轴合并或实时归档，运行在阻塞线程上，经有界通道交给解码器
//! - 解码器：单独一个任务，独占全部解释状态
//! - 节拍器：立即模式无需任务；节拍模式由 ticker 任务驱动
//!
//! 所有构造函数都必须在 tokio 运行时内调用。

use std::mem;
use std::path::Path;
use std::sync::Arc;

use chrono::TimeDelta;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::assets::AssetStore;
use crate::config::{Pacing, PipelineConfig};
use crate::decode::{DecodeSnapshot, DecodeStats, Decoder, TelemetrySelection};
use crate::error::Result;
use crate::feed::Record;
use crate::model::SessionKind;
use crate::pace::{EventSink, Immediate, Paced, PacedConfig, Pacer, PacerState};
use crate::queue::{DropCounters, DropStats, Outputs, output_queues};
use crate::replay::{ArchiveReader, ReplayOptions, StreamSource, TimelineMerge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub decode: DecodeSnapshot,
    pub dropped: DropStats,
}

pub struct Pipeline {
    session: SessionKind,
    pacer: Arc<dyn Pacer>,
    telemetry: watch::Sender<TelemetrySelection>,
    shutdown: watch::Sender<bool>,
    end_of_data: watch::Receiver<bool>,
    decode: Arc<DecodeStats>,
    drops: DropCounters,
    tasks: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// 回放按流分开的归档。时钟流缺失或损坏时直接返回错误。
    pub fn replay(
        config: &PipelineConfig,
        source: &dyn StreamSource,
        assets: Arc<dyn AssetStore>,
    ) -> Result<(Self, Outputs)> {
        let opts = ReplayOptions {
            session: config.session,
            year: config.year,
            step: config.replay_step(),
        };
        let merge = TimelineMerge::open(source, &opts)?;
        Ok(Self::with_producer(config, merge, assets))
    }

    /// 回放录制的实时数据（三行一条记录）。
    pub fn archive(
        config: &PipelineConfig,
        path: impl AsRef<Path>,
        assets: Arc<dyn AssetStore>,
    ) -> Result<(Self, Outputs)> {
        let reader = ArchiveReader::open(path)?;
        Ok(Self::with_producer(config, reader, assets))
    }

    /// 由调用方提供记录通道；通道关闭等同于结束哨兵。
    pub fn from_records(
        config: &PipelineConfig,
        records: mpsc::Receiver<Record>,
        assets: Arc<dyn AssetStore>,
    ) -> (Self, Outputs) {
        let (senders, outputs) = output_queues(&config.queues);
        let drops = senders.drop_counters();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (end_of_data_tx, end_of_data) = watch::channel(false);
        let (telemetry, telemetry_rx) = watch::channel(TelemetrySelection::all());
        let emit_event_time = config.capabilities.event_time;

        let mut tasks = Vec::new();
        let (sink, pacer): (Arc<dyn EventSink>, Arc<dyn Pacer>) = match config.pacing {
            Pacing::Immediate => {
                let immediate = Arc::new(Immediate::new(senders, emit_event_time, config.initial_state));
                let sink: Arc<dyn EventSink> = immediate.clone();
                let pacer: Arc<dyn Pacer> = immediate;
                (sink, pacer)
            }
            Pacing::Paced => {
                let paced = Arc::new(Paced::new(
                    senders,
                    PacedConfig {
                        tick_interval: config.tick_interval(),
                        emit_event_time,
                        initial_state: config.initial_state,
                    },
                ));
                tasks.push(tokio::spawn(Arc::clone(&paced).run(shutdown_rx.clone())));
                let sink: Arc<dyn EventSink> = paced.clone();
                let pacer: Arc<dyn Pacer> = paced;
                (sink, pacer)
            }
        };

        let decoder = Decoder::new(config.capabilities, config.session, sink, assets)
            .with_telemetry_selection(telemetry_rx);
        let decode = decoder.stats();
        tasks.push(tokio::spawn(decoder.run(records, shutdown_rx, end_of_data_tx)));

        info!(
            session = %config.session,
            pacing = ?config.pacing,
            "✅ 管线已启动"
        );
        let pipeline = Self {
            session: config.session,
            pacer,
            telemetry,
            shutdown,
            end_of_data,
            decode,
            drops,
            tasks,
        };
        (pipeline, outputs)
    }

    fn with_producer<I>(config: &PipelineConfig, records: I, assets: Arc<dyn AssetStore>) -> (Self, Outputs)
    where
        I: Iterator<Item = Record> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.record_buffer.max(1));
        let (mut pipeline, outputs) = Self::from_records(config, rx, assets);
        let shutdown = pipeline.shutdown.subscribe();
        pipeline
            .tasks
            .push(tokio::task::spawn_blocking(move || pump(records, tx, shutdown)));
        (pipeline, outputs)
    }

    pub fn session(&self) -> SessionKind {
        self.session
    }

    pub fn pause(&self) {
        self.pacer.pause();
    }

    pub fn resume(&self) {
        self.pacer.resume();
    }

    pub fn toggle_pause(&self) {
        self.pacer.toggle_pause();
    }

    pub fn is_paused(&self) -> bool {
        self.pacer.is_paused()
    }

    pub fn state(&self) -> PacerState {
        self.pacer.state()
    }

    /// 只有正赛与冲刺赛按圈计数。
    pub fn skip_laps(&self, laps: u32) {
        if !self.session.is_race_like() {
            debug!(session = %self.session, laps, "该会话类别不支持按圈跳跃");
            return;
        }
        self.pacer.skip_laps(laps);
    }

    pub fn skip_to_session_start(&self) {
        self.pacer.skip_to_session_start();
    }

    pub fn increment_time(&self, by: TimeDelta) {
        self.pacer.increment_time(by);
    }

    pub fn select_telemetry(&self, selection: TelemetrySelection) {
        self.telemetry.send_replace(selection);
    }

    /// 节拍器缓冲中尚未释放的实体数。
    pub fn buffered(&self) -> usize {
        self.pacer.buffered()
    }

    pub fn is_end_of_data(&self) -> bool {
        *self.end_of_data.borrow()
    }

    /// 解码器消费到结束哨兵（或输入关闭）后返回。
    pub async fn wait_for_end_of_data(&mut self) {
        if self.end_of_data.wait_for(|done| *done).await.is_err() {
            debug!("解码任务已退出，未收到结束哨兵");
        }
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            decode: self.decode.snapshot(),
            dropped: self.drops.snapshot(),
        }
    }

    /// 通知全部任务退出并等待结束；返回后输出队列的发送端随之释放。
    pub async fn shutdown(mut self) -> PipelineStats {
        self.shutdown.send_replace(true);
        for task in mem::take(&mut self.tasks) {
            if let Err(err) = task.await {
                error!(error = %err, "❌ 管线任务异常退出");
            }
        }
        let stats = self.stats();
        info!(
            records = stats.decode.records,
            dropped_records = stats.decode.dropped_records,
            parse_errors = stats.decode.parse_errors,
            dropped_outputs = stats.dropped.total(),
            "⏹️  管线已关闭"
        );
        stats
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

fn pump<I>(records: I, tx: mpsc::Sender<Record>, shutdown: watch::Receiver<bool>)
where
    I: Iterator<Item = Record>,
{
    let mut sent = 0u64;
    for record in records {
        if *shutdown.borrow() {
            debug!(sent, "收到关停信号，生产者退出");
            return;
        }
        if tx.blocking_send(record).is_err() {
            debug!(sent, "解码任务已退出，生产者停止");
            return;
        }
        sent += 1;
    }
    info!(records = sent, "📤 生产者结束");
}
