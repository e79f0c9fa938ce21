use clap::Parser;
use livetiming_rs::assets::{AssetStore, DirectoryAssets, NullAssets};
use livetiming_rs::config::{Pacing, PipelineConfig};
use livetiming_rs::error::Result;
use livetiming_rs::model::SessionKind;
use livetiming_rs::pipeline::{Pipeline, PipelineStats};
use livetiming_rs::queue::Outputs;
use livetiming_rs::replay::DirectorySource;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "replay", about = "Replay an archived F1 live-timing session")]
struct Args {
    /// Directory holding one <Stream>.jsonStream file per stream
    #[arg(long, required_unless_present = "archive")]
    dir: Option<PathBuf>,

    /// Recorded live capture (stream, payload, timestamp per record)
    #[arg(long, conflicts_with = "dir")]
    archive: Option<PathBuf>,

    /// Pipeline config JSON; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session kind: race, sprint, qualifying, fp1, fp2, fp3
    #[arg(long)]
    session: Option<SessionKind>,

    /// Season year; archives up to 2018 carry no position stream
    #[arg(long)]
    year: Option<i32>,

    /// Release entities on the virtual session clock instead of immediately
    #[arg(long)]
    paced: bool,

    /// Directory with cached team-radio clips
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Print every output entity as one JSON line
    #[arg(long)]
    json: bool,

    /// Disable logging
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    kind: &'static str,
    session: SessionKind,
    counts: BTreeMap<&'static str, u64>,
    stats: PipelineStats,
}

fn print_line<T: Serialize>(json: bool, kind: &'static str, data: &T) {
    if !json {
        return;
    }
    match serde_json::to_string(&serde_json::json!({ "kind": kind, "data": data })) {
        Ok(line) => println!("{line}"),
        Err(err) => error!(kind, error = %err, "序列化输出失败"),
    }
}

/// 消费全部输出队列，直到所有发送端释放。
async fn consume(mut out: Outputs, json: bool) -> BTreeMap<&'static str, u64> {
    let mut counts = BTreeMap::new();
    let mut seen = |kind: &'static str| *counts.entry(kind).or_insert(0) += 1;
    loop {
        tokio::select! {
            Some(roster) = out.drivers.recv() => {
                seen("drivers");
                print_line(json, "drivers", &roster);
            }
            Some(driver) = out.timing.recv() => {
                seen("timing");
                print_line(json, "timing", &driver);
            }
            Some(event) = out.event.recv() => {
                seen("event");
                print_line(json, "event", &event);
            }
            Some(msg) = out.race_control.recv() => {
                seen("race_control");
                print_line(json, "race_control", &msg);
            }
            Some(weather) = out.weather.recv() => {
                seen("weather");
                print_line(json, "weather", &weather);
            }
            Some(sample) = out.telemetry.recv() => {
                seen("telemetry");
                print_line(json, "telemetry", &sample);
            }
            Some(sample) = out.location.recv() => {
                seen("location");
                print_line(json, "location", &sample);
            }
            Some(clip) = out.radio.recv() => {
                seen("radio");
                print_line(json, "radio", &clip);
            }
            Some(at) = out.event_time.recv() => {
                seen("event_time");
                print_line(json, "event_time", &at);
            }
            else => break,
        }
    }
    counts
}

/// 节拍模式：等到输入结束且缓冲全部释放。
async fn drained(pipeline: &mut Pipeline, poll: Duration) {
    pipeline.wait_for_end_of_data().await;
    let mut ticker = tokio::time::interval(poll);
    loop {
        ticker.tick().await;
        if pipeline.buffered() == 0 {
            break;
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(session) = args.session {
        config.session = session;
    }
    if args.year.is_some() {
        config.year = args.year;
    }
    if args.paced {
        config.pacing = Pacing::Paced;
    }
    let assets: Arc<dyn AssetStore> = match &args.assets {
        Some(root) => Arc::new(DirectoryAssets::new(root)),
        None => Arc::new(NullAssets),
    };

    let (mut pipeline, outputs) = match &args.archive {
        Some(path) => Pipeline::archive(&config, path, assets)?,
        None => {
            let source = DirectorySource::new(args.dir.clone().unwrap_or_default());
            Pipeline::replay(&config, &source, assets)?
        }
    };
    let consumer = tokio::spawn(consume(outputs, args.json));

    if config.is_paced() {
        let poll = config.tick_interval();
        tokio::select! {
            _ = drained(&mut pipeline, poll) => info!("✅ 全部实体已释放"),
            _ = tokio::signal::ctrl_c() => info!("收到 Ctrl-C，准备退出"),
        }
    } else {
        pipeline.wait_for_end_of_data().await;
    }

    let stats = pipeline.shutdown().await;
    let counts = match consumer.await {
        Ok(counts) => counts,
        Err(err) => {
            error!(error = %err, "❌ 输出消费任务异常退出");
            BTreeMap::new()
        }
    };

    let summary = Summary {
        kind: "summary",
        session: config.session,
        counts,
        stats,
    };
    if args.json {
        match serde_json::to_string(&summary) {
            Ok(line) => println!("{line}"),
            Err(err) => error!(error = %err, "序列化汇总失败"),
        }
    } else {
        println!("session: {}", summary.session);
        for (kind, count) in &summary.counts {
            println!("{kind}: {count}");
        }
        println!(
            "records: {} dropped_records: {} parse_errors: {} dropped_outputs: {}",
            stats.decode.records,
            stats.decode.dropped_records,
            stats.decode.parse_errors,
            stats.dropped.total()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter = if args.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "❌ 回放失败");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
