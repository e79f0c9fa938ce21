//! 管线配置
//!
//! 可从 JSON 文件加载；缺省字段取默认值，因此 `{}` 也是合法配置。

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::decode::Capabilities;
use crate::error::{Error, Result};
use crate::model::SessionKind;
use crate::pace::PacerState;
use crate::queue::QueueCapacities;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    #[default]
    Immediate,
    Paced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub session: SessionKind,
    /// 季节年份；决定回放时是否存在位置流
    pub year: Option<i32>,
    pub capabilities: Capabilities,
    pub pacing: Pacing,
    pub initial_state: PacerState,
    pub tick_interval_ms: u64,
    pub replay_step_ms: u64,
    /// 生产者到解码器之间的记录通道容量
    pub record_buffer: usize,
    pub queues: QueueCapacities,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session: SessionKind::Race,
            year: None,
            capabilities: Capabilities::all(),
            pacing: Pacing::Immediate,
            initial_state: PacerState::Running,
            tick_interval_ms: 500,
            replay_step_ms: 1_000,
            record_buffer: 100_000,
            queues: QueueCapacities::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|err| Error::Config {
            path: path.to_path_buf(),
            cause: err.to_string(),
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn replay_step(&self) -> TimeDelta {
        let ms = i64::try_from(self.replay_step_ms).unwrap_or(i64::MAX).max(1);
        TimeDelta::try_milliseconds(ms).unwrap_or(TimeDelta::seconds(1))
    }

    pub fn is_paced(&self) -> bool {
        self.pacing == Pacing::Paced
    }
}
