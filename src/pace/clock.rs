//! 虚拟时钟
//!
//! 节拍模式下的"当前时间"，以及从最近一次释放的会话快照得到的派生字段。

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::{SessionAggregate, SessionStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualClock {
    /// 尚未确定基线时为 `None`
    pub now: Option<DateTime<Utc>>,
    pub current_lap: u32,
    pub status: SessionStatus,
    pub session_start: Option<DateTime<Utc>>,
    pub session_length: TimeDelta,
    pub remaining: TimeDelta,
    pub clock_stopped: bool,
}

impl VirtualClock {
    /// 用刚释放的会话快照更新派生字段。
    pub fn observe(&mut self, event: &SessionAggregate) {
        self.current_lap = event.current_lap;
        self.status = event.status;
        self.session_start = event.session_start_time;
        self.session_length = event.remaining_time;
        self.remaining = event.remaining_time;
        self.clock_stopped = event.clock_stopped;
    }

    /// 时钟运行时按已流逝的虚拟时间重算剩余时间，下限为零。
    pub fn update_remaining(&mut self) {
        let (Some(now), Some(start)) = (self.now, self.session_start) else {
            return;
        };
        if self.clock_stopped {
            return;
        }
        let remaining = self.session_length - (now - start);
        self.remaining = remaining.max(TimeDelta::zero());
    }
}
