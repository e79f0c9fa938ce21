//! 节拍器（Pacer）
//!
//! 解码器产出的实体经节拍器进入输出队列：
//! - `Immediate`：到达即转发
//! - `Paced`：按虚拟时钟节拍释放，可暂停、按圈跳跃、跳到会话开始、手动推进时间

// 子模块声明
mod buffer;
mod clock;
mod immediate;
mod paced;
mod sink;

// 重新导出公共接口
pub use buffer::{TimedBuffer, Timestamped};
pub use clock::VirtualClock;
pub use immediate::Immediate;
pub use paced::{Paced, PacedConfig};
pub use sink::{EventSink, Pacer, PacerState};
