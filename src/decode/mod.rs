//! 解码器（Decoder）
//!
//! 有状态的解释器：按流名称分派原始记录，合并进车手状态表与会话聚合状态，
//! 再按能力开关把实体交给下游 sink。
//!
//! 每种流的解释逻辑按文件拆分，都是 `impl Decoder` 的一部分。

// 子模块声明
mod capabilities;
mod car_data;
mod decoder;
mod position;
mod race_control;
mod roster;
mod segments;
mod session;
mod shape;
mod stats;
mod team_radio;
mod timing;
mod timing_app;
mod weather;

// 重新导出公共接口
pub use capabilities::Capabilities;
pub use decoder::{Decoder, Flow, TelemetrySelection};
pub use stats::{DecodeSnapshot, DecodeStats};
