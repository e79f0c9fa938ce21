//! 输出队列（Output queues）
//!
//! 每种实体一条有界通道；队列满时直接丢弃新到达的实体（尾丢弃），生产者从不阻塞。

// 子模块声明
mod drop_tail;
mod outputs;

// 重新导出公共接口
pub use drop_tail::{OutputQueue, drop_tail};
pub use outputs::{DropCounters, DropStats, OutputSenders, Outputs, QueueCapacities, output_queues};
