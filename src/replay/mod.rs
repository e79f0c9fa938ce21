//! 归档回放（Replay）
//!
//! 把按流分开的归档文件合并到同一条会话时间轴上，产出解码器可消费的记录序列。

// 子模块声明
mod archive;
mod cursor;
mod error;
mod merge;
mod source;

// 重新导出公共接口
pub use archive::ArchiveReader;
pub use error::ReplayError;
pub use merge::{ReplayOptions, TimelineMerge, session_start_time};
pub use source::{DirectorySource, MemorySource, NOT_FOUND_RESPONSE, StreamLines, StreamSource};
