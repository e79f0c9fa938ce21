//! 数据源（feed）层
//!
//! 流名称词表、原始记录、压缩载荷编解码以及 feed 使用的时间/时长文本语法。

// 子模块声明
mod codec;
mod record;
mod stream;
mod time;

// 重新导出公共接口
pub use codec::{CodecError, decode_payload, inflate_base64};
pub use record::Record;
pub use stream::StreamName;
pub use time::{
    TimeParseError, catchup_epoch, format_time, is_unset, parse_clock, parse_duration,
    parse_offset, parse_time,
};
