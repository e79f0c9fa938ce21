//! 原始记录
//!
//! 解码器消费的唯一输入单元：流名称、原始载荷字节、时间戳文本。

use super::stream::StreamName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub stream: String,
    pub payload: Vec<u8>,
    pub timestamp: String,
}

impl Record {
    pub fn new(
        stream: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            stream: stream.into(),
            payload: payload.into(),
            timestamp: timestamp.into(),
        }
    }

    /// 回放结束哨兵。
    pub fn end_of_data() -> Self {
        Self::new(StreamName::EndOfData.as_str(), Vec::new(), String::new())
    }

    /// 订阅时收到的全量快照，键为流名称。
    pub fn catchup(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(StreamName::Catchup.as_str(), payload, String::new())
    }

    pub fn stream_name(&self) -> Option<StreamName> {
        StreamName::parse(&self.stream)
    }

    pub fn is_end_of_data(&self) -> bool {
        self.stream_name() == Some(StreamName::EndOfData)
    }
}
