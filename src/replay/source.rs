//! 流数据源
//!
//! 回放只需要"按流名称打开一个按行读取的文本"。目录源读取本地缓存的归档文件，
//! 内存源用于测试与嵌入。

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use crate::feed::StreamName;

use super::error::ReplayError;

/// 归档服务对缺失文件返回的固定响应体。
pub const NOT_FOUND_RESPONSE: &str = "<?xml version='1.0' encoding='UTF-8'?><Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>";

pub type StreamLines = Box<dyn Iterator<Item = io::Result<String>> + Send>;

pub trait StreamSource: Send {
    /// 打开一个流；`Ok(None)` 表示该流不存在。
    fn open(&self, stream: StreamName) -> Result<Option<StreamLines>, ReplayError>;
}

/// `<root>/<StreamName>.jsonStream`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StreamSource for DirectorySource {
    fn open(&self, stream: StreamName) -> Result<Option<StreamLines>, ReplayError> {
        let path = self.root.join(stream.file_name());
        match File::open(&path) {
            Ok(file) => Ok(Some(Box::new(BufReader::new(file).lines()))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ReplayError::Open { path, source }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    streams: HashMap<StreamName, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stream: StreamName, body: impl Into<String>) -> Self {
        self.insert(stream, body);
        self
    }

    pub fn insert(&mut self, stream: StreamName, body: impl Into<String>) -> &mut Self {
        self.streams.insert(stream, body.into());
        self
    }
}

impl StreamSource for MemorySource {
    fn open(&self, stream: StreamName) -> Result<Option<StreamLines>, ReplayError> {
        Ok(self
            .streams
            .get(&stream)
            .map(|body| Box::new(Cursor::new(body.clone()).lines()) as StreamLines))
    }
}
