//! 实时归档读取
//!
//! 录制的实时数据每条记录占三行：流名称、载荷、时间戳。

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use tracing::{error, info};

use crate::feed::Record;

use super::error::ReplayError;

pub struct ArchiveReader<R> {
    lines: Lines<R>,
    finished: bool,
}

impl ArchiveReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReplayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            finished: false,
        }
    }

    fn next_line(&mut self) -> Option<String> {
        match self.lines.next()? {
            Ok(line) => Some(line),
            Err(err) => {
                error!(error = %err, "读取归档失败");
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for ArchiveReader<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.finished {
            return None;
        }
        let record = match (self.next_line(), self.next_line(), self.next_line()) {
            (Some(stream), Some(payload), Some(timestamp)) => Some(Record::new(stream, payload, timestamp)),
            (None, _, _) => None,
            _ => {
                error!("归档末尾记录不完整");
                None
            }
        };
        record.or_else(|| {
            self.finished = true;
            info!("🏁 归档读取完毕");
            Some(Record::end_of_data())
        })
    }
}
