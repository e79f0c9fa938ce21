use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::feed::TimeParseError;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("session clock stream is missing; cannot place records on the session timeline")]
    MissingClock,
    #[error("invalid session clock line: {reason}")]
    InvalidClock { reason: String },
    #[error("invalid session clock time: {0}")]
    ClockTime(#[from] TimeParseError),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read stream {stream}: {source}")]
    Read {
        stream: String,
        #[source]
        source: io::Error,
    },
}
