//! 顶层错误类型

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::assets::AssetError;
use crate::feed::{CodecError, TimeParseError};
use crate::replay::ReplayError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Time(#[from] TimeParseError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("invalid configuration {path}: {cause}")]
    Config { path: PathBuf, cause: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
