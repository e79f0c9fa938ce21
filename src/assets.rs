//! 资源存储（Asset store）
//!
//! 车队无线电音频按相对路径取回；回放时通常指向本地缓存目录，未配置时返回空音频。

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::trace;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset path escapes the asset root: {0}")]
    InvalidPath(String),
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait AssetStore: Send + Sync {
    fn team_radio(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// 不提供任何音频；片段照常发出但音频为空。
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAssets;

impl AssetStore for NullAssets {
    fn team_radio(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        trace!(path, "未配置资源目录");
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for DirectoryAssets {
    fn team_radio(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(AssetError::InvalidPath(path.to_string()));
        }
        let full = self.root.join(relative);
        match read_file(&full) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(AssetError::NotFound(path.to_string())),
            Err(source) => Err(AssetError::Io { path: full, source }),
        }
    }
}

/// 解码任务运行在异步运行时里；多线程运行时下先让出工作线程再读文件。
fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| std::fs::read(path))
        }
        _ => std::fs::read(path),
    }
}
