//! 载荷编解码
//!
//! 压缩流的载荷是 base64 文本，解码后为 gzip（以魔数识别）或裸 deflate 数据，
//! 解压得到 JSON。

use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::{DeflateDecoder, GzDecoder};
use serde_json::Value;
use thiserror::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to inflate payload: {0}")]
    Inflate(#[source] std::io::Error),
    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// base64 解码并解压，返回解压后的原始字节。
///
/// 允许输入两端带空白或 JSON 字符串引号。
pub fn inflate_base64(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut text = data.trim_ascii();
    if let Some(inner) = text.strip_prefix(b"\"") {
        text = inner.strip_suffix(b"\"").unwrap_or(inner);
    }
    let raw = STANDARD.decode(text)?;

    let mut out = Vec::new();
    let inflated = if raw.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(raw.as_slice()).read_to_end(&mut out)
    } else {
        DeflateDecoder::new(raw.as_slice()).read_to_end(&mut out)
    };
    inflated.map_err(CodecError::Inflate)?;
    Ok(out)
}

/// 将一条记录的载荷解析为 JSON。
pub fn decode_payload(compressed: bool, data: &[u8]) -> Result<Value, CodecError> {
    if compressed {
        let bytes = inflate_base64(data)?;
        Ok(serde_json::from_slice(&bytes)?)
    } else {
        Ok(serde_json::from_slice(data)?)
    }
}
