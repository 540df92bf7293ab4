//! 内联 (`data:`) 资源解码.
//!
//! 格式: `data:[<媒体类型>][;base64],<数据>`.
//! 非 base64 的数据按百分号编码解码.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use liu_core::{LiuError, LiuResult};

use crate::locator::DATA_SCHEME;

/// 解码后的内联资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// 媒体类型 (缺省为 `text/plain`)
    pub media_type: String,
    /// 资源内容
    pub payload: Bytes,
}

/// 解析 `data:` URI
pub fn decode(uri: &str) -> LiuResult<DataUri> {
    let body = uri
        .strip_prefix(DATA_SCHEME)
        .ok_or_else(|| LiuError::InvalidArgument(format!("不是 data: URI: {uri}")))?;
    let (header, data) = body
        .split_once(',')
        .ok_or_else(|| LiuError::InvalidData("data: URI 缺少 ',' 分隔符".into()))?;

    let (media_type, is_base64) = match header.strip_suffix(";base64") {
        Some(mt) => (mt, true),
        None => (header, false),
    };
    let media_type = if media_type.is_empty() {
        "text/plain".to_string()
    } else {
        media_type.to_string()
    };

    let payload = if is_base64 {
        STANDARD
            .decode(data)
            .map_err(|e| LiuError::InvalidData(format!("data: URI base64 解码失败: {e}")))?
    } else {
        urlencoding::decode_binary(data.as_bytes()).into_owned()
    };

    Ok(DataUri {
        media_type,
        payload: Bytes::from(payload),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_内联资源() {
        let uri = decode("data:application/wasm;base64,AGFzbQ==").unwrap();
        assert_eq!(uri.media_type, "application/wasm");
        assert_eq!(uri.payload.as_ref(), b"\0asm");
    }

    #[test]
    fn test_百分号编码内联资源() {
        let uri = decode("data:,liu-builtin%3Araw").unwrap();
        assert_eq!(uri.media_type, "text/plain");
        assert_eq!(uri.payload.as_ref(), b"liu-builtin:raw");
    }

    #[test]
    fn test_缺少分隔符() {
        assert!(matches!(
            decode("data:text/plain"),
            Err(LiuError::InvalidData(_))
        ));
    }

    #[test]
    fn test_非法_base64() {
        assert!(decode("data:;base64,@@@").is_err());
    }
}
