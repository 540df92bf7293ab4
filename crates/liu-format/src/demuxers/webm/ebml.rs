//! EBML (Extensible Binary Meta Language) 基础解析.
//!
//! 所有函数都在内存切片上工作. 增量解析时数据可能不完整,
//! 头部解析函数用 `Ok(None)` 表示"需要更多数据", 用 `Err` 表示数据损坏.
//!
//! # 变长整数 (VINT)
//! ```text
//! 首字节的前导 1 位之前的 0 的数量决定了字节长度:
//!   1xxxxxxx                  → 1 字节 (7 位数据)
//!   01xxxxxx xxxxxxxx         → 2 字节 (14 位数据)
//!   001xxxxx xxxxxxxx ×2      → 3 字节 (21 位数据)
//!   ...依此类推, 最多 8 字节
//! ```

use liu_core::{LiuError, LiuResult};

/// 元素头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementHeader {
    /// 元素 ID (保留前导标记位)
    pub id: u32,
    /// 数据大小, `None` 表示未知大小
    pub size: Option<u64>,
    /// 头部字节数 (ID + 大小)
    pub header_len: usize,
}

impl ElementHeader {
    /// 头部加数据的总字节数 (未知大小时为 None)
    pub fn total_len(&self) -> Option<u64> {
        self.size.map(|size| size + self.header_len as u64)
    }
}

fn malformed(msg: impl Into<String>) -> LiuError {
    LiuError::MalformedContainer(format!("EBML: {}", msg.into()))
}

/// 解析元素 ID
///
/// 元素 ID 保留前导位, 不做掩码处理. 返回 (ID, 字节数).
pub fn parse_element_id(data: &[u8]) -> LiuResult<Option<(u32, usize)>> {
    let Some(&first) = data.first() else {
        return Ok(None);
    };
    if first == 0 {
        return Err(malformed("无效的元素 ID"));
    }

    let len = first.leading_zeros() as usize + 1;
    if len > 4 {
        return Err(malformed("元素 ID 超过 4 字节"));
    }
    if data.len() < len {
        return Ok(None);
    }

    let id = data[..len]
        .iter()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
    Ok(Some((id, len)))
}

/// 解析变长整数的数值 (掩掉前导标记位)
///
/// 返回 (数值, 字节数).
pub fn parse_vint(data: &[u8]) -> LiuResult<Option<(u64, usize)>> {
    let Some(&first) = data.first() else {
        return Ok(None);
    };
    if first == 0 {
        return Err(malformed("无效的变长整数"));
    }

    let len = first.leading_zeros() as usize + 1;
    if data.len() < len {
        return Ok(None);
    }

    // 掩掉前导标记位
    let mask = 0xFFu16 >> len;
    let value = data[1..len]
        .iter()
        .fold(u64::from(first & mask as u8), |acc, &b| (acc << 8) | u64::from(b));
    Ok(Some((value, len)))
}

/// 解析元素数据大小
///
/// 所有数据位都为 1 表示"未知大小", 返回 `None` 作为大小.
pub fn parse_vint_size(data: &[u8]) -> LiuResult<Option<(Option<u64>, usize)>> {
    let Some((value, len)) = parse_vint(data)? else {
        return Ok(None);
    };
    let max_val = (1u64 << (7 * len)) - 1;
    let size = (value != max_val).then_some(value);
    Ok(Some((size, len)))
}

/// 解析元素头部 (ID + 大小)
pub fn parse_element_header(data: &[u8]) -> LiuResult<Option<ElementHeader>> {
    let Some((id, id_len)) = parse_element_id(data)? else {
        return Ok(None);
    };
    let Some((size, size_len)) = parse_vint_size(&data[id_len..])? else {
        return Ok(None);
    };
    Ok(Some(ElementHeader {
        id,
        size,
        header_len: id_len + size_len,
    }))
}

/// 读取无符号整数 (大端, 0-8 字节, 空数据为 0)
pub fn read_uint(data: &[u8]) -> LiuResult<u64> {
    if data.len() > 8 {
        return Err(malformed(format!("无效的 uint 大小: {}", data.len())));
    }
    Ok(data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// 读取浮点数 (0, 4 或 8 字节)
pub fn read_float(data: &[u8]) -> LiuResult<f64> {
    match data.len() {
        0 => Ok(0.0),
        4 => Ok(f64::from(f32::from_bits(read_uint(data)? as u32))),
        8 => Ok(f64::from_bits(read_uint(data)?)),
        n => Err(malformed(format!("无效的浮点数大小: {n}"))),
    }
}

/// 读取 UTF-8 字符串 (截断到第一个 NUL)
pub fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// 已完整缓冲的主元素的子元素迭代器
///
/// 每项为 (子元素 ID, 子元素数据). 子元素越界或大小未知时返回错误并停止.
pub struct Children<'a> {
    data: &'a [u8],
    failed: bool,
}

impl<'a> Children<'a> {
    /// 迭代主元素数据中的子元素
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            failed: false,
        }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = LiuResult<(u32, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        let result = match parse_element_header(self.data) {
            Ok(Some(ElementHeader {
                id,
                size: Some(size),
                header_len,
            })) => {
                let end = header_len as u64 + size;
                if end > self.data.len() as u64 {
                    Err(malformed(format!("子元素 0x{id:X} 越界")))
                } else {
                    let end = end as usize;
                    let body = &self.data[header_len..end];
                    self.data = &self.data[end..];
                    Ok((id, body))
                }
            }
            Ok(Some(header)) => Err(malformed(format!(
                "子元素 0x{:X} 大小未知",
                header.id
            ))),
            Ok(None) => Err(malformed("子元素头部被截断")),
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

// ========================
// 已知的 Matroska 元素 ID
// ========================

// EBML Header
pub const EBML_HEADER: u32 = 0x1A45_DFA3;
pub const EBML_DOC_TYPE: u32 = 0x4282;
pub const EBML_VOID: u32 = 0xEC;

// Segment
pub const SEGMENT: u32 = 0x1853_8067;

// Segment Information
pub const SEGMENT_INFO: u32 = 0x1549_A966;
pub const INFO_TIMESCALE: u32 = 0x002A_D7B1;
pub const INFO_DURATION: u32 = 0x4489;

// Tracks
pub const TRACKS: u32 = 0x1654_AE6B;
pub const TRACK_ENTRY: u32 = 0xAE;
pub const TRACK_NUMBER: u32 = 0xD7;
pub const TRACK_TYPE: u32 = 0x83;
pub const TRACK_CODEC_ID: u32 = 0x86;
pub const TRACK_DEFAULT_DURATION: u32 = 0x0023_E383;

// Video settings
pub const VIDEO_SETTINGS: u32 = 0xE0;
pub const VIDEO_PIXEL_WIDTH: u32 = 0xB0;
pub const VIDEO_PIXEL_HEIGHT: u32 = 0xBA;
pub const VIDEO_DISPLAY_WIDTH: u32 = 0x54B0;
pub const VIDEO_DISPLAY_HEIGHT: u32 = 0x54BA;
pub const VIDEO_COLOUR_SPACE: u32 = 0x002E_B524;

// Audio settings
pub const AUDIO_SETTINGS: u32 = 0xE1;
pub const AUDIO_SAMPLING_FREQ: u32 = 0xB5;
pub const AUDIO_CHANNELS: u32 = 0x9F;

// Cluster
pub const CLUSTER: u32 = 0x1F43_B675;
pub const CLUSTER_TIMESTAMP: u32 = 0xE7;
pub const SIMPLE_BLOCK: u32 = 0xA3;
pub const BLOCK_GROUP: u32 = 0xA0;
pub const BLOCK: u32 = 0xA1;
pub const BLOCK_REFERENCE: u32 = 0xFB;

// Segment 级的其他元素 (只跳过, 不解析)
pub const CUES: u32 = 0x1C53_BB6B;
pub const SEEK_HEAD: u32 = 0x114D_9B74;
pub const TAGS: u32 = 0x1254_C367;
pub const CHAPTERS: u32 = 0x1043_A770;
pub const ATTACHMENTS: u32 = 0x1941_A469;

/// 是否为 Segment 的直接子元素
///
/// 未知大小的 Cluster 在遇到这些元素时结束.
pub fn is_segment_level(id: u32) -> bool {
    matches!(
        id,
        CLUSTER | SEGMENT_INFO | TRACKS | CUES | SEEK_HEAD | TAGS | CHAPTERS | ATTACHMENTS
    )
}
