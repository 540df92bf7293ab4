//! 压缩数据包 (Packet).
//!
//! 解封装器按解析顺序产生数据包, 调度器按相同顺序恰好消费一次.

use bytes::Bytes;
use liu_core::TrackKind;

/// 压缩数据包
#[derive(Debug, Clone)]
pub struct Packet {
    /// 所属轨道
    pub track: TrackKind,
    /// 压缩数据
    pub data: Bytes,
    /// 显示时间戳 (毫秒)
    pub timestamp_ms: i64,
    /// 是否为关键帧
    pub is_keyframe: bool,
    /// 同一轨道内的产生序号, 从 0 开始
    pub sequence: u64,
}

impl Packet {
    /// 从数据创建数据包
    pub fn new(track: TrackKind, data: impl Into<Bytes>) -> Self {
        Self {
            track,
            data: data.into(),
            timestamp_ms: 0,
            is_keyframe: false,
            sequence: 0,
        }
    }

    /// 数据大小 (字节)
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
