//! 轨道类型定义.

use std::fmt;

/// 数据包所属的轨道类型
///
/// 调度器只区分音频与视频两条队列, 其余轨道由解封装器直接丢弃.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// 音频轨道
    Audio,
    /// 视频轨道
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Audio => "音频",
            Self::Video => "视频",
        };
        write!(f, "{name}")
    }
}
