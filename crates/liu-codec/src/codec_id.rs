//! 视频编解码器标识符.
//!
//! 封闭枚举: 容器中出现的编解码器字符串在这里一次性转换,
//! 未知编解码器在解析阶段就以 [`LiuError::NoMapping`] 失败.

use std::fmt;
use std::str::FromStr;

use liu_core::LiuError;

/// 视频编解码器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// VP8
    Vp8,
    /// VP9
    Vp9,
    /// AV1 (Alliance for Open Media)
    Av1,
    /// 未压缩 I420 视频
    Raw,
}

impl VideoCodec {
    /// 获取编解码器的简短名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Raw => "rawvideo",
        }
    }

    /// 从容器编解码器标识解析
    ///
    /// 同时接受 Matroska CodecID (`V_VP9`) 和简短名称 (`vp9`).
    pub fn from_container_id(codec: &str) -> Result<Self, LiuError> {
        match codec {
            "V_VP8" | "vp8" => Ok(Self::Vp8),
            "V_VP9" | "vp9" => Ok(Self::Vp9),
            "V_AV1" | "av1" => Ok(Self::Av1),
            "V_UNCOMPRESSED" | "rawvideo" => Ok(Self::Raw),
            _ => Err(LiuError::NoMapping(format!("未知视频编解码器 {codec}"))),
        }
    }
}

impl FromStr for VideoCodec {
    type Err = LiuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_container_id(s)
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
