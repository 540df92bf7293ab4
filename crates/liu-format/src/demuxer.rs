//! 推模式解封装器 trait 定义.
//!
//! 与拉模式不同, 解封装器不持有输入. 调用方通过 [`Demuxer::receive_input`]
//! 喂入字节块, 再反复调用 [`Demuxer::process`] 推进解析.
//! 解析出的数据包按音频/视频分别排队, 由调用方逐个取出.

use bytes::Bytes;
use liu_codec::{Packet, VideoFormat};
use liu_core::LiuResult;

/// 容器元数据
///
/// 在 [`Demuxer::metadata_loaded`] 返回 `true` 之后可用.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerMetadata {
    /// 文档类型 (如 "webm", "matroska")
    pub doc_type: String,
    /// 视频轨道的容器编解码器标识 (如 "V_VP9")
    pub video_codec: Option<String>,
    /// 视频格式
    pub video_format: Option<VideoFormat>,
    /// 音频轨道的容器编解码器标识 (如 "A_OPUS")
    pub audio_codec: Option<String>,
    /// 音频采样率
    pub audio_sample_rate: Option<u32>,
    /// 音频声道数
    pub audio_channels: Option<u32>,
    /// 时长 (秒)
    pub duration_s: Option<f64>,
}

impl ContainerMetadata {
    /// 是否包含视频轨道
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    /// 是否包含音频轨道
    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }
}

/// 推模式解封装器 trait
pub trait Demuxer: Send {
    /// 解封装器名称
    fn name(&self) -> &str;

    /// 接收一个输入块 (所有权转移给解封装器)
    fn receive_input(&mut self, chunk: Bytes);

    /// 执行一步增量解析
    ///
    /// 返回 `true` 表示本步有进展 (产生了元数据或数据包), 调用方应再次调用;
    /// 返回 `false` 表示缓冲的数据不足以继续解析, 需要更多输入.
    fn process(&mut self) -> LiuResult<bool>;

    /// 容器元数据是否已解析完成
    fn metadata_loaded(&self) -> bool;

    /// 已解析的容器元数据
    fn metadata(&self) -> Option<&ContainerMetadata>;

    /// 是否有排队的音频包
    fn audio_ready(&self) -> bool;

    /// 是否有排队的视频包
    fn frame_ready(&self) -> bool;

    /// 取出下一个音频包
    fn dequeue_audio_packet(&mut self) -> Option<Packet>;

    /// 取出下一个视频包
    fn dequeue_video_packet(&mut self) -> Option<Packet>;

    /// 已消费 (解析或跳过) 的输入字节数
    fn parsed_bytes(&self) -> u64;

    /// 已接收但尚未消费的字节数
    fn buffered_bytes(&self) -> usize;
}
