//! 调度状态与单步结果.

use std::fmt;

/// 调度状态
///
/// ```text
/// AwaitingMetadata → AwaitingDecoderInit → SteadyState → Draining → Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// 等待容器元数据
    AwaitingMetadata,
    /// 元数据已就绪, 正在创建并初始化解码器
    AwaitingDecoderInit,
    /// 正常解码
    SteadyState,
    /// 输入已耗尽, 收尾统计
    Draining,
    /// 已结束
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingMetadata => "等待元数据",
            Self::AwaitingDecoderInit => "等待解码器初始化",
            Self::SteadyState => "解码中",
            Self::Draining => "收尾",
            Self::Done => "已结束",
        };
        f.write_str(name)
    }
}

/// 运行汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSummary {
    /// 成功解码的帧数
    pub frames_decoded: u64,
    /// 解码失败的帧数
    pub decode_failures: u64,
    /// 分发给解码器的视频包数
    pub video_packets: u64,
    /// 丢弃的音频包数
    pub audio_packets: u64,
    /// 读取的块数
    pub chunks_read: u64,
    /// 读取的总字节数
    pub bytes_read: u64,
    /// 执行的调度轮次
    pub turns: u64,
    /// 平均帧率 (仅吞吐量模式)
    pub average_fps: Option<f64>,
}

/// 一轮调度的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// 读取了一个输入块
    InputRead {
        /// 块大小
        bytes: usize,
        /// 读取后是否到达流末尾
        eof: bool,
    },
    /// 执行了一次解析, `more` 为解封装器的返回值
    Parsed {
        /// 是否还有可继续解析的数据
        more: bool,
    },
    /// 容器元数据就绪
    MetadataLoaded,
    /// 解码器已创建并初始化
    DecoderReady,
    /// 一个视频包解码完成
    FrameDecoded {
        /// 视频包序号
        sequence: u64,
        /// 是否解码成功
        ok: bool,
    },
    /// 输入耗尽且没有待处理的数据包
    EndOfStream,
    /// 运行结束
    Finished(PipelineSummary),
}
