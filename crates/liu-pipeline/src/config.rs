//! 调度器配置.
//!
//! 所有字段都有默认值, JSON 配置文件中只需写出要覆盖的字段.

use liu_codec::VideoCodec;
use liu_core::{LiuError, LiuResult};
use liu_format::DEFAULT_CHUNK_SIZE;
use liu_loader::ModuleId;
use serde::{Deserialize, Serialize};

/// 默认检查点间隔 (帧)
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 24;

/// 默认的最大连续无进展读取次数
pub const DEFAULT_MAX_STALLED_READS: u32 = 256;

/// 默认的最大连续无进展解析次数
pub const DEFAULT_MAX_IDLE_PARSES: u32 = 1024;

/// 性能统计模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsMode {
    /// 吞吐量: 定期输出检查点帧率, 结束时输出平均帧率
    #[default]
    Throughput,
    /// 校验和: 每帧输出亮度平面的 CRC-32
    Checksum,
}

/// 解码器变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderSet {
    /// 标量实现
    #[default]
    Scalar,
    /// SIMD 加速实现
    Simd,
}

impl DecoderSet {
    /// 编解码器在该变体下对应的解码器模块
    ///
    /// RAW 视频没有 SIMD 变体, 两种变体使用同一模块.
    pub const fn module_for(&self, codec: VideoCodec) -> ModuleId {
        match (self, codec) {
            (Self::Scalar, VideoCodec::Vp8) => ModuleId::DecoderVideoVp8,
            (Self::Scalar, VideoCodec::Vp9) => ModuleId::DecoderVideoVp9,
            (Self::Scalar, VideoCodec::Av1) => ModuleId::DecoderVideoAv1,
            (Self::Simd, VideoCodec::Vp8) => ModuleId::DecoderVideoVp8Simd,
            (Self::Simd, VideoCodec::Vp9) => ModuleId::DecoderVideoVp9Simd,
            (Self::Simd, VideoCodec::Av1) => ModuleId::DecoderVideoAv1Simd,
            (_, VideoCodec::Raw) => ModuleId::DecoderVideoRaw,
        }
    }
}

/// 调度器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 每次读取的块大小 (字节)
    pub chunk_size: usize,
    /// 吞吐量检查点间隔 (帧)
    pub checkpoint_interval: u64,
    /// 统计模式
    pub metrics_mode: MetricsMode,
    /// 解码器变体
    pub decoder_set: DecoderSet,
    /// 连续多少次读取后解封装器仍无进展即判定容器损坏
    pub max_stalled_reads: u32,
    /// 连续多少次解析报告有进展却没有消费数据即判定容器损坏
    pub max_idle_parses: u32,
    /// 模块资源基础路径
    pub module_base: Option<String>,
    /// 模块版本标签
    pub module_version: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            metrics_mode: MetricsMode::default(),
            decoder_set: DecoderSet::default(),
            max_stalled_reads: DEFAULT_MAX_STALLED_READS,
            max_idle_parses: DEFAULT_MAX_IDLE_PARSES,
            module_base: None,
            module_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl PipelineConfig {
    /// 从 JSON 文本解析并校验
    pub fn from_json_str(text: &str) -> LiuResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| LiuError::InvalidArgument(format!("配置解析失败: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> LiuResult<()> {
        let zero = [
            ("chunk_size", self.chunk_size == 0),
            ("checkpoint_interval", self.checkpoint_interval == 0),
            ("max_stalled_reads", self.max_stalled_reads == 0),
            ("max_idle_parses", self.max_idle_parses == 0),
        ];
        if let Some((name, _)) = zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(LiuError::InvalidArgument(format!("{name} 不能为 0")));
        }
        Ok(())
    }
}
