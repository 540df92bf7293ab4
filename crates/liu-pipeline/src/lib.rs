//! # liu-pipeline
//!
//! 流式解码调度: 把输入源、解封装器、解码器和性能统计串成一条流水线.
//!
//! ```text
//! InputSource ─chunk→ Demuxer ─packet→ VideoDecoder ─frame→ MetricsSink
//!                        ↑                  ↑
//!                  PipelineOrchestrator (唯一驱动者)
//! ```
//!
//! - [`PipelineOrchestrator`]: 状态机 + 单步调度, 保证视频包按容器顺序逐个解码
//! - [`CodecResolver`]: 容器编解码器标识 → 模块 → 解码器工厂 → 解码器实例
//! - [`MetricsSink`]: 吞吐量检查点 / 每帧校验和

pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod resolver;
pub mod state;

// 重导出常用类型
pub use config::{DecoderSet, MetricsMode, PipelineConfig};
pub use metrics::{
    Clock, CollectingReporter, ManualClock, MetricsSink, Report, ReportSink, StdoutReporter,
    SystemClock,
};
pub use orchestrator::PipelineOrchestrator;
pub use resolver::CodecResolver;
pub use state::{PipelineState, PipelineSummary, Step};
