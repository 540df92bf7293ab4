//! # Liu (流)
//!
//! 纯 Rust 实现的流式解封装/解码调度框架.
//!
//! 输入按块读取, 推模式解封装器增量解析, 元数据就绪后异步加载并初始化
//! 视频解码器, 之后按容器顺序逐帧解码, 同时统计解码吞吐量或每帧校验和.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use liu::pipeline::{PipelineConfig, StdoutReporter};
//!
//! # async fn demo() -> liu::core::LiuResult<()> {
//! let config = PipelineConfig::default();
//! let mut pipeline = liu::open_pipeline(config, "video.webm", Box::new(StdoutReporter)).await?;
//! let summary = pipeline.run().await?;
//! println!("解码 {} 帧", summary.frames_decoded);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `liu-core` | 错误类型、CRC-32、轨道类型 |
//! | `liu-codec` | 编解码器边界与内置 RAW 解码器 |
//! | `liu-format` | 分块输入与 WebM 增量解封装器 |
//! | `liu-loader` | 模块映射、资源寻址与获取 |
//! | `liu-pipeline` | 调度器、编解码器解析与性能统计 |

use std::path::Path;
use std::sync::Arc;

/// 核心类型与工具
pub use liu_core as core;

/// 编解码器边界
pub use liu_codec as codec;

/// 输入源与解封装器
pub use liu_format as format;

/// 模块加载与资源寻址
pub use liu_loader as loader;

/// 解码调度
pub use liu_pipeline as pipeline;

use liu_codec::DecoderRegistry;
use liu_core::LiuResult;
use liu_loader::{FileFetcher, Loader, ModuleTable, ResourceFetcher, ResourceLocator};
use liu_pipeline::{
    CodecResolver, MetricsSink, PipelineConfig, PipelineOrchestrator, ReportSink, SystemClock,
};

/// 获取 Liu 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解码器的注册表
pub fn default_decoder_registry() -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    liu_codec::register_all(&mut registry);
    registry
}

/// 按配置选择资源获取后端
///
/// `http://` / `https://` 基础路径使用 HTTP 后端 (需要 `http` 特性), 其余按本地文件读取.
pub fn default_fetcher(config: &PipelineConfig) -> Arc<dyn ResourceFetcher> {
    config
        .module_base
        .as_deref()
        .and_then(remote_fetcher)
        .unwrap_or_else(|| Arc::new(FileFetcher::new(".")))
}

#[cfg(feature = "http")]
fn remote_fetcher(base: &str) -> Option<Arc<dyn ResourceFetcher>> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Some(Arc::new(liu_loader::HttpFetcher))
    } else {
        None
    }
}

#[cfg(not(feature = "http"))]
fn remote_fetcher(_base: &str) -> Option<Arc<dyn ResourceFetcher>> {
    None
}

/// 按配置创建使用默认模块映射表的加载器
pub fn default_loader(config: &PipelineConfig) -> Loader {
    let locator = ResourceLocator::new(config.module_base.clone(), config.module_version.clone());
    Loader::new(ModuleTable::builtin(), locator, default_fetcher(config))
}

/// 按配置创建编解码器解析器
pub fn default_resolver(config: &PipelineConfig) -> CodecResolver {
    CodecResolver::new(
        Arc::new(default_loader(config)),
        Arc::new(default_decoder_registry()),
        config.decoder_set,
    )
}

/// 打开文件并创建使用默认组件的调度器
pub async fn open_pipeline(
    config: PipelineConfig,
    path: impl AsRef<Path>,
    reporter: Box<dyn ReportSink>,
) -> LiuResult<PipelineOrchestrator> {
    let resolver = default_resolver(&config);
    let metrics = MetricsSink::from_config(&config, Box::new(SystemClock::new()), reporter);
    PipelineOrchestrator::open(config, path, resolver, metrics).await
}
