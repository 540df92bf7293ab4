//! liu-bench - WebM 解码性能测试工具
//!
//! 逐块读取 WebM 文件, 解码全部视频帧, 输出检查点帧率与平均帧率,
//! 或者 (`--checksum`) 输出每帧亮度平面的 CRC-32.

mod logging;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use liu::core::LiuResult;
use liu::pipeline::{DecoderSet, MetricsMode, PipelineConfig, PipelineSummary, StdoutReporter};

#[derive(Parser, Debug)]
#[command(name = "liu-bench", version, about = "WebM 视频解码性能测试")]
struct Cli {
    /// 要解码的 WebM 文件
    filename: Option<PathBuf>,

    /// 使用 SIMD 加速的解码器模块
    #[arg(long)]
    simd: bool,

    /// 输出每帧校验和而不是帧率
    #[arg(long)]
    checksum: bool,

    /// 每多少帧输出一次检查点帧率
    #[arg(long, value_name = "N")]
    checkpoint: Option<u64>,

    /// 每次读取的块大小 (字节)
    #[arg(long = "chunk-size", value_name = "N")]
    chunk_size: Option<usize>,

    /// 解码器模块的基础路径或 URL
    #[arg(long, value_name = "DIR")]
    base: Option<String>,

    /// JSON 配置文件, 命令行参数优先
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 日志级别 (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    // 参数不完整时直接退出, 不创建日志目录
    let Some(filename) = cli.filename.as_deref() else {
        eprintln!("请在命令行中指定要解码测速的 WebM 文件");
        process::exit(1);
    };

    if let Err(e) = logging::init("liu-bench", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("错误: {e:#}");
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("错误: 创建异步运行时失败: {e}");
            process::exit(1);
        }
    };

    match runtime.block_on(bench(config, filename)) {
        Ok(summary) => {
            info!(
                "完成: {} 帧, 失败 {} 帧, 读取 {} 字节",
                summary.frames_decoded, summary.decode_failures, summary.bytes_read
            );
        }
        Err(e) => {
            error!("解码 {} 失败: {e}", filename.display());
            eprintln!("错误: {e}");
            process::exit(1);
        }
    }
}

/// 合并配置文件与命令行参数
fn build_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
            PipelineConfig::from_json_str(&text)
                .with_context(|| format!("配置文件 {} 无效", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    if cli.simd {
        config.decoder_set = DecoderSet::Simd;
    }
    if cli.checksum {
        config.metrics_mode = MetricsMode::Checksum;
    }
    if let Some(interval) = cli.checkpoint {
        config.checkpoint_interval = interval;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(base) = &cli.base {
        config.module_base = Some(base.clone());
    }
    config.validate()?;
    Ok(config)
}

async fn bench(config: PipelineConfig, filename: &Path) -> LiuResult<PipelineSummary> {
    info!(
        "liu-bench {}: {} ({:?}, {:?})",
        liu::version(),
        filename.display(),
        config.decoder_set,
        config.metrics_mode
    );
    let mut pipeline = liu::open_pipeline(config, filename, Box::new(StdoutReporter)).await?;
    pipeline.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_命令行覆盖配置文件() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        std::fs::write(&path, r#"{"chunk_size": 1024, "checkpoint_interval": 10}"#).unwrap();

        let cli = Cli::parse_from([
            "liu-bench",
            "--simd",
            "--checksum",
            "--checkpoint",
            "48",
            "--config",
            path.to_str().unwrap(),
            "video.webm",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.decoder_set, DecoderSet::Simd);
        assert_eq!(config.metrics_mode, MetricsMode::Checksum);
        assert_eq!(config.checkpoint_interval, 48);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(cli.filename.as_deref(), Some(Path::new("video.webm")));
    }

    #[test]
    fn test_拒绝零块大小() {
        let cli = Cli::parse_from(["liu-bench", "--chunk-size", "0", "video.webm"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_无文件名() {
        let cli = Cli::parse_from(["liu-bench"]);
        assert!(cli.filename.is_none());
        let config = build_config(&cli).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
