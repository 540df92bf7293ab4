//! 解码性能统计.
//!
//! [`MetricsSink`] 在每帧解码成功后被调用一次, 按 [`MetricsMode`] 产生报告:
//! - 吞吐量模式: 每 N 帧输出一次检查点帧率, 结束时输出平均帧率
//! - 校验和模式: 每帧输出亮度平面的 CRC-32, 不做吞吐量统计
//!
//! 报告交给 [`ReportSink`], 时间来自 [`Clock`], 两者都可替换以便测试.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use liu_codec::VideoFrameBuffer;
use liu_core::crc::crc32;
use log::debug;

use crate::config::{MetricsMode, PipelineConfig};

/// 单调时钟
pub trait Clock: Send {
    /// 自时钟原点起经过的时间
    fn elapsed(&self) -> Duration;
}

/// 系统单调时钟
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// 以当前时刻为原点创建时钟
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// 手动推进的时钟 (测试用)
///
/// 克隆体共享同一时间.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    /// 创建时间为 0 的时钟
    pub fn new() -> Self {
        Self::default()
    }

    /// 向前推进
    pub fn advance(&self, by: Duration) {
        self.micros.fetch_add(by.as_micros() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::Relaxed))
    }
}

/// 统计报告
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// 检查点: 上一检查点以来的帧率
    Checkpoint {
        /// 累计帧数
        frames: u64,
        /// 帧率
        fps: f64,
    },
    /// 全程平均帧率
    Average {
        /// 总帧数
        frames: u64,
        /// 帧率
        fps: f64,
    },
    /// 单帧校验和
    Checksum {
        /// 帧序号 (从 1 开始)
        frame: u64,
        /// 亮度平面的 CRC-32
        crc: u32,
    },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkpoint { fps, .. } => write!(f, "{fps} fps decoding"),
            Self::Average { fps, .. } => write!(f, "{fps} fps decoding average"),
            Self::Checksum { crc, .. } => write!(f, "{crc}"),
        }
    }
}

/// 报告输出目标
pub trait ReportSink: Send {
    /// 输出一条报告
    fn report(&mut self, report: &Report);
}

/// 输出到标准输出, 每条报告一行
pub struct StdoutReporter;

impl ReportSink for StdoutReporter {
    fn report(&mut self, report: &Report) {
        println!("{report}");
    }
}

/// 收集报告 (测试用)
///
/// 克隆体共享同一报告列表.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl CollectingReporter {
    /// 创建空的收集器
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集的报告
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

impl ReportSink for CollectingReporter {
    fn report(&mut self, report: &Report) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report.clone());
        }
    }
}

/// 帧数 / 秒数, 时间为 0 时帧率为 0
fn frames_per_second(frames: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { frames as f64 / secs } else { 0.0 }
}

/// 性能统计
pub struct MetricsSink {
    mode: MetricsMode,
    checkpoint_interval: u64,
    clock: Box<dyn Clock>,
    reporter: Box<dyn ReportSink>,
    /// 成功解码的帧数
    frames: u64,
    /// 统计起点
    start: Duration,
    /// 上一检查点的时间
    last_checkpoint: Duration,
    /// 上一检查点的帧数
    last_frames: u64,
    /// 是否已结束
    finished: bool,
}

impl MetricsSink {
    /// 创建统计器, 第一个统计窗口从此刻开始
    pub fn new(
        mode: MetricsMode,
        checkpoint_interval: u64,
        clock: Box<dyn Clock>,
        reporter: Box<dyn ReportSink>,
    ) -> Self {
        let start = clock.elapsed();
        Self {
            mode,
            checkpoint_interval: checkpoint_interval.max(1),
            clock,
            reporter,
            frames: 0,
            start,
            last_checkpoint: start,
            last_frames: 0,
            finished: false,
        }
    }

    /// 按调度器配置创建统计器
    pub fn from_config(
        config: &PipelineConfig,
        clock: Box<dyn Clock>,
        reporter: Box<dyn ReportSink>,
    ) -> Self {
        Self::new(
            config.metrics_mode,
            config.checkpoint_interval,
            clock,
            reporter,
        )
    }

    /// 统计模式
    pub fn mode(&self) -> MetricsMode {
        self.mode
    }

    /// 已统计的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 记录一帧成功解码的帧
    pub fn on_frame(&mut self, frame: &VideoFrameBuffer) {
        self.frames += 1;
        match self.mode {
            MetricsMode::Checksum => {
                let crc = crc32(&frame.y.bytes);
                self.reporter.report(&Report::Checksum {
                    frame: self.frames,
                    crc,
                });
            }
            MetricsMode::Throughput => {
                if self.frames % self.checkpoint_interval != 0 {
                    return;
                }
                let now = self.clock.elapsed();
                let fps = frames_per_second(
                    self.frames - self.last_frames,
                    now.saturating_sub(self.last_checkpoint),
                );
                debug!("检查点: {} 帧, {fps:.2} fps", self.frames);
                self.reporter.report(&Report::Checkpoint {
                    frames: self.frames,
                    fps,
                });
                self.last_frames = self.frames;
                self.last_checkpoint = now;
            }
        }
    }

    /// 结束统计
    ///
    /// 吞吐量模式输出全程平均帧率并返回它; 校验和模式不输出, 返回 `None`.
    /// 重复调用不会再次输出.
    pub fn finish(&mut self) -> Option<f64> {
        if self.mode != MetricsMode::Throughput {
            self.finished = true;
            return None;
        }
        let elapsed = self.clock.elapsed().saturating_sub(self.start);
        let fps = frames_per_second(self.frames, elapsed);
        if !self.finished {
            self.reporter.report(&Report::Average {
                frames: self.frames,
                fps,
            });
            self.finished = true;
        }
        Some(fps)
    }
}
