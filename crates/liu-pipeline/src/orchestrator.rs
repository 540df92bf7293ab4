//! 解码调度器.
//!
//! 调度器是整条流水线唯一的驱动者: 读取输入块、驱动解封装器、
//! 在元数据就绪后创建解码器, 并按容器顺序逐个分发视频包.
//!
//! 每次 [`PipelineOrchestrator::step`] 只执行一轮调度. 三个异步操作
//! (读取输入、创建并初始化解码器、解码一帧) 都在本轮内等待完成,
//! 因此任何时刻最多只有一个解码在进行, 视频包到达解码器的顺序与
//! 解封装器产生的顺序一致.

use std::path::Path;

use liu_codec::{VideoDecoder, VideoFormat};
use liu_core::{LiuError, LiuResult};
use liu_format::{Demuxer, InputSource};
use log::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::metrics::MetricsSink;
use crate::resolver::CodecResolver;
use crate::state::{PipelineState, PipelineSummary, Step};

/// 解封装器的可观察进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProgressMarker {
    parsed_bytes: u64,
    buffered_bytes: usize,
    metadata_loaded: bool,
    frame_ready: bool,
    audio_ready: bool,
    dequeued: u64,
}

/// 解码调度器
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    input: InputSource,
    demuxer: Box<dyn Demuxer>,
    resolver: CodecResolver,
    decoder: Option<Box<dyn VideoDecoder>>,
    metrics: MetricsSink,
    state: PipelineState,
    summary: PipelineSummary,
    /// 连续无进展的读取次数
    stalled_reads: u32,
    /// 连续无进展的解析次数
    idle_parses: u32,
    /// 上一次读取时的进度
    last_read_marker: Option<ProgressMarker>,
}

impl PipelineOrchestrator {
    /// 创建调度器
    pub fn new(
        config: PipelineConfig,
        input: InputSource,
        demuxer: Box<dyn Demuxer>,
        resolver: CodecResolver,
        metrics: MetricsSink,
    ) -> LiuResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            input,
            demuxer,
            resolver,
            decoder: None,
            metrics,
            state: PipelineState::AwaitingMetadata,
            summary: PipelineSummary::default(),
            stalled_reads: 0,
            idle_parses: 0,
            last_read_marker: None,
        })
    }

    /// 打开文件, 通过解析器加载解封装器并创建调度器
    pub async fn open(
        config: PipelineConfig,
        path: impl AsRef<Path>,
        resolver: CodecResolver,
        metrics: MetricsSink,
    ) -> LiuResult<Self> {
        config.validate()?;
        let input = InputSource::open_file(path, config.chunk_size).await?;
        let demuxer = resolver.create_demuxer().await?;
        Self::new(config, input, demuxer, resolver, metrics)
    }

    /// 当前状态
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// 当前的运行汇总
    pub fn summary(&self) -> &PipelineSummary {
        &self.summary
    }

    /// 调度器配置
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 解码器 (初始化完成后才存在, 结束时释放)
    pub fn decoder(&self) -> Option<&dyn VideoDecoder> {
        self.decoder.as_deref()
    }

    /// 解封装器
    pub fn demuxer(&self) -> &dyn Demuxer {
        self.demuxer.as_ref()
    }

    /// 运行到结束
    ///
    /// 每轮之间让出执行权. 出错时立即返回, 调度器不可再继续使用.
    pub async fn run(&mut self) -> LiuResult<PipelineSummary> {
        loop {
            if let Step::Finished(summary) = self.step().await? {
                return Ok(summary);
            }
            tokio::task::yield_now().await;
        }
    }

    /// 执行一轮调度
    pub async fn step(&mut self) -> LiuResult<Step> {
        if self.state == PipelineState::Done {
            return Ok(Step::Finished(self.summary.clone()));
        }
        self.summary.turns += 1;
        match self.state {
            PipelineState::AwaitingMetadata => self.await_metadata().await,
            PipelineState::AwaitingDecoderInit => self.init_decoder().await,
            PipelineState::SteadyState => self.decode_turn().await,
            PipelineState::Draining | PipelineState::Done => Ok(self.drain()),
        }
    }

    fn transition(&mut self, next: PipelineState) {
        info!("调度状态: {} → {}", self.state, next);
        self.state = next;
    }

    fn progress_marker(&self) -> ProgressMarker {
        ProgressMarker {
            parsed_bytes: self.demuxer.parsed_bytes(),
            buffered_bytes: self.demuxer.buffered_bytes(),
            metadata_loaded: self.demuxer.metadata_loaded(),
            frame_ready: self.demuxer.frame_ready(),
            audio_ready: self.demuxer.audio_ready(),
            dequeued: self.summary.video_packets + self.summary.audio_packets,
        }
    }

    async fn await_metadata(&mut self) -> LiuResult<Step> {
        if let Some(metadata) = self.demuxer.metadata() {
            info!(
                "容器元数据就绪: {}, 视频轨道={}, 音频轨道={}",
                metadata.doc_type,
                metadata.has_video(),
                metadata.has_audio()
            );
            self.transition(PipelineState::AwaitingDecoderInit);
            return Ok(Step::MetadataLoaded);
        }
        self.parse_or_read().await
    }

    async fn init_decoder(&mut self) -> LiuResult<Step> {
        // 解码器就绪之前只丢弃音频, 视频包留在队列中
        self.discard_audio();

        let metadata = self
            .demuxer
            .metadata()
            .ok_or_else(|| LiuError::Internal("元数据就绪但不可读".into()))?;
        if !metadata.has_video() {
            return Err(LiuError::Unsupported("容器中没有视频轨道".into()));
        }
        let codec = metadata.video_codec.clone().unwrap_or_default();
        let format = metadata.video_format.unwrap_or_else(|| {
            warn!("容器没有给出视频格式, 使用空格式");
            VideoFormat::default()
        });

        let mut decoder = self.resolver.create_decoder(&codec, format).await?;
        decoder.init().await?;
        info!("解码器 {} 初始化完成", decoder.name());
        self.decoder = Some(decoder);
        self.transition(PipelineState::SteadyState);
        Ok(Step::DecoderReady)
    }

    async fn decode_turn(&mut self) -> LiuResult<Step> {
        self.discard_audio();
        match self.demuxer.dequeue_video_packet() {
            Some(packet) => {
                self.summary.video_packets += 1;
                let sequence = packet.sequence;
                let ok = self.decode(packet.data, sequence).await?;
                Ok(Step::FrameDecoded { sequence, ok })
            }
            None => self.parse_or_read().await,
        }
    }

    /// 解码一个视频包, 单帧失败只计数不上报
    async fn decode(&mut self, payload: bytes::Bytes, sequence: u64) -> LiuResult<bool> {
        let decoder = self
            .decoder
            .as_mut()
            .ok_or_else(|| LiuError::Internal("解码器尚未创建".into()))?;

        let ok = match decoder.process_frame(payload).await {
            Ok(()) => match decoder.frame_buffer() {
                Some(frame) => {
                    self.metrics.on_frame(frame);
                    true
                }
                None => {
                    debug!("视频包 #{sequence} 解码后没有输出帧");
                    false
                }
            },
            Err(e) => {
                debug!("视频包 #{sequence} 解码失败: {e}");
                false
            }
        };

        if ok {
            self.summary.frames_decoded += 1;
        } else {
            self.summary.decode_failures += 1;
        }
        Ok(ok)
    }

    fn discard_audio(&mut self) {
        while self.demuxer.dequeue_audio_packet().is_some() {
            self.summary.audio_packets += 1;
        }
    }

    /// 解析一步; 解封装器需要更多数据时读取一块, 输入耗尽时结束
    async fn parse_or_read(&mut self) -> LiuResult<Step> {
        let before = self.progress_marker();
        if self.demuxer.process()? {
            if self.progress_marker() == before {
                self.idle_parses += 1;
                if self.idle_parses >= self.config.max_idle_parses {
                    return Err(LiuError::MalformedContainer(format!(
                        "解封装器连续 {} 次报告有进展但没有消费数据",
                        self.idle_parses
                    )));
                }
            } else {
                self.idle_parses = 0;
            }
            return Ok(Step::Parsed { more: true });
        }
        self.idle_parses = 0;

        if !self.input.is_eof() {
            return self.read_input().await;
        }

        if self.state == PipelineState::AwaitingMetadata {
            return Err(LiuError::MalformedContainer(
                "输入在元数据之前结束".into(),
            ));
        }
        if self.demuxer.frame_ready() || self.demuxer.audio_ready() {
            return Ok(Step::Parsed { more: false });
        }
        debug!(
            "输入耗尽: 共读取 {} 字节, 剩余未解析 {} 字节",
            self.summary.bytes_read,
            self.demuxer.buffered_bytes()
        );
        self.transition(PipelineState::Draining);
        Ok(Step::EndOfStream)
    }

    async fn read_input(&mut self) -> LiuResult<Step> {
        let marker = self.progress_marker();
        if self.last_read_marker == Some(marker) {
            self.stalled_reads += 1;
            if self.stalled_reads >= self.config.max_stalled_reads {
                return Err(LiuError::MalformedContainer(format!(
                    "连续 {} 次读取后解封装器仍无进展",
                    self.stalled_reads
                )));
            }
        } else {
            self.stalled_reads = 0;
        }
        self.last_read_marker = Some(marker);

        let chunk = self.input.read_chunk().await?;
        let bytes = chunk.len();
        self.summary.chunks_read += 1;
        self.summary.bytes_read += bytes as u64;
        if !chunk.is_empty() {
            self.demuxer.receive_input(chunk);
        }
        let eof = self.input.is_eof();
        debug!("读取 {bytes} 字节 (eof={eof})");
        Ok(Step::InputRead { bytes, eof })
    }

    fn drain(&mut self) -> Step {
        self.summary.average_fps = self.metrics.finish();
        // 解码器随运行结束释放
        self.decoder = None;
        self.transition(PipelineState::Done);
        info!(
            "解码结束: {} 帧成功, {} 帧失败, {} 个音频包, {} 轮调度",
            self.summary.frames_decoded,
            self.summary.decode_failures,
            self.summary.audio_packets,
            self.summary.turns
        );
        Step::Finished(self.summary.clone())
    }
}
