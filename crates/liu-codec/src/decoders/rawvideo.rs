//! RAW 视频解码器.
//!
//! 将未压缩的 I420/I444 像素数据从数据包拆分为三个平面.
//! 不做任何解压缩, 平面数据直接共享数据包的缓冲区.

use async_trait::async_trait;
use bytes::Bytes;
use liu_core::{LiuError, LiuResult};
use log::debug;

use crate::codec_id::VideoCodec;
use crate::decoder::{DecoderFactory, DecoderOptions, VideoDecoder};
use crate::frame::{Plane, VideoFormat, VideoFrameBuffer};

/// RAW 视频解码器工厂
pub struct RawVideoDecoderFactory;

#[async_trait]
impl DecoderFactory for RawVideoDecoderFactory {
    fn name(&self) -> &str {
        "rawvideo"
    }

    async fn create(&self, options: DecoderOptions) -> LiuResult<Box<dyn VideoDecoder>> {
        debug!(
            "创建 rawvideo 解码器: 模块={}, {}x{}",
            options.module.id, options.format.width, options.format.height,
        );
        Ok(Box::new(RawVideoDecoder::new(options.format)))
    }
}

/// RAW 视频解码器
pub struct RawVideoDecoder {
    /// 视频格式
    format: VideoFormat,
    /// 预计算: 每帧总字节数
    frame_size: usize,
    /// 预计算: 亮度平面字节数
    luma_size: usize,
    /// 预计算: 单个色度平面的 (宽, 高)
    chroma_dims: (usize, usize),
    /// 最近一次解码成功的帧
    output_frame: Option<VideoFrameBuffer>,
    /// 是否已初始化
    initialized: bool,
}

impl RawVideoDecoder {
    /// 按视频格式创建解码器
    pub fn new(format: VideoFormat) -> Self {
        let (cw, ch) = format.chroma.chroma_size(format.width, format.height);
        Self {
            format,
            frame_size: format.frame_size(),
            luma_size: format.width as usize * format.height as usize,
            chroma_dims: (cw as usize, ch as usize),
            output_frame: None,
            initialized: false,
        }
    }
}

#[async_trait]
impl VideoDecoder for RawVideoDecoder {
    fn codec(&self) -> VideoCodec {
        VideoCodec::Raw
    }

    fn name(&self) -> &str {
        "rawvideo"
    }

    async fn init(&mut self) -> LiuResult<()> {
        if self.format.width == 0 || self.format.height == 0 {
            return Err(LiuError::InvalidArgument("宽度和高度不能为 0".into()));
        }
        self.initialized = true;
        debug!(
            "初始化 rawvideo 解码器: {}x{}, 格式={:?}, 帧大小={}",
            self.format.width, self.format.height, self.format.chroma, self.frame_size,
        );
        Ok(())
    }

    async fn process_frame(&mut self, payload: Bytes) -> LiuResult<()> {
        if !self.initialized {
            return Err(LiuError::Codec("解码器未初始化, 请先调用 init()".into()));
        }
        // 失败的帧不保留上一帧的结果
        self.output_frame = None;

        if payload.len() != self.frame_size {
            return Err(LiuError::InvalidData(format!(
                "数据大小 {} 与预期帧大小 {} 不匹配",
                payload.len(),
                self.frame_size,
            )));
        }

        let (cw, ch) = self.chroma_dims;
        let chroma_size = cw * ch;
        let y_end = self.luma_size;
        let u_end = y_end + chroma_size;

        self.output_frame = Some(VideoFrameBuffer {
            format: self.format,
            y: Plane {
                bytes: payload.slice(..y_end),
                stride: self.format.width as usize,
                height: self.format.height as usize,
            },
            u: Plane {
                bytes: payload.slice(y_end..u_end),
                stride: cw,
                height: ch,
            },
            v: Plane {
                bytes: payload.slice(u_end..),
                stride: cw,
                height: ch,
            },
        });
        Ok(())
    }

    fn frame_buffer(&self) -> Option<&VideoFrameBuffer> {
        self.output_frame.as_ref()
    }
}
