//! 解码器 trait 定义.
//!
//! 解码流程:
//! 1. [`DecoderFactory::create`] 异步创建解码器实例
//! 2. 调用一次 [`VideoDecoder::init`] 完成初始化
//! 3. 每个视频包调用一次 [`VideoDecoder::process_frame`], 上一次完成之前不会发起下一次
//! 4. 解码成功后, 通过 [`VideoDecoder::frame_buffer`] 借用解码结果

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use liu_core::LiuResult;
use liu_loader::{ModuleHandle, ResourceLocator};

use crate::codec_id::VideoCodec;
use crate::frame::{VideoFormat, VideoFrameBuffer};

/// 视频解码器 trait
#[async_trait]
pub trait VideoDecoder: Send {
    /// 获取解码器对应的编解码器
    fn codec(&self) -> VideoCodec;

    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 初始化解码器, 每个实例只调用一次
    async fn init(&mut self) -> LiuResult<()>;

    /// 解码一个压缩数据包
    ///
    /// 返回 `Err` 表示该包解码失败; 调用方会跳过它并继续下一个包.
    async fn process_frame(&mut self, payload: Bytes) -> LiuResult<()>;

    /// 最近一次成功解码的帧
    ///
    /// 借用只在下一次 `process_frame` 之前有效.
    fn frame_buffer(&self) -> Option<&VideoFrameBuffer>;
}

/// 创建解码器时的参数
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// 已加载的解码器模块
    pub module: Arc<ModuleHandle>,
    /// 容器给出的视频格式
    pub format: VideoFormat,
    /// 附属资源定位器
    pub locator: ResourceLocator,
}

/// 解码器工厂 trait
///
/// 每个工厂对应一个模块, 注册到 [`crate::DecoderRegistry`].
#[async_trait]
pub trait DecoderFactory: Send + Sync {
    /// 工厂名称
    fn name(&self) -> &str;

    /// 异步创建解码器实例
    async fn create(&self, options: DecoderOptions) -> LiuResult<Box<dyn VideoDecoder>>;
}
