//! # liu-codec
//!
//! 编解码器边界: 编解码器标识、压缩数据包、解码帧缓冲, 以及
//! 异步的 [`VideoDecoder`] / [`DecoderFactory`] 抽象.
//!
//! VP8/VP9/AV1 等解码引擎由外部实现并注册到 [`DecoderRegistry`];
//! 本 crate 只内置未压缩 I420 视频的 RAW 解码器.

pub mod codec_id;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod packet;
pub mod registry;

// 重导出常用类型
pub use codec_id::VideoCodec;
pub use decoder::{DecoderFactory, DecoderOptions, VideoDecoder};
pub use frame::{ChromaFormat, Plane, VideoFormat, VideoFrameBuffer};
pub use packet::Packet;
pub use registry::DecoderRegistry;

/// 注册所有内置解码器
pub fn register_all(registry: &mut DecoderRegistry) {
    decoders::register_all_decoders(registry);
}
