//! 内置解码器.

pub mod rawvideo;

use std::sync::Arc;

use liu_loader::ModuleId;

use crate::registry::DecoderRegistry;

/// 注册所有内置解码器
pub fn register_all_decoders(registry: &mut DecoderRegistry) {
    registry.register(
        ModuleId::DecoderVideoRaw,
        Arc::new(rawvideo::RawVideoDecoderFactory),
    );
}
