//! 编解码器解析.
//!
//! 容器编解码器标识 → [`VideoCodec`] → 按 [`DecoderSet`] 选择模块 →
//! 加载器获取模块 → 注册表提供工厂 → 工厂创建解码器实例.

use std::sync::Arc;

use liu_codec::{DecoderOptions, DecoderRegistry, VideoCodec, VideoDecoder, VideoFormat};
use liu_core::LiuResult;
use liu_format::{Demuxer, create_demuxer};
use liu_loader::{Loader, ModuleHandle, ModuleId};
use log::{debug, info};

use crate::config::DecoderSet;

/// 编解码器解析器
pub struct CodecResolver {
    loader: Arc<Loader>,
    registry: Arc<DecoderRegistry>,
    decoder_set: DecoderSet,
}

impl CodecResolver {
    /// 创建解析器
    pub fn new(
        loader: Arc<Loader>,
        registry: Arc<DecoderRegistry>,
        decoder_set: DecoderSet,
    ) -> Self {
        Self {
            loader,
            registry,
            decoder_set,
        }
    }

    /// 模块加载器
    pub fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    /// 解码器变体
    pub fn decoder_set(&self) -> DecoderSet {
        self.decoder_set
    }

    /// 编解码器对应的解码器模块
    pub fn module_for(&self, codec: VideoCodec) -> ModuleId {
        self.decoder_set.module_for(codec)
    }

    /// 加载编解码器对应的解码器模块
    ///
    /// 同一编解码器重复解析返回同一个缓存句柄.
    pub async fn resolve_module(&self, codec: VideoCodec) -> LiuResult<Arc<ModuleHandle>> {
        self.loader.resolve(self.module_for(codec)).await
    }

    /// 按容器编解码器标识创建解码器
    ///
    /// - 未知标识或模块没有注册工厂: [`liu_core::LiuError::NoMapping`]
    /// - 模块获取失败: [`liu_core::LiuError::Load`]
    pub async fn create_decoder(
        &self,
        container_codec: &str,
        format: VideoFormat,
    ) -> LiuResult<Box<dyn VideoDecoder>> {
        let codec = VideoCodec::from_container_id(container_codec)?;
        let module = self.resolve_module(codec).await?;
        let factory = self.registry.factory(module.id)?;
        info!(
            "创建解码器: {container_codec} → {} ({}), {}x{}",
            module.id,
            factory.name(),
            format.width,
            format.height
        );
        factory
            .create(DecoderOptions {
                module,
                format,
                locator: self.loader.locator().clone(),
            })
            .await
    }

    /// 加载并创建解封装器
    pub async fn create_demuxer(&self) -> LiuResult<Box<dyn Demuxer>> {
        let module = self.loader.resolve(ModuleId::DemuxerWebm).await?;
        debug!("创建解封装器: {}", module.id);
        create_demuxer(module.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use liu_core::ErrorKind;
    use liu_loader::{MemoryFetcher, ModuleTable, ResourceLocator};

    fn make_resolver(fetcher: Arc<MemoryFetcher>, decoder_set: DecoderSet) -> CodecResolver {
        let loader = Loader::new(
            ModuleTable::builtin(),
            ResourceLocator::new(None, "2"),
            fetcher,
        );
        let mut registry = DecoderRegistry::new();
        liu_codec::register_all(&mut registry);
        CodecResolver::new(Arc::new(loader), Arc::new(registry), decoder_set)
    }

    #[tokio::test]
    async fn test_创建_raw_解码器() {
        let resolver = make_resolver(Arc::new(MemoryFetcher::new()), DecoderSet::Scalar);
        let decoder = resolver
            .create_decoder("V_UNCOMPRESSED", VideoFormat::new(2, 2))
            .await
            .unwrap();
        assert_eq!(decoder.codec(), VideoCodec::Raw);
    }

    #[tokio::test]
    async fn test_未知编解码器() {
        let resolver = make_resolver(Arc::new(MemoryFetcher::new()), DecoderSet::Scalar);
        let err = resolver
            .create_decoder("V_THEORA", VideoFormat::new(2, 2))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownIdentifier);
    }

    #[tokio::test]
    async fn test_模块已加载但没有注册工厂() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert("liu-decoder-video-vp9-simd.wasm?version=2", Bytes::from_static(b"x"));
        let resolver = make_resolver(Arc::clone(&fetcher), DecoderSet::Simd);
        let err = resolver
            .create_decoder("V_VP9", VideoFormat::new(2, 2))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownIdentifier);
        assert_eq!(fetcher.requests(), vec!["liu-decoder-video-vp9-simd.wasm?version=2"]);
    }

    #[tokio::test]
    async fn test_模块获取失败() {
        let resolver = make_resolver(Arc::new(MemoryFetcher::new()), DecoderSet::Scalar);
        let err = resolver
            .create_decoder("V_AV1", VideoFormat::new(2, 2))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::LoadFailure);
    }

    #[tokio::test]
    async fn test_重复解析返回同一模块() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert("liu-decoder-video-vp8.wasm?version=2", Bytes::from_static(b"vp8"));
        let resolver = make_resolver(Arc::clone(&fetcher), DecoderSet::Scalar);
        let a = resolver.resolve_module(VideoCodec::Vp8).await.unwrap();
        let b = resolver.resolve_module(VideoCodec::Vp8).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_创建解封装器() {
        let resolver = make_resolver(Arc::new(MemoryFetcher::new()), DecoderSet::Scalar);
        let demuxer = resolver.create_demuxer().await.unwrap();
        assert_eq!(demuxer.name(), "webm");
    }
}
