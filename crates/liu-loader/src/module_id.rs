//! 模块标识与模块映射表.
//!
//! 每个可加载单元 (解封装器、各类视频解码器及其 SIMD 变体) 都有一个稳定的
//! 标识, 映射表把标识对应到资源文件名或内联资源.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use liu_core::LiuError;

/// 可加载模块标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleId {
    /// WebM/Matroska 解封装器
    DemuxerWebm,
    /// VP8 解码器
    DecoderVideoVp8,
    /// VP8 解码器 (SIMD 加速)
    DecoderVideoVp8Simd,
    /// VP9 解码器
    DecoderVideoVp9,
    /// VP9 解码器 (SIMD 加速)
    DecoderVideoVp9Simd,
    /// AV1 解码器
    DecoderVideoAv1,
    /// AV1 解码器 (SIMD 加速)
    DecoderVideoAv1Simd,
    /// 未压缩 I420 视频解码器
    DecoderVideoRaw,
}

impl ModuleId {
    /// 所有已知模块
    pub const ALL: [ModuleId; 8] = [
        Self::DemuxerWebm,
        Self::DecoderVideoVp8,
        Self::DecoderVideoVp8Simd,
        Self::DecoderVideoVp9,
        Self::DecoderVideoVp9Simd,
        Self::DecoderVideoAv1,
        Self::DecoderVideoAv1Simd,
        Self::DecoderVideoRaw,
    ];

    /// 模块的稳定类名
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DemuxerWebm => "LiuDemuxerWebM",
            Self::DecoderVideoVp8 => "LiuDecoderVideoVP8",
            Self::DecoderVideoVp8Simd => "LiuDecoderVideoVP8SIMD",
            Self::DecoderVideoVp9 => "LiuDecoderVideoVP9",
            Self::DecoderVideoVp9Simd => "LiuDecoderVideoVP9SIMD",
            Self::DecoderVideoAv1 => "LiuDecoderVideoAV1",
            Self::DecoderVideoAv1Simd => "LiuDecoderVideoAV1SIMD",
            Self::DecoderVideoRaw => "LiuDecoderVideoRaw",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ModuleId {
    type Err = LiuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| LiuError::NoMapping(format!("未知模块 {s}")))
    }
}

/// 模块资源来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    /// 资源文件名, 需要经过地址解析后获取
    File(String),
    /// 内联资源 (`data:` URI), 跳过地址解析
    Inline(String),
}

/// 模块映射表
#[derive(Debug, Clone)]
pub struct ModuleTable {
    entries: HashMap<ModuleId, ModuleSource>,
}

/// 内置解封装器的模块描述
const BUILTIN_WEBM: &str = "data:text/plain,liu-builtin%3Ademuxer-webm";
/// 内置 RAW 解码器的模块描述
const BUILTIN_RAW: &str = "data:text/plain,liu-builtin%3Adecoder-video-raw";

impl ModuleTable {
    /// 创建空表
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 默认映射表
    ///
    /// 内置的 WebM 解封装器和 RAW 解码器是内联模块, 其余解码器映射到资源文件.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(
            ModuleId::DemuxerWebm,
            ModuleSource::Inline(BUILTIN_WEBM.into()),
        );
        table.insert(
            ModuleId::DecoderVideoRaw,
            ModuleSource::Inline(BUILTIN_RAW.into()),
        );
        let files = [
            (ModuleId::DecoderVideoVp8, "liu-decoder-video-vp8.wasm"),
            (ModuleId::DecoderVideoVp8Simd, "liu-decoder-video-vp8-simd.wasm"),
            (ModuleId::DecoderVideoVp9, "liu-decoder-video-vp9.wasm"),
            (ModuleId::DecoderVideoVp9Simd, "liu-decoder-video-vp9-simd.wasm"),
            (ModuleId::DecoderVideoAv1, "liu-decoder-video-av1.wasm"),
            (ModuleId::DecoderVideoAv1Simd, "liu-decoder-video-av1-simd.wasm"),
        ];
        for (id, file) in files {
            table.insert(id, ModuleSource::File(file.into()));
        }
        table
    }

    /// 添加或替换映射
    pub fn insert(&mut self, id: ModuleId, source: ModuleSource) {
        self.entries.insert(id, source);
    }

    /// 移除映射
    pub fn remove(&mut self, id: ModuleId) -> Option<ModuleSource> {
        self.entries.remove(&id)
    }

    /// 查找模块来源
    pub fn source(&self, id: ModuleId) -> Option<&ModuleSource> {
        self.entries.get(&id)
    }
}

impl Default for ModuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_类名往返() {
        for id in ModuleId::ALL {
            assert_eq!(id.name().parse::<ModuleId>().unwrap(), id);
        }
    }

    #[test]
    fn test_未知类名返回无映射() {
        let err = "LiuDecoderVideoTheora".parse::<ModuleId>().unwrap_err();
        assert!(matches!(err, LiuError::NoMapping(_)));
    }

    #[test]
    fn test_默认表覆盖所有模块() {
        let table = ModuleTable::builtin();
        for id in ModuleId::ALL {
            assert!(table.source(id).is_some(), "{id} 缺少映射");
        }
        assert!(matches!(
            table.source(ModuleId::DemuxerWebm),
            Some(ModuleSource::Inline(_))
        ));
        assert_eq!(
            table.source(ModuleId::DecoderVideoVp9),
            Some(&ModuleSource::File("liu-decoder-video-vp9.wasm".into()))
        );
    }

    #[test]
    fn test_移除映射() {
        let mut table = ModuleTable::builtin();
        assert!(table.remove(ModuleId::DecoderVideoAv1).is_some());
        assert!(table.source(ModuleId::DecoderVideoAv1).is_none());
    }
}
