//! # liu-format
//!
//! 输入源与推模式解封装器.
//!
//! - [`InputSource`]: 按固定大小分块读取字节流, 短读即流末尾 (粘性标志)
//! - [`Demuxer`]: 推模式解封装接口, 调用方喂入字节块, 再反复调用 `process()` 增量解析
//! - [`demuxers::webm::WebmDemuxer`]: 内置的 WebM/Matroska 增量解封装器

pub mod demuxer;
pub mod demuxers;
pub mod input;

// 重导出常用类型
pub use demuxer::{ContainerMetadata, Demuxer};
pub use demuxers::create_demuxer;
pub use input::{DEFAULT_CHUNK_SIZE, InputSource};
