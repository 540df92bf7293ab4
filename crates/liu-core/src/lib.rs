//! # liu-core
//!
//! Liu 流式解码框架核心库, 提供错误类型、轨道类型和 CRC 校验等基础设施.
//!
//! 其余 crate (codec/format/loader/pipeline) 都只依赖这里定义的错误类型,
//! 保证错误可以跨模块直接用 `?` 传播.

pub mod crc;
pub mod error;
pub mod media_type;

// 重导出常用类型
pub use error::{ErrorKind, LiuError, LiuResult};
pub use media_type::TrackKind;
