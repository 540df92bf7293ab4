//! 内置解封装器实现.

pub mod webm;

use liu_core::{LiuError, LiuResult};
use liu_loader::ModuleId;

use crate::demuxer::Demuxer;

/// 按模块标识创建解封装器
pub fn create_demuxer(module: ModuleId) -> LiuResult<Box<dyn Demuxer>> {
    match module {
        ModuleId::DemuxerWebm => Ok(Box::new(webm::WebmDemuxer::new())),
        other => Err(LiuError::Unsupported(format!("模块 {other} 不是解封装器"))),
    }
}
