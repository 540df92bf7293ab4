//! # liu-loader
//!
//! 模块加载层: 把模块标识解析为可执行单元的资源, 并负责资源寻址.
//!
//! - 每个模块由稳定的 [`ModuleId`] 标识, 经 [`ModuleTable`] 映射到资源文件名或内联资源
//! - 资源地址 = 基础路径 + 文件名 + `?version=<版本>`, 版本号用于区分缓存
//! - 内联 (`data:`) 资源不经过地址解析, 直接在本地解码
//! - [`Loader::resolve`] 对同一模块幂等, 第二次解析直接返回缓存句柄
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use liu_loader::{FileFetcher, Loader, ModuleId, ModuleTable, ResourceLocator};
//!
//! # async fn demo() -> liu_core::LiuResult<()> {
//! let locator = ResourceLocator::new(Some("modules".into()), "1.0.0");
//! let loader = Loader::new(ModuleTable::builtin(), locator, Arc::new(FileFetcher::new(".")));
//! let handle = loader.resolve(ModuleId::DemuxerWebm).await?;
//! println!("已加载 {} ({} 字节)", handle.id, handle.payload.len());
//! # Ok(())
//! # }
//! ```

pub mod data_uri;
pub mod fetch;
pub mod loader;
pub mod locator;
pub mod module_id;

// 重导出常用类型
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{FileFetcher, MemoryFetcher, ResourceFetcher};
pub use loader::{Loader, ModuleHandle};
pub use locator::ResourceLocator;
pub use module_id::{ModuleId, ModuleSource, ModuleTable};
