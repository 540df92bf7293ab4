//! 模块加载器.
//!
//! 把 [`ModuleId`] 解析为已获取的模块句柄. 同一模块只获取一次,
//! 之后的解析直接返回缓存中的同一个 `Arc<ModuleHandle>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use liu_core::{LiuError, LiuResult};
use log::{debug, info};

use crate::data_uri;
use crate::fetch::ResourceFetcher;
use crate::locator::{ResourceLocator, is_inline};
use crate::module_id::{ModuleId, ModuleSource, ModuleTable};

/// 已加载的模块
#[derive(Debug)]
pub struct ModuleHandle {
    /// 模块标识
    pub id: ModuleId,
    /// 实际获取的地址 (内联模块为 `data:` URI 本身)
    pub url: String,
    /// 模块内容
    pub payload: Bytes,
}

impl ModuleHandle {
    /// 是否为内联模块
    pub fn is_inline(&self) -> bool {
        is_inline(&self.url)
    }
}

/// 模块加载器
pub struct Loader {
    table: ModuleTable,
    locator: ResourceLocator,
    fetcher: Arc<dyn ResourceFetcher>,
    cache: Mutex<HashMap<ModuleId, Arc<ModuleHandle>>>,
}

impl Loader {
    /// 创建加载器
    pub fn new(
        table: ModuleTable,
        locator: ResourceLocator,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        Self {
            table,
            locator,
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 资源定位器
    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    /// 查询已缓存的模块
    pub fn cached(&self, id: ModuleId) -> Option<Arc<ModuleHandle>> {
        self.cache.lock().ok()?.get(&id).cloned()
    }

    /// 解析模块
    ///
    /// - 映射表中没有该模块: [`LiuError::NoMapping`]
    /// - 资源获取失败: [`LiuError::Load`]
    pub async fn resolve(&self, id: ModuleId) -> LiuResult<Arc<ModuleHandle>> {
        if let Some(handle) = self.cached(id) {
            debug!("模块 {id} 已加载, 直接复用");
            return Ok(handle);
        }

        let source = self
            .table
            .source(id)
            .ok_or_else(|| LiuError::NoMapping(format!("模块 {id} 没有资源映射")))?
            .clone();

        let (url, payload) = match source {
            ModuleSource::Inline(uri) => {
                let payload = data_uri::decode(&uri)
                    .map_err(|e| LiuError::load(&uri, e))?
                    .payload;
                (uri, payload)
            }
            ModuleSource::File(file) => {
                let url = self.locator.url_for_script(&file)?;
                info!("加载模块 {id}: {url}");
                let payload = self.fetcher.fetch(&url).await?;
                (url, payload)
            }
        };

        let handle = Arc::new(ModuleHandle { id, url, payload });
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| LiuError::Internal("模块缓存锁已中毒".into()))?;
        // 并发解析时以先写入者为准, 保证同一模块只有一个句柄
        Ok(Arc::clone(cache.entry(id).or_insert(handle)))
    }

    /// 按类名解析模块
    pub async fn resolve_name(&self, class_name: &str) -> LiuResult<Arc<ModuleHandle>> {
        let id: ModuleId = class_name.parse()?;
        self.resolve(id).await
    }

    /// 获取模块的附属资源 (如二进制载荷)
    ///
    /// 内联引用直接解码, 不经过地址解析和获取后端.
    pub async fn resolve_companion(&self, filename: &str) -> LiuResult<Bytes> {
        let url = self.locator.locate_file(filename)?;
        if is_inline(&url) {
            return Ok(data_uri::decode(&url)?.payload);
        }
        debug!("获取附属资源: {url}");
        self.fetcher.fetch(&url).await
    }
}
