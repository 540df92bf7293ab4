//! 资源获取后端.
//!
//! 实现 [`ResourceFetcher`] 以支持不同的资源来源 (本地目录、HTTP、内存).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use liu_core::{LiuError, LiuResult};
use log::debug;

/// 资源获取 trait
///
/// 获取失败一律返回 [`LiuError::Load`].
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// 获取指定地址的资源内容
    async fn fetch(&self, url: &str) -> LiuResult<Bytes>;
}

/// 去掉地址中的查询参数
fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

/// 本地目录后端
///
/// 相对地址基于 `root` 解析, 查询参数 (版本号) 会被忽略.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    /// 以指定目录为根创建
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve_path(&self, url: &str) -> PathBuf {
        let path = strip_query(url);
        let path = path.strip_prefix("file://").unwrap_or(path);
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl ResourceFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> LiuResult<Bytes> {
        let path = self.resolve_path(url);
        debug!("读取模块资源: {}", path.display());
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| LiuError::load(url, e))?;
        Ok(Bytes::from(data))
    }
}

/// HTTP/HTTPS 后端
///
/// ureq 是阻塞客户端, 请求在 tokio 的阻塞线程池上执行.
#[cfg(feature = "http")]
pub struct HttpFetcher;

#[cfg(feature = "http")]
#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> LiuResult<Bytes> {
        log::info!("正在下载: {}", url);
        let target = url.to_string();
        let result = tokio::task::spawn_blocking(move || {
            let mut response = ureq::get(&target).call()?;
            response.body_mut().read_to_vec()
        })
        .await
        .map_err(|e| LiuError::Internal(format!("下载任务异常退出: {e}")))?;
        let data = result.map_err(|e| LiuError::load(url, e))?;
        Ok(Bytes::from(data))
    }
}

/// 内存后端
///
/// 按完整地址 (含版本参数) 查找资源, 并记录每一次请求.
#[derive(Default)]
pub struct MemoryFetcher {
    resources: Mutex<HashMap<String, Bytes>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    /// 创建空后端
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个资源
    pub fn insert(&self, url: impl Into<String>, data: impl Into<Bytes>) {
        if let Ok(mut resources) = self.resources.lock() {
            resources.insert(url.into(), data.into());
        }
    }

    /// 已收到的请求 (按顺序)
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> LiuResult<Bytes> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        let resources = self
            .resources
            .lock()
            .map_err(|_| LiuError::Internal("资源表锁已中毒".into()))?;
        resources
            .get(url)
            .cloned()
            .ok_or_else(|| LiuError::load(url, "资源不存在"))
    }
}
