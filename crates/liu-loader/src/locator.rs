//! 资源地址解析.
//!
//! 资源地址 = 基础路径 + 文件名 + `?version=<版本>`.
//! 版本号是不透明字符串, 经过 URL 编码后作为查询参数追加, 用于区分缓存.

use liu_core::{LiuError, LiuResult};

/// 内联资源前缀
pub const DATA_SCHEME: &str = "data:";

/// 资源定位器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    /// 基础路径 (None 表示与当前位置相对)
    base: Option<String>,
    /// 版本标签
    version: String,
}

impl ResourceLocator {
    /// 创建定位器
    pub fn new(base: Option<String>, version: impl Into<String>) -> Self {
        Self {
            base,
            version: version.into(),
        }
    }

    /// 基础路径
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// 版本标签
    pub fn version(&self) -> &str {
        &self.version
    }

    /// 构造脚本/模块资源的地址
    pub fn url_for_script(&self, script_name: &str) -> LiuResult<String> {
        if script_name.is_empty() {
            return Err(LiuError::NoMapping("资源文件名为空".into()));
        }
        let prefix = match &self.base {
            Some(base) => format!("{}/", base.trim_end_matches('/')),
            None => String::new(),
        };
        Ok(format!(
            "{prefix}{script_name}?version={}",
            urlencoding::encode(&self.version)
        ))
    }

    /// 定位附属资源
    ///
    /// 内联 (`data:`) 引用原样返回, 其余按模块资源的规则解析.
    pub fn locate_file(&self, filename: &str) -> LiuResult<String> {
        if is_inline(filename) {
            return Ok(filename.to_string());
        }
        self.url_for_script(filename)
    }
}

/// 是否为内联资源引用
pub fn is_inline(reference: &str) -> bool {
    reference.starts_with(DATA_SCHEME)
}
