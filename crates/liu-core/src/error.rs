//! 统一错误类型定义.
//!
//! 所有 Liu crate 共用的错误类型, 支持跨模块传播.

use thiserror::Error;

/// Liu 框架统一错误类型
#[derive(Debug, Error)]
pub enum LiuError {
    /// 标识符没有对应的资源映射 (未知编解码器/模块)
    #[error("没有映射: {0}")]
    NoMapping(String),

    /// 资源映射存在, 但获取失败
    #[error("加载失败: {url}: {reason}")]
    Load {
        /// 请求的资源地址
        url: String,
        /// 失败原因
        reason: String,
    },

    /// 容器数据损坏, 解封装器无法继续推进
    #[error("容器格式损坏: {0}")]
    MalformedContainer(String),

    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 编解码器错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// 容器格式错误
    #[error("格式错误: {0}")]
    Format(String),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误分类
///
/// 调度器只关心三种可识别的失败, 其余统一归为 `Other`.
/// 单帧解码失败不是错误, 由调度器内部计数.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 未知标识符 (编解码器/模块没有映射)
    UnknownIdentifier,
    /// 资源加载失败
    LoadFailure,
    /// 容器损坏, 无法推进
    MalformedContainer,
    /// 其他错误
    Other,
}

impl LiuError {
    /// 获取错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoMapping(_) => ErrorKind::UnknownIdentifier,
            Self::Load { .. } => ErrorKind::LoadFailure,
            Self::MalformedContainer(_) => ErrorKind::MalformedContainer,
            _ => ErrorKind::Other,
        }
    }

    /// 构造加载错误
    pub fn load(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Liu 框架统一 Result 类型
pub type LiuResult<T> = Result<T, LiuError>;
