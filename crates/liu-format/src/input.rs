//! 分块输入源.
//!
//! 每次读取一个固定容量的块. 读到的字节数少于块容量即视为流末尾,
//! 该标志一旦置位不再清除. 块的所有权随后交给解封装器.

use std::path::Path;

use bytes::{Bytes, BytesMut};
use liu_core::{LiuError, LiuResult};
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};

/// 默认块大小 (64 KB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// 分块输入源
pub struct InputSource {
    /// 底层异步读取器
    reader: Box<dyn AsyncRead + Send + Unpin>,
    /// 块容量
    chunk_size: usize,
    /// 已读取的总字节数
    position: u64,
    /// 是否已到达流末尾
    eof: bool,
}

impl InputSource {
    /// 从任意异步读取器创建
    pub fn new(reader: Box<dyn AsyncRead + Send + Unpin>, chunk_size: usize) -> LiuResult<Self> {
        if chunk_size == 0 {
            return Err(LiuError::InvalidArgument("块大小不能为 0".into()));
        }
        Ok(Self {
            reader,
            chunk_size,
            position: 0,
            eof: false,
        })
    }

    /// 从文件路径打开
    pub async fn open_file(path: impl AsRef<Path>, chunk_size: usize) -> LiuResult<Self> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        debug!("打开输入文件: {}", path.as_ref().display());
        Self::new(Box::new(file), chunk_size)
    }

    /// 从内存数据创建
    pub fn from_bytes(data: impl Into<Bytes>, chunk_size: usize) -> LiuResult<Self> {
        let cursor = std::io::Cursor::new(data.into());
        Self::new(Box::new(cursor), chunk_size)
    }

    /// 读取一个块
    ///
    /// 底层读取器单次返回的字节可能少于请求值, 这里会持续读取直到块满或读到 0 字节.
    /// 块未满即置位流末尾标志. 流末尾之后再调用只返回空块.
    pub async fn read_chunk(&mut self) -> LiuResult<Bytes> {
        if self.eof {
            return Ok(Bytes::new());
        }

        let mut buf = BytesMut::zeroed(self.chunk_size);
        let mut filled = 0;
        while filled < self.chunk_size {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        self.position += filled as u64;

        if filled < self.chunk_size {
            self.eof = true;
            debug!("输入源到达末尾: 共 {} 字节", self.position);
        }
        Ok(buf.freeze())
    }

    /// 是否已到达流末尾
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// 已读取的总字节数
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 块容量
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}
