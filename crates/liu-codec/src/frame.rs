//! 视频格式描述与解码帧缓冲.

use bytes::Bytes;

/// 色度采样格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChromaFormat {
    /// 4:2:0 平面 YUV
    #[default]
    I420,
    /// 4:4:4 平面 YUV
    I444,
}

impl ChromaFormat {
    /// 从未压缩视频的 FourCC 解析, 只支持平面 Y/U/V 顺序的格式
    pub fn from_fourcc(fourcc: &[u8]) -> Option<Self> {
        match fourcc {
            b"I420" | b"IYUV" => Some(Self::I420),
            b"444P" | b"Y444" => Some(Self::I444),
            _ => None,
        }
    }

    /// 色度平面尺寸
    pub const fn chroma_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::I420 => (width.div_ceil(2), height.div_ceil(2)),
            Self::I444 => (width, height),
        }
    }
}

/// 视频格式描述 (来自容器元数据)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoFormat {
    /// 编码宽度 (像素)
    pub width: u32,
    /// 编码高度 (像素)
    pub height: u32,
    /// 显示宽度 (像素)
    pub display_width: u32,
    /// 显示高度 (像素)
    pub display_height: u32,
    /// 色度采样格式
    pub chroma: ChromaFormat,
    /// 每帧时长 (纳秒), 0 表示未知
    pub frame_duration_ns: u64,
}

impl VideoFormat {
    /// 创建显示尺寸与编码尺寸相同的格式
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            display_width: width,
            display_height: height,
            chroma: ChromaFormat::I420,
            frame_duration_ns: 0,
        }
    }

    /// 帧率 (未知时为 None)
    pub fn frame_rate(&self) -> Option<f64> {
        (self.frame_duration_ns > 0).then(|| 1_000_000_000.0 / self.frame_duration_ns as f64)
    }

    /// 一帧未压缩数据的总字节数
    pub fn frame_size(&self) -> usize {
        let (cw, ch) = self.chroma.chroma_size(self.width, self.height);
        self.width as usize * self.height as usize + 2 * cw as usize * ch as usize
    }
}

/// 单个图像平面
#[derive(Debug, Clone)]
pub struct Plane {
    /// 像素数据 (stride * height 字节)
    pub bytes: Bytes,
    /// 每行字节数
    pub stride: usize,
    /// 行数
    pub height: usize,
}

impl Plane {
    /// 逐行访问, 每行截取到 `width` 字节
    pub fn rows(&self, width: usize) -> impl Iterator<Item = &[u8]> {
        let width = width.min(self.stride);
        self.bytes
            .chunks(self.stride.max(1))
            .take(self.height)
            .map(move |row| &row[..width.min(row.len())])
    }
}

/// 解码后的 YUV 帧
///
/// 由解码器持有, 调用方只能在两次解码调用之间借用.
#[derive(Debug, Clone)]
pub struct VideoFrameBuffer {
    /// 帧格式
    pub format: VideoFormat,
    /// 亮度平面
    pub y: Plane,
    /// 色度 U 平面
    pub u: Plane,
    /// 色度 V 平面
    pub v: Plane,
}
