//! WebM/Matroska 增量解封装器.
//!
//! 输入以任意大小的块到达, 元素可能跨块. 解析器只在缓冲区里保留
//! 尚未消费的字节: 需要解析内容的元素 (Info, Tracks, 数据块) 等待完整缓冲后
//! 一次处理, 其他元素只消费头部, 数据部分边到达边丢弃.
//!
//! # 结构
//! ```text
//! EBML Header        文件头 (DocType: "webm" 或 "matroska")
//! Segment            根容器 (大小可以未知)
//! ├── Info           段信息 (时间刻度, 时长)
//! ├── Tracks         轨道定义
//! ├── Cluster        数据簇 (大小可以未知, 遇到下一个 Segment 级元素时结束)
//! │   ├── Timestamp
//! │   └── SimpleBlock / BlockGroup
//! └── Cues / Tags / ... 跳过
//! ```
//!
//! 元数据在遇到第一个 Cluster 时发布, 此时 Cluster 之前的头部元素都已解析.

pub mod ebml;

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};
use liu_codec::{ChromaFormat, Packet, VideoFormat};
use liu_core::{LiuError, LiuResult, TrackKind};
use log::{debug, info, warn};

use crate::demuxer::{ContainerMetadata, Demuxer};

use self::ebml::*;

/// 需要完整缓冲的单个元素的最大字节数
pub const MAX_BUFFERED_ELEMENT: u64 = 64 * 1024 * 1024;

/// 默认时间刻度 (纳秒/tick, 即 1ms)
const DEFAULT_TIMESCALE_NS: u64 = 1_000_000;

/// Matroska 轨道类型: 视频
const TRACK_TYPE_VIDEO: u64 = 1;
/// Matroska 轨道类型: 音频
const TRACK_TYPE_AUDIO: u64 = 2;

/// 轨道信息 (解析 Tracks 时暂存)
#[derive(Debug, Default)]
struct TrackInfo {
    number: u64,
    track_type: u64,
    codec_id: String,
    default_duration: u64,
    // 视频
    pixel_width: u32,
    pixel_height: u32,
    display_width: u32,
    display_height: u32,
    /// 未压缩视频的 FourCC
    colour_space: Vec<u8>,
    // 音频
    sample_rate: f64,
    channels: u32,
}

/// 一段字节区间, 结束位置为绝对偏移, `None` 表示未知大小
#[derive(Debug, Clone, Copy)]
struct Region {
    end: Option<u64>,
}

impl Region {
    fn ended_at(&self, position: u64) -> bool {
        self.end.is_some_and(|end| position >= end)
    }
}

/// 单步解析结果
enum Progress {
    /// 缓冲数据不足
    NeedData,
    /// 消费了数据, 但没有产生可见结果
    Continue,
    /// 产生了元数据或数据包
    Produced,
}

/// WebM/Matroska 增量解封装器
pub struct WebmDemuxer {
    /// 尚未消费的输入
    buffer: BytesMut,
    /// 已消费的总字节数 (即缓冲区首字节的绝对偏移)
    parsed: u64,
    /// 正在丢弃的元素的剩余字节数
    skip_remaining: u64,
    /// 是否已解析 EBML 头部
    header_parsed: bool,
    /// 当前 Segment
    segment: Option<Region>,
    /// 当前 Cluster
    cluster: Option<Region>,
    /// 文档类型
    doc_type: String,
    /// 时间刻度 (纳秒/tick)
    timescale_ns: u64,
    /// 时长 (tick)
    duration_ticks: Option<f64>,
    /// 已解析的轨道
    tracks: Vec<TrackInfo>,
    /// 选中的视频轨道号
    video_track: Option<u64>,
    /// 选中的音频轨道号
    audio_track: Option<u64>,
    /// 已发布的元数据
    metadata: Option<ContainerMetadata>,
    /// 当前 Cluster 时间戳 (tick)
    cluster_timestamp: i64,
    /// 排队的视频包
    video_queue: VecDeque<Packet>,
    /// 排队的音频包
    audio_queue: VecDeque<Packet>,
    /// 视频包序号
    video_sequence: u64,
    /// 音频包序号
    audio_sequence: u64,
    /// 是否已提示过 lacing
    lacing_warned: bool,
}

impl WebmDemuxer {
    /// 创建解封装器
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            parsed: 0,
            skip_remaining: 0,
            header_parsed: false,
            segment: None,
            cluster: None,
            doc_type: String::new(),
            timescale_ns: DEFAULT_TIMESCALE_NS,
            duration_ticks: None,
            tracks: Vec::new(),
            video_track: None,
            audio_track: None,
            metadata: None,
            cluster_timestamp: 0,
            video_queue: VecDeque::new(),
            audio_queue: VecDeque::new(),
            video_sequence: 0,
            audio_sequence: 0,
            lacing_warned: false,
        }
    }

    /// 消费缓冲区前 `n` 字节
    fn consume(&mut self, n: usize) {
        self.buffer.advance(n);
        self.parsed += n as u64;
    }

    /// 取出一个完整缓冲的元素, 返回其数据部分
    ///
    /// 数据尚未完整到达时返回 `None`, 不消费任何字节.
    fn take_element(&mut self, header: &ElementHeader) -> LiuResult<Option<Bytes>> {
        let Some(total) = header.total_len() else {
            return Err(LiuError::MalformedContainer(format!(
                "WebM: 元素 0x{:X} 大小未知",
                header.id
            )));
        };
        if total > MAX_BUFFERED_ELEMENT {
            return Err(LiuError::MalformedContainer(format!(
                "WebM: 元素 0x{:X} 过大 ({total} 字节)",
                header.id
            )));
        }
        if (self.buffer.len() as u64) < total {
            return Ok(None);
        }
        let element = self.buffer.split_to(total as usize).freeze();
        self.parsed += total;
        Ok(Some(element.slice(header.header_len..)))
    }

    /// 消费元素头部, 数据部分逐块丢弃
    fn skip_element(&mut self, header: &ElementHeader) -> LiuResult<Progress> {
        let Some(size) = header.size else {
            return Err(LiuError::MalformedContainer(format!(
                "WebM: 无法跳过大小未知的元素 0x{:X}",
                header.id
            )));
        };
        debug!("WebM: 跳过元素 0x{:X} ({size} 字节)", header.id);
        self.consume(header.header_len);
        self.skip_remaining = size;
        Ok(Progress::Continue)
    }

    /// 执行一步解析
    fn step(&mut self) -> LiuResult<Progress> {
        if self.skip_remaining > 0 {
            if self.buffer.is_empty() {
                return Ok(Progress::NeedData);
            }
            let n = self.skip_remaining.min(self.buffer.len() as u64);
            self.consume(n as usize);
            self.skip_remaining -= n;
            return Ok(Progress::Continue);
        }

        if self.cluster.is_some_and(|c| c.ended_at(self.parsed)) {
            self.cluster = None;
        }
        if self.segment.is_some_and(|s| s.ended_at(self.parsed)) {
            debug!("WebM: Segment 结束 (偏移 {})", self.parsed);
            self.segment = None;
            self.cluster = None;
        }

        let Some(header) = parse_element_header(&self.buffer)? else {
            return Ok(Progress::NeedData);
        };

        if !self.header_parsed {
            return self.handle_ebml_header(&header);
        }
        if self.cluster.is_some() {
            return self.handle_cluster_child(&header);
        }
        if self.segment.is_some() {
            return self.handle_segment_child(&header);
        }
        self.handle_top_level(&header)
    }

    fn handle_ebml_header(&mut self, header: &ElementHeader) -> LiuResult<Progress> {
        if header.id != EBML_HEADER {
            return Err(LiuError::MalformedContainer(
                "不是有效的 EBML/WebM 数据".into(),
            ));
        }
        let Some(body) = self.take_element(header)? else {
            return Ok(Progress::NeedData);
        };
        for child in Children::new(&body) {
            let (id, data) = child?;
            if id == EBML_DOC_TYPE {
                self.doc_type = read_string(data);
                debug!("WebM: DocType = {}", self.doc_type);
            }
        }
        self.header_parsed = true;
        Ok(Progress::Continue)
    }

    fn handle_top_level(&mut self, header: &ElementHeader) -> LiuResult<Progress> {
        match header.id {
            SEGMENT => {
                self.consume(header.header_len);
                let end = header.size.map(|size| self.parsed + size);
                debug!("WebM: 进入 Segment (结束偏移 {end:?})");
                self.segment = Some(Region { end });
                Ok(Progress::Continue)
            }
            _ => self.skip_element(header),
        }
    }

    fn handle_segment_child(&mut self, header: &ElementHeader) -> LiuResult<Progress> {
        match header.id {
            CLUSTER => {
                self.consume(header.header_len);
                let end = header.size.map(|size| self.parsed + size);
                self.cluster = Some(Region { end });
                self.cluster_timestamp = 0;
                if self.metadata.is_none() {
                    self.publish_metadata();
                    return Ok(Progress::Produced);
                }
                Ok(Progress::Continue)
            }
            SEGMENT_INFO => {
                let Some(body) = self.take_element(header)? else {
                    return Ok(Progress::NeedData);
                };
                self.parse_segment_info(&body)?;
                Ok(Progress::Continue)
            }
            TRACKS => {
                let Some(body) = self.take_element(header)? else {
                    return Ok(Progress::NeedData);
                };
                self.parse_tracks(&body)?;
                Ok(Progress::Continue)
            }
            _ => self.skip_element(header),
        }
    }

    fn handle_cluster_child(&mut self, header: &ElementHeader) -> LiuResult<Progress> {
        let unknown_size = self.cluster.is_some_and(|c| c.end.is_none());
        if unknown_size && is_segment_level(header.id) {
            // 未知大小的 Cluster 在下一个 Segment 级元素处结束
            self.cluster = None;
            return Ok(Progress::Continue);
        }

        match header.id {
            CLUSTER_TIMESTAMP => {
                let Some(body) = self.take_element(header)? else {
                    return Ok(Progress::NeedData);
                };
                self.cluster_timestamp = i64::try_from(read_uint(&body)?).map_err(|_| {
                    LiuError::MalformedContainer("WebM: Cluster 时间戳超出范围".into())
                })?;
                Ok(Progress::Continue)
            }
            SIMPLE_BLOCK => {
                let Some(body) = self.take_element(header)? else {
                    return Ok(Progress::NeedData);
                };
                let keyframe = body_flags(&body)?.is_some_and(|flags| flags & 0x80 != 0);
                self.queue_block(body, keyframe)
            }
            BLOCK_GROUP => {
                let Some(body) = self.take_element(header)? else {
                    return Ok(Progress::NeedData);
                };
                let mut block = None;
                let mut has_reference = false;
                for child in Children::new(&body) {
                    let (id, data) = child?;
                    match id {
                        BLOCK => block = Some(body.slice_ref(data)),
                        BLOCK_REFERENCE => has_reference = true,
                        _ => {}
                    }
                }
                match block {
                    Some(block) => self.queue_block(block, !has_reference),
                    None => {
                        warn!("WebM: BlockGroup 中没有 Block, 已忽略");
                        Ok(Progress::Continue)
                    }
                }
            }
            _ => self.skip_element(header),
        }
    }

    fn parse_segment_info(&mut self, body: &[u8]) -> LiuResult<()> {
        for child in Children::new(body) {
            let (id, data) = child?;
            match id {
                INFO_TIMESCALE => {
                    let timescale = read_uint(data)?;
                    if timescale == 0 {
                        return Err(LiuError::MalformedContainer(
                            "WebM: 时间刻度为 0".into(),
                        ));
                    }
                    self.timescale_ns = timescale;
                }
                INFO_DURATION => self.duration_ticks = Some(read_float(data)?),
                _ => {}
            }
        }
        debug!(
            "WebM: 时间刻度 {} ns, 时长 {:?} tick",
            self.timescale_ns, self.duration_ticks
        );
        Ok(())
    }

    fn parse_tracks(&mut self, body: &[u8]) -> LiuResult<()> {
        for child in Children::new(body) {
            let (id, data) = child?;
            if id != TRACK_ENTRY {
                continue;
            }
            let track = parse_track_entry(data)?;
            debug!(
                "WebM: 轨道 #{} 类型 {} 编解码器 {}",
                track.number, track.track_type, track.codec_id
            );
            match track.track_type {
                TRACK_TYPE_VIDEO if self.video_track.is_none() => {
                    self.video_track = Some(track.number);
                }
                TRACK_TYPE_AUDIO if self.audio_track.is_none() => {
                    self.audio_track = Some(track.number);
                }
                _ => {}
            }
            self.tracks.push(track);
        }
        Ok(())
    }

    fn track(&self, number: Option<u64>) -> Option<&TrackInfo> {
        let number = number?;
        self.tracks.iter().find(|t| t.number == number)
    }

    fn publish_metadata(&mut self) {
        let video = self.track(self.video_track);
        let audio = self.track(self.audio_track);

        let video_format = video.map(|t| VideoFormat {
            width: t.pixel_width,
            height: t.pixel_height,
            display_width: if t.display_width > 0 {
                t.display_width
            } else {
                t.pixel_width
            },
            display_height: if t.display_height > 0 {
                t.display_height
            } else {
                t.pixel_height
            },
            chroma: chroma_format(&t.colour_space),
            frame_duration_ns: t.default_duration,
        });

        let metadata = ContainerMetadata {
            doc_type: self.doc_type.clone(),
            video_codec: video.map(|t| t.codec_id.clone()),
            video_format,
            audio_codec: audio.map(|t| t.codec_id.clone()),
            audio_sample_rate: audio.map(|t| t.sample_rate as u32),
            audio_channels: audio.map(|t| t.channels),
            duration_s: self
                .duration_ticks
                .map(|ticks| ticks * self.timescale_ns as f64 / 1_000_000_000.0),
        };
        info!(
            "WebM: 元数据就绪, 视频 {:?}, 音频 {:?}",
            metadata.video_codec, metadata.audio_codec
        );
        self.metadata = Some(metadata);
    }

    /// 解析块头并把数据放入对应轨道的队列
    fn queue_block(&mut self, block: Bytes, is_keyframe: bool) -> LiuResult<Progress> {
        let Some((track_number, vint_len)) = parse_vint(&block)? else {
            return Err(LiuError::MalformedContainer("WebM: 块头被截断".into()));
        };
        if block.len() < vint_len + 3 {
            return Err(LiuError::MalformedContainer("WebM: 块头被截断".into()));
        }
        let relative = i16::from_be_bytes([block[vint_len], block[vint_len + 1]]);
        let flags = block[vint_len + 2];
        if flags & 0x06 != 0 && !self.lacing_warned {
            warn!("WebM: 块使用了 lacing, 整块作为一个数据包处理");
            self.lacing_warned = true;
        }

        let track = if Some(track_number) == self.video_track {
            TrackKind::Video
        } else if Some(track_number) == self.audio_track {
            TrackKind::Audio
        } else {
            return Ok(Progress::Continue);
        };

        let timestamp_ms =
            block_timestamp_ms(self.cluster_timestamp, relative, self.timescale_ns)?;
        let sequence = match track {
            TrackKind::Video => &mut self.video_sequence,
            TrackKind::Audio => &mut self.audio_sequence,
        };
        let packet = Packet {
            track,
            data: block.slice(vint_len + 3..),
            timestamp_ms,
            is_keyframe,
            sequence: *sequence,
        };
        *sequence += 1;

        match track {
            TrackKind::Video => self.video_queue.push_back(packet),
            TrackKind::Audio => self.audio_queue.push_back(packet),
        }
        Ok(Progress::Produced)
    }
}

impl Default for WebmDemuxer {
    fn default() -> Self {
        Self::new()
    }
}

/// 按 ColourSpace 选择色度格式, 缺省为 I420
fn chroma_format(colour_space: &[u8]) -> ChromaFormat {
    if colour_space.is_empty() {
        return ChromaFormat::I420;
    }
    ChromaFormat::from_fourcc(colour_space).unwrap_or_else(|| {
        warn!(
            "WebM: 不支持的 ColourSpace {:?}, 按 I420 处理",
            String::from_utf8_lossy(colour_space)
        );
        ChromaFormat::I420
    })
}

/// 块时间戳 (毫秒) = (Cluster 时间戳 + 相对时间戳) * timescale / 1e6
///
/// 纳秒时间戳必须能用 i64 表示, 否则视为容器损坏.
fn block_timestamp_ms(cluster: i64, relative: i16, timescale_ns: u64) -> LiuResult<i64> {
    i64::try_from(timescale_ns)
        .ok()
        .and_then(|scale| cluster.checked_add(i64::from(relative))?.checked_mul(scale))
        .map(|ns| ns / 1_000_000)
        .ok_or_else(|| LiuError::MalformedContainer("WebM: 块时间戳溢出".into()))
}

/// 读取 SimpleBlock 的标志字节
fn body_flags(block: &[u8]) -> LiuResult<Option<u8>> {
    let Some((_, vint_len)) = parse_vint(block)? else {
        return Ok(None);
    };
    Ok(block.get(vint_len + 2).copied())
}

fn parse_track_entry(data: &[u8]) -> LiuResult<TrackInfo> {
    let mut track = TrackInfo::default();
    for child in Children::new(data) {
        let (id, value) = child?;
        match id {
            TRACK_NUMBER => track.number = read_uint(value)?,
            TRACK_TYPE => track.track_type = read_uint(value)?,
            TRACK_CODEC_ID => track.codec_id = read_string(value),
            TRACK_DEFAULT_DURATION => track.default_duration = read_uint(value)?,
            VIDEO_SETTINGS => {
                for setting in Children::new(value) {
                    let (sid, sval) = setting?;
                    match sid {
                        VIDEO_PIXEL_WIDTH => track.pixel_width = read_uint(sval)? as u32,
                        VIDEO_PIXEL_HEIGHT => track.pixel_height = read_uint(sval)? as u32,
                        VIDEO_DISPLAY_WIDTH => track.display_width = read_uint(sval)? as u32,
                        VIDEO_DISPLAY_HEIGHT => track.display_height = read_uint(sval)? as u32,
                        VIDEO_COLOUR_SPACE => track.colour_space = sval.to_vec(),
                        _ => {}
                    }
                }
            }
            AUDIO_SETTINGS => {
                for setting in Children::new(value) {
                    let (sid, sval) = setting?;
                    match sid {
                        AUDIO_SAMPLING_FREQ => track.sample_rate = read_float(sval)?,
                        AUDIO_CHANNELS => track.channels = read_uint(sval)? as u32,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    Ok(track)
}

impl Demuxer for WebmDemuxer {
    fn name(&self) -> &str {
        "webm"
    }

    fn receive_input(&mut self, chunk: Bytes) {
        self.buffer.extend_from_slice(&chunk);
    }

    fn process(&mut self) -> LiuResult<bool> {
        loop {
            match self.step()? {
                Progress::NeedData => return Ok(false),
                Progress::Produced => return Ok(true),
                Progress::Continue => {}
            }
        }
    }

    fn metadata_loaded(&self) -> bool {
        self.metadata.is_some()
    }

    fn metadata(&self) -> Option<&ContainerMetadata> {
        self.metadata.as_ref()
    }

    fn audio_ready(&self) -> bool {
        !self.audio_queue.is_empty()
    }

    fn frame_ready(&self) -> bool {
        !self.video_queue.is_empty()
    }

    fn dequeue_audio_packet(&mut self) -> Option<Packet> {
        self.audio_queue.pop_front()
    }

    fn dequeue_video_packet(&mut self) -> Option<Packet> {
        self.video_queue.pop_front()
    }

    fn parsed_bytes(&self) -> u64 {
        self.parsed
    }

    fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_vint_id(buf: &mut Vec<u8>, id: u32) {
        let bytes = id.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        buf.extend_from_slice(&bytes[skip..]);
    }

    fn write_vint_size(buf: &mut Vec<u8>, size: u64) {
        if size < 0x7F {
            buf.push(0x80 | size as u8);
        } else if size < 0x3FFF {
            buf.push(0x40 | (size >> 8) as u8);
            buf.push(size as u8);
        } else {
            buf.push(0x01);
            buf.extend_from_slice(&size.to_be_bytes()[1..]);
        }
    }

    fn write_element(buf: &mut Vec<u8>, id: u32, content: &[u8]) {
        write_vint_id(buf, id);
        write_vint_size(buf, content.len() as u64);
        buf.extend_from_slice(content);
    }

    fn write_uint_element(buf: &mut Vec<u8>, id: u32, val: u64) {
        let bytes = val.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
        write_element(buf, id, &bytes[skip..]);
    }

    fn write_string_element(buf: &mut Vec<u8>, id: u32, s: &str) {
        write_element(buf, id, s.as_bytes());
    }

    fn simple_block(track: u8, relative: i16, keyframe: bool, payload: &[u8]) -> Vec<u8> {
        let mut block = vec![0x80 | track];
        block.extend_from_slice(&relative.to_be_bytes());
        block.push(if keyframe { 0x80 } else { 0x00 });
        block.extend_from_slice(payload);
        block
    }

    /// 构造一个最小的 WebM: 1 视频轨 + 1 音频轨, 未知大小的 Segment
    fn build_minimal_webm(cluster_unknown_size: bool) -> Vec<u8> {
        let mut data = Vec::new();

        let mut ebml_content = Vec::new();
        write_string_element(&mut ebml_content, EBML_DOC_TYPE, "webm");
        write_element(&mut data, EBML_HEADER, &ebml_content);

        write_vint_id(&mut data, SEGMENT);
        data.extend_from_slice(&[0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

        // 一个要跳过的 SeekHead
        write_element(&mut data, SEEK_HEAD, &[0u8; 10]);

        let mut info_content = Vec::new();
        write_uint_element(&mut info_content, INFO_TIMESCALE, 1_000_000);
        write_element(
            &mut info_content,
            INFO_DURATION,
            &2000.0f64.to_bits().to_be_bytes(),
        );
        write_element(&mut data, SEGMENT_INFO, &info_content);

        let mut tracks_content = Vec::new();
        {
            let mut track = Vec::new();
            write_uint_element(&mut track, TRACK_NUMBER, 1);
            write_uint_element(&mut track, TRACK_TYPE, TRACK_TYPE_VIDEO);
            write_string_element(&mut track, TRACK_CODEC_ID, "V_VP9");
            write_uint_element(&mut track, TRACK_DEFAULT_DURATION, 40_000_000);
            let mut video = Vec::new();
            write_uint_element(&mut video, VIDEO_PIXEL_WIDTH, 320);
            write_uint_element(&mut video, VIDEO_PIXEL_HEIGHT, 240);
            write_element(&mut track, VIDEO_SETTINGS, &video);
            write_element(&mut tracks_content, TRACK_ENTRY, &track);
        }
        {
            let mut track = Vec::new();
            write_uint_element(&mut track, TRACK_NUMBER, 2);
            write_uint_element(&mut track, TRACK_TYPE, TRACK_TYPE_AUDIO);
            write_string_element(&mut track, TRACK_CODEC_ID, "A_OPUS");
            let mut audio = Vec::new();
            write_element(
                &mut audio,
                AUDIO_SAMPLING_FREQ,
                &48000.0f64.to_bits().to_be_bytes(),
            );
            write_uint_element(&mut audio, AUDIO_CHANNELS, 2);
            write_element(&mut track, AUDIO_SETTINGS, &audio);
            write_element(&mut tracks_content, TRACK_ENTRY, &track);
        }
        write_element(&mut data, TRACKS, &tracks_content);

        let mut cluster = Vec::new();
        write_uint_element(&mut cluster, CLUSTER_TIMESTAMP, 100);
        write_element(&mut cluster, SIMPLE_BLOCK, &simple_block(1, 0, true, &[0xDE, 0xAD]));
        write_element(&mut cluster, SIMPLE_BLOCK, &simple_block(2, 0, true, &[0xBE, 0xEF]));
        {
            let mut group = Vec::new();
            write_element(&mut group, BLOCK, &simple_block(1, 40, false, &[0x01, 0x02, 0x03]));
            write_uint_element(&mut group, BLOCK_REFERENCE, 1);
            write_element(&mut cluster, BLOCK_GROUP, &group);
        }
        // 未知轨道号的块被丢弃
        write_element(&mut cluster, SIMPLE_BLOCK, &simple_block(9, 0, true, &[0xFF]));

        if cluster_unknown_size {
            write_vint_id(&mut data, CLUSTER);
            data.push(0xFF);
            data.extend_from_slice(&cluster);
            // 下一个 Cluster 结束上一个未知大小的 Cluster
            let mut second = Vec::new();
            write_uint_element(&mut second, CLUSTER_TIMESTAMP, 200);
            write_element(&mut second, SIMPLE_BLOCK, &simple_block(1, 0, true, &[0x07]));
            write_element(&mut data, CLUSTER, &second);
        } else {
            write_element(&mut data, CLUSTER, &cluster);
        }
        write_element(&mut data, CUES, &[0u8; 4]);
        data
    }

    fn feed_all(demuxer: &mut WebmDemuxer, data: &[u8], chunk: usize) {
        for piece in data.chunks(chunk) {
            demuxer.receive_input(Bytes::copy_from_slice(piece));
            while demuxer.process().unwrap() {}
        }
    }

    fn drain(queue: &mut WebmDemuxer, track: TrackKind) -> Vec<Packet> {
        let mut out = Vec::new();
        loop {
            let packet = match track {
                TrackKind::Video => queue.dequeue_video_packet(),
                TrackKind::Audio => queue.dequeue_audio_packet(),
            };
            match packet {
                Some(p) => out.push(p),
                None => return out,
            }
        }
    }

    #[test]
    fn test_解析元数据() {
        let data = build_minimal_webm(false);
        let mut demuxer = WebmDemuxer::new();
        feed_all(&mut demuxer, &data, data.len());

        assert!(demuxer.metadata_loaded());
        let metadata = demuxer.metadata().unwrap();
        assert_eq!(metadata.doc_type, "webm");
        assert_eq!(metadata.video_codec.as_deref(), Some("V_VP9"));
        assert_eq!(metadata.audio_codec.as_deref(), Some("A_OPUS"));
        assert_eq!(metadata.audio_sample_rate, Some(48000));
        assert_eq!(metadata.audio_channels, Some(2));
        let format = metadata.video_format.unwrap();
        assert_eq!((format.width, format.height), (320, 240));
        assert_eq!((format.display_width, format.display_height), (320, 240));
        assert_eq!(format.frame_duration_ns, 40_000_000);
        let duration = metadata.duration_s.unwrap();
        assert!((duration - 2.0).abs() < 1e-9, "时长应为 2 秒, 实际={duration}");
    }

    #[test]
    fn test_读取数据包() {
        let data = build_minimal_webm(false);
        let mut demuxer = WebmDemuxer::new();
        feed_all(&mut demuxer, &data, data.len());

        let video = drain(&mut demuxer, TrackKind::Video);
        assert_eq!(video.len(), 2);
        assert_eq!(video[0].data.as_ref(), &[0xDE, 0xAD]);
        assert!(video[0].is_keyframe);
        assert_eq!(video[0].timestamp_ms, 100);
        assert_eq!(video[0].sequence, 0);
        assert_eq!(video[1].data.as_ref(), &[0x01, 0x02, 0x03]);
        assert!(!video[1].is_keyframe, "带 ReferenceBlock 的块不是关键帧");
        assert_eq!(video[1].timestamp_ms, 140);
        assert_eq!(video[1].sequence, 1);

        let audio = drain(&mut demuxer, TrackKind::Audio);
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].data.as_ref(), &[0xBE, 0xEF]);

        assert_eq!(demuxer.parsed_bytes(), data.len() as u64);
        assert_eq!(demuxer.buffered_bytes(), 0);
    }

    #[test]
    fn test_逐字节输入结果一致() {
        let data = build_minimal_webm(false);
        let mut whole = WebmDemuxer::new();
        feed_all(&mut whole, &data, data.len());
        let mut bytewise = WebmDemuxer::new();
        feed_all(&mut bytewise, &data, 1);

        assert_eq!(whole.metadata(), bytewise.metadata());
        let a: Vec<Bytes> = drain(&mut whole, TrackKind::Video)
            .into_iter()
            .map(|p| p.data)
            .collect();
        let b: Vec<Bytes> = drain(&mut bytewise, TrackKind::Video)
            .into_iter()
            .map(|p| p.data)
            .collect();
        assert_eq!(a, b);
        assert_eq!(bytewise.parsed_bytes(), data.len() as u64);
    }

    #[test]
    fn test_未知大小的_cluster() {
        let data = build_minimal_webm(true);
        let mut demuxer = WebmDemuxer::new();
        feed_all(&mut demuxer, &data, 7);

        let video = drain(&mut demuxer, TrackKind::Video);
        assert_eq!(video.len(), 3);
        assert_eq!(video[2].data.as_ref(), &[0x07]);
        assert_eq!(video[2].timestamp_ms, 200);
    }

    #[test]
    fn test_process_每次产出后返回() {
        let data = build_minimal_webm(false);
        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::from(data));

        // 第一次: 元数据
        assert!(demuxer.process().unwrap());
        assert!(demuxer.metadata_loaded());
        assert!(!demuxer.frame_ready());
        // 第二次: 第一个视频包
        assert!(demuxer.process().unwrap());
        assert!(demuxer.frame_ready());
        assert!(!demuxer.audio_ready());
        // 第三次: 音频包
        assert!(demuxer.process().unwrap());
        assert!(demuxer.audio_ready());
        // 第四次: BlockGroup 视频包
        assert!(demuxer.process().unwrap());
        // 剩余数据不再产出
        assert!(!demuxer.process().unwrap());
        assert!(!demuxer.process().unwrap());
    }

    #[test]
    fn test_数据不足时不产出() {
        let data = build_minimal_webm(false);
        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::copy_from_slice(&data[..10]));
        assert!(!demuxer.process().unwrap());
        assert!(!demuxer.metadata_loaded());
    }

    #[test]
    fn test_非_ebml_数据() {
        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::from_static(b"RIFF\x00\x00\x00\x00WAVE"));
        let err = demuxer.process().unwrap_err();
        assert_eq!(err.kind(), liu_core::ErrorKind::MalformedContainer);
    }

    /// EBML 头 + VP9 视频轨 + 时间戳为 `timestamp` 的 Cluster (含一个 SimpleBlock)
    fn build_cluster_with_timestamp(timestamp: u64) -> Vec<u8> {
        let mut data = Vec::new();
        let mut ebml_content = Vec::new();
        write_string_element(&mut ebml_content, EBML_DOC_TYPE, "webm");
        write_element(&mut data, EBML_HEADER, &ebml_content);
        write_vint_id(&mut data, SEGMENT);
        data.push(0xFF);

        let mut track = Vec::new();
        write_uint_element(&mut track, TRACK_NUMBER, 1);
        write_uint_element(&mut track, TRACK_TYPE, TRACK_TYPE_VIDEO);
        write_string_element(&mut track, TRACK_CODEC_ID, "V_VP9");
        let mut tracks = Vec::new();
        write_element(&mut tracks, TRACK_ENTRY, &track);
        write_element(&mut data, TRACKS, &tracks);

        let mut cluster = Vec::new();
        write_uint_element(&mut cluster, CLUSTER_TIMESTAMP, timestamp);
        write_element(&mut cluster, SIMPLE_BLOCK, &simple_block(1, 0, true, &[0x01]));
        write_element(&mut data, CLUSTER, &cluster);
        data
    }

    fn process_all(demuxer: &mut WebmDemuxer) -> LiuResult<()> {
        while demuxer.process()? {}
        Ok(())
    }

    #[test]
    fn test_colour_space_选择色度格式() {
        let mut data = Vec::new();
        let mut ebml_content = Vec::new();
        write_string_element(&mut ebml_content, EBML_DOC_TYPE, "webm");
        write_element(&mut data, EBML_HEADER, &ebml_content);
        write_vint_id(&mut data, SEGMENT);
        data.push(0xFF);

        let mut track = Vec::new();
        write_uint_element(&mut track, TRACK_NUMBER, 1);
        write_uint_element(&mut track, TRACK_TYPE, TRACK_TYPE_VIDEO);
        write_string_element(&mut track, TRACK_CODEC_ID, "V_UNCOMPRESSED");
        let mut video = Vec::new();
        write_uint_element(&mut video, VIDEO_PIXEL_WIDTH, 4);
        write_uint_element(&mut video, VIDEO_PIXEL_HEIGHT, 2);
        write_element(&mut video, VIDEO_COLOUR_SPACE, b"444P");
        write_element(&mut track, VIDEO_SETTINGS, &video);
        let mut tracks = Vec::new();
        write_element(&mut tracks, TRACK_ENTRY, &track);
        write_element(&mut data, TRACKS, &tracks);
        write_element(&mut data, CLUSTER, &[]);

        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::from(data));
        while demuxer.process().unwrap() {}
        let format = demuxer.metadata().unwrap().video_format.unwrap();
        assert_eq!(format.chroma, ChromaFormat::I444);
        assert_eq!(format.frame_size(), 24);
    }

    #[test]
    fn test_未知_colour_space_按_i420() {
        assert_eq!(chroma_format(b""), ChromaFormat::I420);
        assert_eq!(chroma_format(b"YV12"), ChromaFormat::I420);
        assert_eq!(chroma_format(b"Y444"), ChromaFormat::I444);
    }

    #[test]
    fn test_大时间戳不溢出() {
        // 10^13 个 1ms 刻度换算为纳秒超出 i64
        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::from(build_cluster_with_timestamp(10_000_000_000_000)));
        let err = process_all(&mut demuxer).unwrap_err();
        assert_eq!(err.kind(), liu_core::ErrorKind::MalformedContainer);
        assert!(!demuxer.frame_ready());
    }

    #[test]
    fn test_超出_i64_的_cluster_时间戳() {
        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::from(build_cluster_with_timestamp(u64::MAX)));
        let err = process_all(&mut demuxer).unwrap_err();
        assert_eq!(err.kind(), liu_core::ErrorKind::MalformedContainer);
    }

    #[test]
    fn test_合法的大时间戳() {
        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::from(build_cluster_with_timestamp(1_000_000_000)));
        process_all(&mut demuxer).unwrap();
        let packet = demuxer.dequeue_video_packet().unwrap();
        assert_eq!(packet.timestamp_ms, 1_000_000_000);
    }

    #[test]
    fn test_大元素不缓冲() {
        let mut data = Vec::new();
        let mut ebml_content = Vec::new();
        write_string_element(&mut ebml_content, EBML_DOC_TYPE, "webm");
        write_element(&mut data, EBML_HEADER, &ebml_content);
        write_vint_id(&mut data, SEGMENT);
        data.push(0xFF);
        // 1 MB 的 Void 元素
        write_vint_id(&mut data, EBML_VOID);
        write_vint_size(&mut data, 1 << 20);

        let mut demuxer = WebmDemuxer::new();
        demuxer.receive_input(Bytes::from(data));
        assert!(!demuxer.process().unwrap());
        demuxer.receive_input(Bytes::from(vec![0u8; 4096]));
        assert!(!demuxer.process().unwrap());
        assert_eq!(demuxer.buffered_bytes(), 0, "跳过的元素不应留在缓冲区");
    }
}
