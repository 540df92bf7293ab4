//! Liu 解码流水线性能基准测试.
//!
//! 覆盖 WebM 增量解封装与 RAW 视频完整调度两条核心路径.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use liu::core::crc::crc32;
use liu::format::demuxers::webm::WebmDemuxer;
use liu::format::demuxers::webm::ebml::*;
use liu::format::{Demuxer, InputSource};
use liu::pipeline::{
    CollectingReporter, ManualClock, MetricsMode, MetricsSink, PipelineConfig,
    PipelineOrchestrator,
};

const WIDTH: u64 = 320;
const HEIGHT: u64 = 240;
const FRAMES: usize = 120;

fn write_vint_id(buf: &mut Vec<u8>, id: u32) {
    let bytes = id.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    buf.extend_from_slice(&bytes[skip..]);
}

fn write_element(buf: &mut Vec<u8>, id: u32, content: &[u8]) {
    write_vint_id(buf, id);
    // 统一使用 8 字节大小字段
    buf.push(0x01);
    buf.extend_from_slice(&(content.len() as u64).to_be_bytes()[1..]);
    buf.extend_from_slice(content);
}

fn write_uint_element(buf: &mut Vec<u8>, id: u32, val: u64) {
    write_element(buf, id, &val.to_be_bytes());
}

/// 构造 320x240 I420 RAW 视频的 WebM, 每 30 帧一个 Cluster
fn make_raw_webm() -> Vec<u8> {
    let frame_size = (WIDTH * HEIGHT * 3 / 2) as usize;
    let mut data = Vec::new();

    let mut header = Vec::new();
    write_element(&mut header, EBML_DOC_TYPE, b"webm");
    write_element(&mut data, EBML_HEADER, &header);

    let mut segment = Vec::new();
    let mut track = Vec::new();
    write_uint_element(&mut track, TRACK_NUMBER, 1);
    write_uint_element(&mut track, TRACK_TYPE, 1);
    write_element(&mut track, TRACK_CODEC_ID, b"V_UNCOMPRESSED");
    let mut video = Vec::new();
    write_uint_element(&mut video, VIDEO_PIXEL_WIDTH, WIDTH);
    write_uint_element(&mut video, VIDEO_PIXEL_HEIGHT, HEIGHT);
    write_element(&mut track, VIDEO_SETTINGS, &video);
    let mut tracks = Vec::new();
    write_element(&mut tracks, TRACK_ENTRY, &track);
    write_element(&mut segment, TRACKS, &tracks);

    for cluster_frames in (0..FRAMES).collect::<Vec<_>>().chunks(30) {
        let mut cluster = Vec::new();
        write_uint_element(&mut cluster, CLUSTER_TIMESTAMP, cluster_frames[0] as u64 * 40);
        for (i, &index) in cluster_frames.iter().enumerate() {
            let mut block = vec![0x81];
            block.extend_from_slice(&((i * 40) as i16).to_be_bytes());
            block.push(0x80);
            block.extend((0..frame_size).map(|p| (p + index) as u8));
            write_element(&mut cluster, SIMPLE_BLOCK, &block);
        }
        write_element(&mut segment, CLUSTER, &cluster);
    }
    write_element(&mut data, SEGMENT, &segment);
    data
}

fn bench_demux(c: &mut Criterion) {
    let data = make_raw_webm();
    let mut group = c.benchmark_group("webm_demux");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for chunk_size in [4096usize, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk_size), &chunk_size, |b, &n| {
            b.iter(|| {
                let mut demuxer = WebmDemuxer::new();
                let mut packets = 0;
                for chunk in data.chunks(n) {
                    demuxer.receive_input(bytes::Bytes::copy_from_slice(chunk));
                    while demuxer.process().unwrap() {
                        while let Some(packet) = demuxer.dequeue_video_packet() {
                            packets += 1;
                            black_box(packet);
                        }
                    }
                }
                assert_eq!(packets, FRAMES);
            });
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let data = make_raw_webm();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("raw_pipeline");
    group.throughput(Throughput::Elements(FRAMES as u64));
    for mode in [MetricsMode::Throughput, MetricsMode::Checksum] {
        group.bench_function(format!("{mode:?}"), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let config = PipelineConfig {
                        metrics_mode: mode,
                        ..PipelineConfig::default()
                    };
                    let resolver = liu::default_resolver(&config);
                    let demuxer = resolver.create_demuxer().await.unwrap();
                    let input = InputSource::from_bytes(data.clone(), config.chunk_size).unwrap();
                    let metrics = MetricsSink::from_config(
                        &config,
                        Box::new(ManualClock::new()),
                        Box::new(CollectingReporter::new()),
                    );
                    let mut pipeline =
                        PipelineOrchestrator::new(config, input, demuxer, resolver, metrics)
                            .unwrap();
                    let summary = pipeline.run().await.unwrap();
                    assert_eq!(summary.frames_decoded, FRAMES as u64);
                })
            });
        });
    }
    group.finish();
}

fn bench_crc32(c: &mut Criterion) {
    let luma = vec![0x5Au8; (WIDTH * HEIGHT) as usize];
    let mut group = c.benchmark_group("crc32");
    group.throughput(Throughput::Bytes(luma.len() as u64));
    group.bench_function("luma_320x240", |b| b.iter(|| crc32(black_box(&luma))));
    group.finish();
}

criterion_group!(benches, bench_demux, bench_pipeline, bench_crc32);
criterion_main!(benches);
