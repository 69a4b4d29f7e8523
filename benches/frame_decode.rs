//! Frame decoding benchmark suite.
//!
//! Benchmarks the reader loop's per-message work:
//! - Header parsing
//! - Raw preview decoding at common frame sizes
//! - Stacked-image unzip + decode
//!
//! Run with: cargo bench --bench frame_decode
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::io::{Cursor, Write};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use seestar_imaging::{BinaryProtocol, FrameCodec, FrameHeader, MessageId};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// ============================================================================
// Benchmark Parameters
// ============================================================================

/// (width, height) pairs: thumbnail, binned preview, full sensor.
const FRAME_SIZES: &[(u16, u16)] = &[(160, 90), (540, 960), (1080, 1920)];

// ============================================================================
// Fixtures
// ============================================================================

fn header(id: MessageId, width: u16, height: u16, size: usize) -> FrameHeader {
    FrameHeader {
        size: Some(size),
        id,
        width,
        height,
        code: 3,
    }
}

fn raw_frame(width: u16, height: u16) -> Vec<u8> {
    let samples = usize::from(width) * usize::from(height);
    (0..samples)
        .flat_map(|i| ((i % 4096) as u16).to_le_bytes())
        .collect()
}

fn zipped(raw: &[u8]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file("raw_data", options).expect("start entry");
    writer.write_all(raw).expect("write entry");
    writer.finish().expect("finish archive").into_inner()
}

// ============================================================================
// Benchmark: Header Parsing
// ============================================================================

fn bench_parse_header(c: &mut Criterion) {
    let codec = BinaryProtocol::new();
    let bytes = header(MessageId::STREAMING, 1080, 1920, 1080 * 1920 * 2).encode();

    c.bench_function("parse_header", |b| {
        b.iter(|| codec.parse_header(black_box(&bytes)));
    });
}

// ============================================================================
// Benchmark: Preview Decode
// ============================================================================

fn bench_decode_preview(c: &mut Criterion) {
    let codec = BinaryProtocol::new();
    let mut group = c.benchmark_group("decode_preview");

    for &(width, height) in FRAME_SIZES {
        let raw = raw_frame(width, height);
        let header = header(MessageId::STREAMING, width, height, raw.len());

        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &raw,
            |b, raw| {
                b.iter(|| codec.handle_incoming_message(&header, black_box(raw.clone())));
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: Stacked Image Decode
// ============================================================================

fn bench_decode_stacked(c: &mut Criterion) {
    let codec = BinaryProtocol::new();
    let mut group = c.benchmark_group("decode_stacked");
    group.sample_size(20);

    for &(width, height) in FRAME_SIZES {
        let payload = zipped(&raw_frame(width, height));
        let header = header(MessageId::STACKED_IMAGE, width, height, payload.len());

        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &payload,
            |b, payload| {
                b.iter(|| codec.handle_incoming_message(&header, black_box(payload.clone())));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_header,
    bench_decode_preview,
    bench_decode_stacked
);
criterion_main!(benches);
