//! Benchmarks for the streaming pipeline
//!
//! This benchmark measures:
//! - per-line SSE decoding speed
//! - line splitting over chunked byte streams
//! - free-slot computation over a busy day

use bytes::Bytes;
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use futures::{stream, StreamExt};

use coach_chat::pipeline::decode_line;
use coach_chat::scheduler::{find_free_slots, BusyEvent};
use coach_chat::transport::http::split_lines;
use coach_chat::transport::TransportError;

/// Sample SSE lines as sent by the message API.
const SSE_LINES: &[&str] = &[
    "event: message_start",
    r#"data: {"type":"message_start","message":{"id":"msg_01","type":"message","role":"assistant","model":"claude-test","content":[],"usage":{"input_tokens":25,"output_tokens":1}}}"#,
    "",
    "event: content_block_delta",
    r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#,
    "",
    r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":" there"}}"#,
    ": keep-alive",
    r#"data: {"type":"content_block_stop","index":0}"#,
    r#"data: {"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":15}}"#,
    r#"data: {"type":"message_stop"}"#,
];

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("sse_decode");

    let frame = SSE_LINES[4];
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("decode_delta_line", |b| {
        b.iter(|| decode_line(black_box(frame)))
    });

    let total: usize = SSE_LINES.iter().map(|l| l.len()).sum();
    group.throughput(Throughput::Bytes(total as u64));
    group.bench_function("decode_full_reply", |b| {
        b.iter(|| {
            for line in black_box(SSE_LINES) {
                black_box(decode_line(line));
            }
        })
    });

    group.finish();
}

fn bench_split_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let body: String = SSE_LINES.iter().map(|l| format!("{}\n", l)).collect::<String>().repeat(50);

    let mut group = c.benchmark_group("split_lines");
    group.throughput(Throughput::Bytes(body.len() as u64));

    for chunk_size in [16usize, 512, 8192] {
        let chunks: Vec<Bytes> = body
            .as_bytes()
            .chunks(chunk_size)
            .map(Bytes::copy_from_slice)
            .collect();
        group.bench_function(format!("chunk_{}", chunk_size), |b| {
            b.to_async(&rt).iter(|| {
                let input = stream::iter(
                    chunks
                        .clone()
                        .into_iter()
                        .map(Ok::<Bytes, TransportError>),
                );
                async move { split_lines(input).count().await }
            })
        });
    }

    group.finish();
}

fn bench_free_slots(c: &mut Criterion) {
    let day = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
    let busy: Vec<BusyEvent> = (0..96)
        .map(|i| {
            let start = day + Duration::minutes(i * 15);
            BusyEvent::new(start, start + Duration::minutes(10 + (i % 3) * 5))
        })
        .rev()
        .collect();

    c.bench_function("find_free_slots_96_events", |b| {
        b.iter(|| {
            find_free_slots(
                black_box(&busy),
                day + Duration::hours(7),
                day + Duration::hours(22),
                Duration::minutes(5),
            )
        })
    });
}

criterion_group!(benches, bench_decode, bench_split_lines, bench_free_slots);
criterion_main!(benches);
