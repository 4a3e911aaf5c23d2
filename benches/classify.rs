//! Inbound classification benchmarks.
//!
//! Measures the full receive path (decode, classify, apply) and the bare
//! classifier against a mix of realistic hub lines.
//!
//! Run with: cargo bench --bench classify
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use vibecue_session::{InboundEvent, SessionController, SessionOptions};

// ============================================================================
// Benchmark Inputs
// ============================================================================

const LINES: &[&str] = &[
    "#BLE:RAW:+OK",
    "#BLE:RAW:+CONNECTED:1",
    "#DM:SCAN:FOUND:AABBCCDDEEFF,Sensor1,-65",
    "#DM:SCAN_STARTED",
    "#ERR:DUP_MAC:AABBCCDDEEFF:L1",
    "#DM:TYPE_FULL:2:4",
    "#ERR:SLOT_FULL:8",
    "#EVAL:STOP:STOP_OK:120,118,45,47,3",
    "#EVAL:STOP:STOP_OK:12,14,5",
    "#MAN:TIMEOUT",
    "#ERR:BAD_CMD",
    "#MAN:START_OK",
    "garbage line",
];

// ============================================================================
// Benchmark: Classifier
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for line in LINES {
        group.bench_with_input(BenchmarkId::new("line", line), line, |b, line| {
            b.iter(|| InboundEvent::classify(black_box(line)));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Receive Path
// ============================================================================

fn bench_on_receive(c: &mut Criterion) {
    let frames: Vec<Vec<u8>> = LINES
        .iter()
        .map(|line| format!("{line}\r\n").into_bytes())
        .collect();

    c.bench_function("on_receive/mixed", |b| {
        let mut session = SessionController::new(SessionOptions::new());
        session.connect("VibeCue-Hub");

        b.iter(|| {
            for frame in &frames {
                black_box(session.on_receive(black_box(frame)));
            }
            session.reset();
        });
    });
}

criterion_group!(benches, bench_classify, bench_on_receive);
criterion_main!(benches);
