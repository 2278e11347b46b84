//! Benchmarks for the per-pass bookkeeping of the frame loop.

use criterion::{Criterion, criterion_group, criterion_main};
use gyro_scheduler::{LoopConfig, LoopCounters, RateMeter, normalized_rate};
use std::hint::black_box;
use std::time::{Duration, Instant};

fn bench_rate_meter_record_and_roll(c: &mut Criterion) {
    let mut meter = RateMeter::new(Instant::now());

    c.bench_function("rate_meter_record_and_roll", |b| {
        b.iter(|| {
            meter.record_pass();
            black_box(meter.maybe_roll(black_box(Instant::now())));
        });
    });
}

fn bench_normalized_rate(c: &mut Criterion) {
    let elapsed = Duration::from_millis(1_016);

    c.bench_function("normalized_rate", |b| {
        b.iter(|| {
            black_box(normalized_rate(black_box(61), black_box(elapsed)));
        });
    });
}

fn bench_counters_inc_pass(c: &mut Criterion) {
    let counters = LoopCounters::new();

    c.bench_function("counters_inc_pass", |b| {
        b.iter(|| {
            counters.inc_pass();
        });
    });
}

fn bench_config_frame_budget(c: &mut Criterion) {
    let config = LoopConfig::new().with_target_rate(240);

    c.bench_function("config_frame_budget", |b| {
        b.iter(|| {
            black_box(black_box(&config).frame_budget());
        });
    });
}

criterion_group!(
    benches,
    bench_rate_meter_record_and_roll,
    bench_normalized_rate,
    bench_counters_inc_pass,
    bench_config_frame_budget,
);

criterion_main!(benches);
