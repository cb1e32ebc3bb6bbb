//! Criterion benchmarks for the session hot paths.
//!
//! Benchmarks:
//! 1. Indicator precompute (ATR + volume SMA)
//! 2. Full session loop over multi-day 5-minute bars

use chrono::{Duration, NaiveDate, TimeZone};
use chrono_tz::America::New_York;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use openmo_core::domain::Bar;
use openmo_core::engine::{run_session_with_indicators, BrokerConfig, EngineConfig, SimBroker};
use openmo_core::indicators::precompute_indicators;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(days: usize) -> Vec<Bar> {
    let first = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut bars = Vec::with_capacity(days * 78);
    for d in 0..days {
        let session_open = (first + Duration::days(d as i64)).and_hms_opt(9, 30, 0).unwrap();
        let open_ts = New_York
            .from_local_datetime(&session_open)
            .single()
            .unwrap()
            .fixed_offset();
        for i in 0..78 {
            let n = (d * 78 + i) as f64;
            let close = 15_000.0 + (n * 0.07).sin() * 40.0 + (n * 0.011).cos() * 120.0;
            let open = close - (n * 0.3).sin() * 3.0;
            bars.push(Bar {
                timestamp: open_ts + Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 2.0,
                low: open.min(close) - 2.0,
                close,
                volume: 1_000.0 + ((i * 37) % 400) as f64 + if i % 29 == 0 { 4_000.0 } else { 0.0 },
            });
        }
    }
    bars
}

// ── 1. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");
    for days in [20usize, 250] {
        let bars = make_bars(days);
        group.bench_with_input(BenchmarkId::from_parameter(days), &bars, |b, bars| {
            b.iter(|| precompute_indicators(black_box(bars), 14, 20));
        });
    }
    group.finish();
}

// ── 2. Session loop ──────────────────────────────────────────────────

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_loop");
    let config = EngineConfig::default();
    for days in [20usize, 250] {
        let bars = make_bars(days);
        let indicators = precompute_indicators(&bars, 14, 20);
        group.bench_with_input(BenchmarkId::from_parameter(days), &bars, |b, bars| {
            b.iter(|| {
                let mut broker = SimBroker::new(BrokerConfig::default(), 2.0);
                run_session_with_indicators(black_box(bars), &indicators, &config, &mut broker)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_indicators, bench_session);
criterion_main!(benches);
