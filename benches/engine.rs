//! Engine performance benchmarks (Criterion).
//!
//! Run: `cargo bench` or `cargo bench --bench engine`.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use exchange_core::market_data_gen::{Generator, GeneratorConfig};
use exchange_core::{Exchange, Instrument, InstrumentId, OrderId};

fn instruments() -> Vec<Instrument> {
    vec![Instrument {
        id: InstrumentId(1),
        ticker: "ALFA".into(),
        name: "Alfa common stock".into(),
    }]
}

fn bench_submit_throughput(c: &mut Criterion) {
    const N: usize = 1000;
    let mut group = c.benchmark_group("exchange");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("submit_1000", |b| {
        b.iter_batched(
            || {
                let config = GeneratorConfig {
                    seed: 42,
                    instrument_id: InstrumentId(1),
                    num_orders: N,
                    ..Default::default()
                };
                let exchange = Exchange::new(instruments());
                let requests = Generator::new(config).all_requests();
                (exchange, requests)
            },
            |(exchange, requests)| {
                for request in requests {
                    let _ = exchange.submit(request).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    const RESTING: usize = 500;
    const CANCELS_PER_ITER: usize = 100;
    let mut group = c.benchmark_group("exchange");
    group.throughput(Throughput::Elements(CANCELS_PER_ITER as u64));
    group.bench_function("cancel_100_after_500_resting", |b| {
        b.iter_batched(
            || {
                let config = GeneratorConfig {
                    seed: 123,
                    instrument_id: InstrumentId(1),
                    num_orders: RESTING,
                    limit_ratio: 1.0,
                    ..Default::default()
                };
                let exchange = Exchange::new(instruments());
                for request in Generator::new(config).all_requests() {
                    exchange.submit(request).unwrap();
                }
                exchange
            },
            |exchange| {
                for id in 1..=CANCELS_PER_ITER as u64 {
                    // Some ids are already filled or cancelled; that path is
                    // part of the measured work.
                    let _ = exchange.cancel(OrderId(id));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    const RESTING: usize = 500;
    let mut group = c.benchmark_group("exchange");
    group.bench_function("snapshot_depth5_after_500_resting", |b| {
        b.iter_batched(
            || {
                let config = GeneratorConfig {
                    seed: 7,
                    instrument_id: InstrumentId(1),
                    num_orders: RESTING,
                    limit_ratio: 1.0,
                    ..Default::default()
                };
                let exchange = Exchange::new(instruments());
                for request in Generator::new(config).all_requests() {
                    exchange.submit(request).unwrap();
                }
                exchange
            },
            |exchange| {
                let snapshot = exchange.snapshot(InstrumentId(1), 5).unwrap();
                assert!(snapshot.bids.len() <= 5);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_submit_throughput, bench_cancel, bench_snapshot);
criterion_main!(benches);
