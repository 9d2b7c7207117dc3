//! Rebalance benchmarks: ranking, selection, and full rebalance over a synthetic universe.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rankbook::{MovingAverageStrategy, Portfolio, PriceRecord, RebalanceParams, Rebalancer};

const SECTORS: [&str; 8] = [
    "Tech", "Energy", "Health", "Financials", "Utilities", "Materials", "Industrials", "Staples",
];

/// Generate `n_days` closes for `n_stocks` tickers.
///
/// Prices start at $100 and drift randomly using a simple deterministic RNG.
fn generate_records(n_days: usize, n_stocks: usize) -> Vec<PriceRecord> {
    let mut prices = vec![100.0f64; n_stocks];
    let mut records = Vec::with_capacity(n_days * n_stocks);

    // Simple deterministic PRNG (xorshift32)
    let mut rng_state: u32 = 42;

    for day in 0..n_days {
        let date = format!("2020-{day:04}");
        for (i, price) in prices.iter_mut().enumerate() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 17;
            rng_state ^= rng_state << 5;

            // Random return between -2% and +2%
            let ret = (rng_state % 401) as f64 - 200.0;
            *price = (*price * (1.0 + ret / 10_000.0)).max(1.0);
            records.push(PriceRecord::close_only(
                &format!("S{i:04}"),
                SECTORS[i % SECTORS.len()],
                &date,
                *price,
            ));
        }
    }

    records
}

fn params() -> RebalanceParams {
    RebalanceParams {
        holding_window: 10,
        max_holdings: 50,
        max_sector_lead: 5,
        adjust_by: 1.0,
    }
}

/// Benchmark: index build over 250 days
fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    for n_stocks in [100, 500] {
        let records = generate_records(250, n_stocks);
        group.bench_with_input(BenchmarkId::from_parameter(n_stocks), &records, |b, records| {
            b.iter(|| Rebalancer::from_records(black_box(records)));
        });
    }
    group.finish();
}

/// Benchmark: cold rebalance (caches cleared every iteration)
fn bench_rebalance_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebalance_cold");
    let strategy = MovingAverageStrategy::default();
    for n_stocks in [100, 500] {
        let mut engine = Rebalancer::from_records(&generate_records(250, n_stocks));
        let portfolio = Portfolio::with_cash("bench", "2020-0200", 1_000_000.0);
        group.bench_with_input(BenchmarkId::from_parameter(n_stocks), &portfolio, |b, p| {
            b.iter(|| {
                engine.clear_caches();
                engine.rebalance(black_box(p), &strategy, &params()).ok()
            });
        });
    }
    group.finish();
}

/// Benchmark: warm rebalance (every score served from cache)
fn bench_rebalance_warm(c: &mut Criterion) {
    let strategy = MovingAverageStrategy::default();
    let mut engine = Rebalancer::from_records(&generate_records(250, 500));
    let portfolio = Portfolio::with_cash("bench", "2020-0200", 1_000_000.0);
    let _ = engine.rebalance(&portfolio, &strategy, &params());

    c.bench_function("rebalance_warm_500", |b| {
        b.iter(|| engine.rebalance(black_box(&portfolio), &strategy, &params()).ok());
    });
}

/// Benchmark: chained rebalances across the dataset
fn bench_rolling(c: &mut Criterion) {
    let strategy = MovingAverageStrategy::default();
    let records = generate_records(250, 100);

    c.bench_function("rolling_100x15", |b| {
        b.iter(|| {
            let mut engine = Rebalancer::from_records(&records);
            let mut portfolio = Portfolio::with_cash("bench", "2020-0060", 100_000.0);
            for _ in 0..15 {
                match engine.rebalance(&portfolio, &strategy, &params()) {
                    Ok(out) => portfolio = out.portfolio,
                    Err(_) => break,
                }
            }
            black_box(portfolio)
        });
    });
}

criterion_group!(
    benches,
    bench_index_build,
    bench_rebalance_cold,
    bench_rebalance_warm,
    bench_rolling
);
criterion_main!(benches);
