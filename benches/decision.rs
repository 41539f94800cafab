//! Decision-path benchmark over a warm price history

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use poly_watch::features::{compute_features, PriceHistory, PricePoint};
use poly_watch::integrator::Integrator;
use poly_watch::market::MarketKey;
use poly_watch::params::{EntryParams, MarketParams, SizeParams};
use poly_watch::tape::TapeState;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn tape(ts_ms: i64, up: Decimal) -> TapeState {
    TapeState {
        market: MarketKey::Btc15m,
        ts_ms,
        up_price: up,
        down_price: Decimal::ONE - up,
    }
}

fn params() -> MarketParams {
    let size_table_1d: BTreeMap<String, Decimal> = [
        ("(0, 0.5]".to_string(), dec!(5)),
        ("(0.5, 1]".to_string(), dec!(10)),
    ]
    .into_iter()
    .collect();

    MarketParams {
        entry_params: Some(EntryParams {
            up_price_min: Some(dec!(0.3)),
            up_price_max: Some(dec!(0.7)),
            ..Default::default()
        }),
        size_params: SizeParams {
            bin_edges: vec![dec!(0), dec!(0.5), dec!(1)],
            size_table_1d,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn bench_compute_features(c: &mut Criterion) {
    let mut history = PriceHistory::new(1_000);
    for i in 0..1_000i64 {
        history.push(PricePoint {
            ts_ms: i * 1_000,
            up: dec!(0.5) + Decimal::from(i % 10) * dec!(0.001),
            down: dec!(0.5) - Decimal::from(i % 10) * dec!(0.001),
        });
    }
    let state = tape(999_000, dec!(0.505));

    c.bench_function("compute_features_full_history", |b| {
        b.iter(|| black_box(compute_features(black_box(&state), black_box(&history))))
    });
}

fn bench_should_trade(c: &mut Criterion) {
    let params = params();
    let mut integrator = Integrator::new(1_000, 100);
    // Warm the history ring to capacity
    for i in 0..1_000i64 {
        integrator.should_trade(tape(i * 1_000, dec!(0.5)), &params);
    }

    c.bench_function("should_trade_warm_history", |b| {
        let mut ts = 1_000_000i64;
        b.iter(|| {
            ts += 250;
            black_box(integrator.should_trade(tape(ts, dec!(0.5)), &params))
        })
    });
}

criterion_group!(benches, bench_compute_features, bench_should_trade);
criterion_main!(benches);
