//! Engine Benchmarks - Calculation Hot Path
//!
//! Benchmarks the pure domain functions that run on every request.
//!
//! Run with: cargo bench --bench engine_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;

use trigger_order_router::domain::calculation::{CalculationRequest, OrderCalculationEngine};
use trigger_order_router::domain::routing::TradeIntent;
use trigger_order_router::domain::scaling::{from_scaled_amount, to_scaled_amount};

fn full_request() -> CalculationRequest {
    CalculationRequest::new(dec!(142.37), dec!(139.5), dec!(12.345678901))
        .with_take_profit(dec!(155.25))
        .with_stop_loss(dec!(131.1))
}

/// Full three-leg calculation including validation and summary.
fn bench_calculate_full(c: &mut Criterion) {
    let engine = OrderCalculationEngine::default();
    let request = full_request();

    c.bench_function("calculate_three_legs", |b| {
        b.iter(|| {
            let _set = engine.calculate(black_box(&request));
        });
    });
}

/// Validation alone, on a request that fails at the stop-loss check.
fn bench_validate_reject(c: &mut Criterion) {
    let engine = OrderCalculationEngine::default();
    let request = full_request().with_stop_loss(dec!(140));

    c.bench_function("validate_invalid_stop_loss", |b| {
        b.iter(|| {
            let _err = engine.validate(black_box(&request));
        });
    });
}

fn bench_scaling(c: &mut Criterion) {
    c.bench_function("to_scaled_amount_9dp", |b| {
        b.iter(|| {
            let _scaled = to_scaled_amount(black_box(dec!(12.345678901234)), black_box(9));
        });
    });

    c.bench_function("from_scaled_amount_9dp", |b| {
        b.iter(|| {
            let _amount = from_scaled_amount(black_box("12345678901"), black_box(9));
        });
    });
}

/// Calculation plus leg routing, as done per `create_orders` request.
fn bench_route_legs(c: &mut Criterion) {
    let engine = OrderCalculationEngine::default();
    let intent = TradeIntent {
        request: full_request(),
        input_token: "So11111111111111111111111111111111111111112".to_string(),
        output_token: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
        owner: "owner_wallet".to_string(),
    };

    c.bench_function("calculate_and_route", |b| {
        b.iter(|| {
            if let Ok(set) = engine.calculate(black_box(&intent.request)) {
                let _legs = intent.legs(&set);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_calculate_full,
    bench_validate_reject,
    bench_scaling,
    bench_route_legs,
);
criterion_main!(benches);
