use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vanillaferric::core::{
    AnalyticModel, ExerciseStyle, OptionContract, OptionType, PricingEngine,
};
use vanillaferric::engines::analytic::{BaroneAdesiWhaleyEngine, BlackScholesEngine, bs_price};
use vanillaferric::engines::tree::{BinomialTreeEngine, TrinomialTreeEngine};
use vanillaferric::pricing::{SweepRequest, run_sweep};
use vanillaferric::vol::ImpliedVolSolver;

// Performance goals (guideline, measured on target hardware):
// - Black-Scholes call with Greeks: < 200 ns
// - Implied vol (Newton path): < 2 µs
// - American binomial (500 steps): < 1 ms

fn benchmark_contract(option_type: OptionType) -> OptionContract {
    OptionContract::new(100.0, 100.0, 1.0, 0.05, 0.20, 0.0, option_type)
        .expect("benchmark contract should be valid")
}

fn bench_black_scholes(c: &mut Criterion) {
    let contract = benchmark_contract(OptionType::Call);
    let engine = BlackScholesEngine::new();

    c.bench_function("black_scholes_call_with_greeks", |b| {
        b.iter(|| {
            let px = engine
                .price(black_box(&contract))
                .expect("pricing should succeed")
                .price;
            black_box(px)
        })
    });
}

fn bench_barone_adesi_whaley(c: &mut Criterion) {
    let contract = benchmark_contract(OptionType::Put);
    let engine = BaroneAdesiWhaleyEngine::new();

    c.bench_function("baw_american_put", |b| {
        b.iter(|| {
            let px = engine
                .price(black_box(&contract))
                .expect("pricing should succeed")
                .price;
            black_box(px)
        })
    });
}

fn bench_lattice_steps(c: &mut Criterion) {
    let contract = benchmark_contract(OptionType::Put);
    let mut group = c.benchmark_group("american_lattice_put");

    for steps in [100_usize, 500, 1000] {
        let binomial = BinomialTreeEngine::new(steps, ExerciseStyle::American);
        let trinomial = TrinomialTreeEngine::new(steps, ExerciseStyle::American);
        group.bench_with_input(BenchmarkId::new("binomial", steps), &steps, |b, _| {
            b.iter(|| {
                let px = binomial
                    .price(black_box(&contract))
                    .expect("pricing should succeed")
                    .price;
                black_box(px)
            })
        });
        group.bench_with_input(BenchmarkId::new("trinomial", steps), &steps, |b, _| {
            b.iter(|| {
                let px = trinomial
                    .price(black_box(&contract))
                    .expect("pricing should succeed")
                    .price;
                black_box(px)
            })
        });
    }

    group.finish();
}

fn bench_implied_vol(c: &mut Criterion) {
    let solver = ImpliedVolSolver::default();
    let mut group = c.benchmark_group("implied_vol");

    for (name, strike, vol) in [("newton_atm", 100.0, 0.3), ("bisection_otm", 150.0, 1.2)] {
        let contract = OptionContract::new(100.0, strike, 1.0, 0.05, vol, 0.0, OptionType::Call)
            .expect("benchmark contract should be valid");
        let market = bs_price(&contract);
        group.bench_with_input(BenchmarkId::from_parameter(name), &market, |b, &market| {
            b.iter(|| {
                let result = solver
                    .solve(
                        OptionType::Call,
                        100.0,
                        black_box(strike),
                        1.0,
                        0.05,
                        0.0,
                        black_box(market),
                    )
                    .expect("solve should succeed");
                black_box(result.vol)
            })
        });
    }

    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let strikes: Vec<f64> = (0..21).map(|i| 80.0 + 2.0 * i as f64).collect();
    let maturities = vec![0.25, 0.5, 1.0, 2.0];
    let mut request = SweepRequest::new(AnalyticModel::Bsm.into(), 100.0, strikes, maturities, 0.2);
    request.rate = 0.05;
    request.include_greeks = true;

    c.bench_function("bsm_sweep_21x4", |b| {
        b.iter(|| black_box(run_sweep(black_box(&request))).len())
    });
}

criterion_group!(
    pricing_benches,
    bench_black_scholes,
    bench_barone_adesi_whaley,
    bench_lattice_steps,
    bench_implied_vol,
    bench_sweep
);
criterion_main!(pricing_benches);
