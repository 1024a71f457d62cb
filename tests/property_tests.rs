//! Property-based tests using proptest.
//!
//! No-arbitrage identities and solver round trips checked over random market inputs.

use proptest::prelude::*;
use vanillaferric::core::{ExerciseStyle, LatticeModel, OptionContract, OptionType};
use vanillaferric::engines::analytic::black_scholes::{bs_greeks, bs_price};
use vanillaferric::pricing::price_lattice;
use vanillaferric::vol::ImpliedVolSolver;

proptest! {
    /// C - P = S e^(-cT) - K e^(-rT) for every valid input.
    #[test]
    fn put_call_parity_holds(
        spot in 50.0_f64..150.0,
        strike in 50.0_f64..150.0,
        expiry in 0.05_f64..5.0,
        rate in -0.02_f64..0.10,
        vol in 0.05_f64..1.0,
        carry in 0.0_f64..0.08,
    ) {
        let call = OptionContract::new(spot, strike, expiry, rate, vol, carry, OptionType::Call)
            .unwrap();
        let put = call.with_option_type(OptionType::Put);
        let lhs = bs_price(&call) - bs_price(&put);
        let rhs = spot * (-carry * expiry).exp() - strike * (-rate * expiry).exp();
        prop_assert!((lhs - rhs).abs() < 1e-8, "parity gap {}", lhs - rhs);
    }
}

proptest! {
    /// Gamma and vega are non-negative; call delta lies in [0, e^(-cT)].
    #[test]
    fn greeks_have_expected_signs(
        strike in 50.0_f64..150.0,
        expiry in 0.05_f64..5.0,
        rate in 0.0_f64..0.10,
        vol in 0.05_f64..1.0,
        carry in 0.0_f64..0.08,
    ) {
        let call = OptionContract::new(100.0, strike, expiry, rate, vol, carry, OptionType::Call)
            .unwrap();
        let g = bs_greeks(&call);
        prop_assert!(g.gamma >= 0.0);
        prop_assert!(g.vega >= 0.0);
        prop_assert!(g.delta >= 0.0 && g.delta <= call.carry_factor() + 1e-15);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Early exercise rights never reduce value, and an American lattice price is never
    /// below immediate exercise.
    #[test]
    fn american_lattice_dominates_european(
        strike in 80.0_f64..120.0,
        expiry in 0.25_f64..2.0,
        rate in 0.0_f64..0.08,
        vol in 0.1_f64..0.8,
        carry in 0.0_f64..0.05,
        steps in 20_usize..120,
        put in any::<bool>(),
    ) {
        let option_type = if put { OptionType::Put } else { OptionType::Call };
        let c = OptionContract::new(100.0, strike, expiry, rate, vol, carry, option_type).unwrap();
        for model in [LatticeModel::Binomial, LatticeModel::Trinomial] {
            let american = price_lattice(model, &c, steps, ExerciseStyle::American).unwrap();
            let european = price_lattice(model, &c, steps, ExerciseStyle::European).unwrap();
            prop_assert!(american >= european - 1e-12, "{model:?}: {american} < {european}");
            prop_assert!(american >= c.intrinsic());
        }
    }
}

proptest! {
    /// Inverting a model price reprices it within 1e-6.
    #[test]
    fn implied_vol_reprices_market_quote(
        strike in 90.0_f64..110.0,
        expiry in 0.25_f64..2.0,
        vol in 0.1_f64..0.8,
        rate in 0.0_f64..0.08,
        carry in 0.0_f64..0.05,
        put in any::<bool>(),
    ) {
        let option_type = if put { OptionType::Put } else { OptionType::Call };
        let c = OptionContract::new(100.0, strike, expiry, rate, vol, carry, option_type).unwrap();
        let market = bs_price(&c);

        let result = ImpliedVolSolver::default()
            .solve(option_type, 100.0, strike, expiry, rate, carry, market)
            .unwrap();
        prop_assert!(result.converged);
        let repriced = bs_price(&c.with_vol(result.vol).unwrap());
        prop_assert!((repriced - market).abs() < 1e-6);
        prop_assert!((result.vol - vol).abs() < 1e-4);
    }
}
