//! Module `engines::tree::trinomial`.
//!
//! Recombining trinomial lattice in log-price with spacing `dr = σ√(3dt)`.
//!
//! Branch probabilities come from second-order moment matching:
//! `pu = 1/6 + ν√dt / (2σ√3)`, `pd = 1/6 - ν√dt / (2σ√3)` with `ν = r - c - σ²/2`.
//! A negative `pu` or `pd` is floored at zero and `pm` is taken as the complement.
//! The floor keeps total probability at one but does not restore the variance match, so
//! when `|ν|√dt` is large relative to `σ` (few steps, high drift, low vol) prices are biased
//! and `pm` itself can go negative. [`trinomial_probabilities`] reports whether the floor
//! was applied.
//!
//! References: Hull (11th ed.) Ch. 21, Boyle (1986).

use serde::{Deserialize, Serialize};

use crate::core::{
    DiagKey, Diagnostics, ExerciseStyle, OptionContract, PricingEngine, PricingError,
    PricingResult, Result, ensure_finite,
};

/// Recombining trinomial tree engine for vanilla options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrinomialTreeEngine {
    /// Number of tree steps.
    pub steps: usize,
    /// Exercise rights applied at interior nodes.
    pub exercise: ExerciseStyle,
}

impl TrinomialTreeEngine {
    /// Creates a trinomial tree engine with the provided number of steps and exercise style.
    pub fn new(steps: usize, exercise: ExerciseStyle) -> Self {
        Self { steps, exercise }
    }
}

/// Per-step branch probabilities of the trinomial lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrinomialProbabilities {
    pub up: f64,
    pub mid: f64,
    pub down: f64,
    /// True when `up` or `down` was floored at zero.
    pub clamped: bool,
}

/// Branch probabilities used by the trinomial lattice for `steps` steps.
///
/// # Errors
/// [`PricingError::InvalidInput`] when `steps == 0`.
pub fn trinomial_probabilities(
    contract: &OptionContract,
    steps: usize,
) -> Result<TrinomialProbabilities> {
    if steps == 0 {
        return Err(PricingError::invalid("steps", "must be at least 1, got 0"));
    }
    let vol = contract.vol();
    let dt = contract.expiry() / steps as f64;
    let nu = contract.rate() - contract.carry() - 0.5 * vol * vol;
    let tilt = ensure_finite(
        nu * dt.sqrt() / (2.0 * vol * 3.0_f64.sqrt()),
        "trinomial drift term",
    )?;

    let raw_up = 1.0 / 6.0 + tilt;
    let raw_down = 1.0 / 6.0 - tilt;
    let up = raw_up.max(0.0);
    let down = raw_down.max(0.0);
    Ok(TrinomialProbabilities {
        up,
        mid: 1.0 - up - down,
        down,
        clamped: raw_up < 0.0 || raw_down < 0.0,
    })
}

fn log_spacing(contract: &OptionContract, steps: usize) -> Result<f64> {
    let dt = contract.expiry() / steps as f64;
    let dr = contract.vol() * (3.0 * dt).sqrt();
    if !(dr.exp() - 1.0).is_normal() {
        return Err(PricingError::invalid(
            "vol",
            format!("{} gives a degenerate log-price spacing", contract.vol()),
        ));
    }
    Ok(dr)
}

fn roll_back(
    contract: &OptionContract,
    steps: usize,
    exercise: ExerciseStyle,
    dr: f64,
    probs: &TrinomialProbabilities,
) -> Result<f64> {
    let option_type = contract.option_type();
    let strike = contract.strike();
    let growth = dr.exp();
    let lowest = |step: usize| contract.spot() * (-(step as f64) * dr).exp();

    let dt = contract.expiry() / steps as f64;
    let disc = (-contract.rate() * dt).exp();
    let disc_pu = disc * probs.up;
    let disc_pm = disc * probs.mid;
    let disc_pd = disc * probs.down;

    // Node k of a layer sits at spot * e^((k - step) dr); its children are k, k + 1, k + 2
    // in the next layer.
    let mut values = vec![0.0_f64; 2 * steps + 1];
    let mut st = lowest(steps);
    for value in values.iter_mut() {
        *value = option_type.payoff(st, strike);
        st *= growth;
    }

    let is_american = exercise == ExerciseStyle::American;
    for i in (0..steps).rev() {
        let width = 2 * i + 1;
        if is_american {
            let mut st = lowest(i);
            for k in 0..width {
                let continuation = disc_pu.mul_add(
                    values[k + 2],
                    disc_pm.mul_add(values[k + 1], disc_pd * values[k]),
                );
                values[k] = continuation.max(option_type.payoff(st, strike));
                st *= growth;
            }
        } else {
            for k in 0..width {
                values[k] = disc_pu.mul_add(
                    values[k + 2],
                    disc_pm.mul_add(values[k + 1], disc_pd * values[k]),
                );
            }
        }
    }

    ensure_finite(values[0], "trinomial root value")
}

/// Trinomial price of the contract with `steps` steps.
///
/// # Errors
/// [`PricingError::InvalidInput`] when `steps == 0` or the volatility is too small to
/// separate the nodes, [`PricingError::NumericalError`] when the root value is not finite.
pub fn trinomial_price(
    contract: &OptionContract,
    steps: usize,
    exercise: ExerciseStyle,
) -> Result<f64> {
    let probs = trinomial_probabilities(contract, steps)?;
    let dr = log_spacing(contract, steps)?;
    roll_back(contract, steps, exercise, dr, &probs)
}

impl PricingEngine for TrinomialTreeEngine {
    fn price(&self, contract: &OptionContract) -> Result<PricingResult> {
        let probs = trinomial_probabilities(contract, self.steps)?;
        let dr = log_spacing(contract, self.steps)?;
        let price = roll_back(contract, self.steps, self.exercise, dr, &probs)?;

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(DiagKey::NumSteps, self.steps as f64);
        diagnostics.insert(DiagKey::Dr, dr);
        diagnostics.insert(DiagKey::Pu, probs.up);
        diagnostics.insert(DiagKey::Pm, probs.mid);
        diagnostics.insert(DiagKey::Pd, probs.down);

        Ok(PricingResult::price_only(price, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OptionType;
    use crate::engines::analytic::black_scholes::bs_price;
    use crate::engines::tree::binomial::binomial_price;
    use approx::assert_relative_eq;

    fn contract(option_type: OptionType) -> OptionContract {
        OptionContract::new(100.0, 100.0, 1.0, 0.05, 0.2, 0.0, option_type).unwrap()
    }

    #[test]
    fn probabilities_sum_to_one_with_two_thirds_middle() {
        let probs = trinomial_probabilities(&contract(OptionType::Call), 50).unwrap();
        assert!(!probs.clamped);
        assert_relative_eq!(probs.mid, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(probs.up + probs.mid + probs.down, 1.0, epsilon = 1e-15);
        assert!(probs.up > probs.down);
    }

    #[test]
    fn extreme_drift_floors_down_probability() {
        let c = OptionContract::new(100.0, 100.0, 1.0, 0.5, 0.05, 0.0, OptionType::Call).unwrap();
        let probs = trinomial_probabilities(&c, 1).unwrap();
        assert!(probs.clamped);
        assert_eq!(probs.down, 0.0);
        assert_relative_eq!(probs.up + probs.mid, 1.0, epsilon = 1e-15);
        assert!(probs.mid < 0.0);
    }

    #[test]
    fn european_call_approaches_black_scholes() {
        let c = contract(OptionType::Call);
        let bs = bs_price(&c);
        let mut last_err = f64::INFINITY;
        for steps in [10, 50, 200] {
            let err = (trinomial_price(&c, steps, ExerciseStyle::European).unwrap() - bs).abs();
            assert!(err < last_err, "steps={steps} err={err} last={last_err}");
            last_err = err;
        }
        assert!(last_err < 0.02);
    }

    #[test]
    fn american_put_matches_binomial_within_tolerance() {
        let p = contract(OptionType::Put);
        let tri = trinomial_price(&p, 500, ExerciseStyle::American).unwrap();
        let bin = binomial_price(&p, 500, ExerciseStyle::American).unwrap();
        assert_relative_eq!(tri, 6.0866, epsilon = 2e-3);
        assert!(
            (tri - bin).abs() <= 0.01,
            "trinomial/binomial mismatch: tri={tri} bin={bin}"
        );
    }

    #[test]
    fn zero_steps_and_vanishing_vol_are_rejected() {
        let err =
            trinomial_price(&contract(OptionType::Put), 0, ExerciseStyle::American).unwrap_err();
        assert_eq!(err.parameter(), Some("steps"));

        let c =
            OptionContract::new(100.0, 100.0, 1.0, 0.0, 1.0e-300, 0.0, OptionType::Put).unwrap();
        let err = trinomial_price(&c, 10, ExerciseStyle::European).unwrap_err();
        assert_eq!(err.parameter(), Some("vol"));
    }

    #[test]
    fn engine_reports_branch_probabilities() {
        let result = TrinomialTreeEngine::new(20, ExerciseStyle::European)
            .price(&contract(OptionType::Call))
            .unwrap();
        let pu = result.diagnostics.get(DiagKey::Pu).unwrap();
        let pm = result.diagnostics.get(DiagKey::Pm).unwrap();
        let pd = result.diagnostics.get(DiagKey::Pd).unwrap();
        assert_relative_eq!(pu + pm + pd, 1.0, epsilon = 1e-15);
        assert_eq!(result.diagnostics.get(DiagKey::NumSteps), Some(20.0));
    }
}
