//! Module `engines::tree::binomial`.
//!
//! Cox-Ross-Rubinstein binomial lattice for European and American vanilla options.
//!
//! With `dt = T/n`, the up factor is `u = e^(σ√dt)`, `d = 1/u`, the risk-neutral up
//! probability is `q = (e^((r-c)dt) - d) / (u - d)` and each step discounts by `R = e^(r·dt)`.
//! Only the terminal layer is materialized; backward induction overwrites it in place.
//!
//! References: Hull (11th ed.) Ch. 13, Cox-Ross-Rubinstein (1979).
//!
//! Numerical considerations: European prices converge to BSM at first order in `n` with
//! the usual odd/even oscillation; `q` leaves `[0, 1]` when `|r - c|·√dt` is large relative
//! to `σ`, which is reported as an error.

use crate::core::{
    DiagKey, Diagnostics, ExerciseStyle, OptionContract, PricingEngine, PricingError,
    PricingResult, Result, ensure_finite,
};

/// Cox-Ross-Rubinstein binomial tree engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinomialTreeEngine {
    /// Number of tree steps.
    pub steps: usize,
    /// Exercise rights applied at interior nodes.
    pub exercise: ExerciseStyle,
}

impl BinomialTreeEngine {
    /// Creates a tree engine with the given number of steps and exercise style.
    pub fn new(steps: usize, exercise: ExerciseStyle) -> Self {
        Self { steps, exercise }
    }
}

struct Lattice {
    u: f64,
    q: f64,
    disc_q: f64,
    disc_1mq: f64,
    /// Log-spacing `σ√dt`.
    log_step: f64,
}

fn build_lattice(contract: &OptionContract, steps: usize) -> Result<Lattice> {
    if steps == 0 {
        return Err(PricingError::invalid("steps", "must be at least 1, got 0"));
    }

    let dt = contract.expiry() / steps as f64;
    let log_step = contract.vol() * dt.sqrt();
    let u = log_step.exp();
    let d = 1.0 / u;
    if !(u - d).is_normal() {
        return Err(PricingError::invalid(
            "vol",
            format!("{} gives a degenerate up/down spread", contract.vol()),
        ));
    }

    let growth = ((contract.rate() - contract.carry()) * dt).exp();
    let q = (growth - d) / (u - d);
    if !q.is_finite() || !(0.0..=1.0).contains(&q) {
        return Err(PricingError::NumericalError(format!(
            "risk-neutral probability {q} is outside [0, 1]"
        )));
    }

    let disc = (-contract.rate() * dt).exp();
    Ok(Lattice {
        u,
        q,
        disc_q: disc * q,
        disc_1mq: disc * (1.0 - q),
        log_step,
    })
}

fn roll_back(
    contract: &OptionContract,
    steps: usize,
    exercise: ExerciseStyle,
    lattice: &Lattice,
) -> Result<f64> {
    let option_type = contract.option_type();
    let strike = contract.strike();
    // spot * u^j * d^(n-j) = spot * d^n * (u/d)^j
    let ratio = lattice.u * lattice.u;
    let lowest = |step: usize| contract.spot() * (-(step as f64) * lattice.log_step).exp();

    let mut values = vec![0.0_f64; steps + 1];
    let mut st = lowest(steps);
    for value in values.iter_mut() {
        *value = option_type.payoff(st, strike);
        st *= ratio;
    }

    let is_american = exercise == ExerciseStyle::American;
    for i in (0..steps).rev() {
        if is_american {
            let mut st = lowest(i);
            for j in 0..=i {
                let continuation = lattice
                    .disc_q
                    .mul_add(values[j + 1], lattice.disc_1mq * values[j]);
                values[j] = continuation.max(option_type.payoff(st, strike));
                st *= ratio;
            }
        } else {
            for j in 0..=i {
                values[j] = lattice
                    .disc_q
                    .mul_add(values[j + 1], lattice.disc_1mq * values[j]);
            }
        }
    }

    ensure_finite(values[0], "binomial root value")
}

/// Binomial price of the contract with `steps` steps.
///
/// # Errors
/// [`PricingError::InvalidInput`] when `steps == 0`, [`PricingError::NumericalError`] when the
/// risk-neutral probability leaves `[0, 1]` or the root value is not finite.
pub fn binomial_price(
    contract: &OptionContract,
    steps: usize,
    exercise: ExerciseStyle,
) -> Result<f64> {
    let lattice = build_lattice(contract, steps)?;
    roll_back(contract, steps, exercise, &lattice)
}

impl PricingEngine for BinomialTreeEngine {
    fn price(&self, contract: &OptionContract) -> Result<PricingResult> {
        let lattice = build_lattice(contract, self.steps)?;
        let price = roll_back(contract, self.steps, self.exercise, &lattice)?;

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(DiagKey::NumSteps, self.steps as f64);
        diagnostics.insert(DiagKey::U, lattice.u);
        diagnostics.insert(DiagKey::D, 1.0 / lattice.u);
        diagnostics.insert(DiagKey::Pu, lattice.q);

        Ok(PricingResult::price_only(price, diagnostics))
    }
}
