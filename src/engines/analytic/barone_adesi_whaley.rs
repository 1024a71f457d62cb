//! Module `engines::analytic::barone_adesi_whaley`.
//!
//! Quadratic approximation for American vanilla options.
//!
//! With `b = r - c - σ²/2`, the characteristic quadratic has roots
//! `q = (-b ± √(b² + 2rσ²)) / σ²`; the positive root `q2` drives calls and the
//! negative root `q1` drives puts. The critical exercise price is `S* = K / (1 - 1/q)`.
//!
//! - Call: if `c >= r` the price is exactly the European BSM price. Otherwise spot at or
//!   above `S*` is worth `S - K`, and below it the European value plus
//!   `A2 (S/S*)^q2` with `A2 = (S*/q2)(1 - e^(-cT) Φ(d1 + σ√T))`.
//! - Put: spot at or below `S*` is worth `K - S`; above it the European value plus
//!   `A1 (S/S*)^q1` with `A1 = (-S*/q1)(1 - e^(-cT) Φ(-(d1 + σ√T)))`.
//!
//! The put has no `c >= r` shortcut. The boundary is the perpetual one, so the
//! premium is larger than what a fine lattice gives for finite maturities.
//!
//! References: Barone-Adesi and Whaley (1987), J. Finance 42(2).

use crate::core::{
    DiagKey, Diagnostics, OptionContract, OptionType, PricingEngine, PricingError, PricingResult,
    Result, ensure_finite,
};
use crate::engines::analytic::black_scholes::{bs_price, d1_d2};
use crate::math::normal_cdf;

/// Roots and denominators closer to zero than this are treated as degenerate.
const DEGENERATE_EPS: f64 = 1.0e-10;

/// Barone-Adesi-Whaley American approximation engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaroneAdesiWhaleyEngine;

impl BaroneAdesiWhaleyEngine {
    pub fn new() -> Self {
        Self
    }
}

/// Early-exercise boundary for one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExerciseBoundary {
    /// Quadratic root (`q2 > 0` for calls, `q1 < 0` for puts).
    pub root: f64,
    /// Critical exercise price `S*`.
    pub critical_price: f64,
}

fn quadratic_root(contract: &OptionContract) -> Result<f64> {
    let vol = contract.vol();
    let vol_sq = vol * vol;
    if vol_sq < f64::MIN_POSITIVE {
        return Err(PricingError::invalid(
            "vol",
            format!("{vol} is too small for the early-exercise quadratic"),
        ));
    }

    let r = contract.rate();
    let b = r - contract.carry() - 0.5 * vol_sq;
    let discriminant = b * b + 2.0 * r * vol_sq;
    if discriminant.is_nan() || discriminant < 0.0 {
        return Err(PricingError::NumericalError(format!(
            "early-exercise quadratic has no real roots (discriminant {discriminant})"
        )));
    }

    let root = match contract.option_type() {
        OptionType::Call => (-b + discriminant.sqrt()) / vol_sq,
        OptionType::Put => (-b - discriminant.sqrt()) / vol_sq,
    };
    let root = ensure_finite(root, "early-exercise root")?;
    if root.abs() < DEGENERATE_EPS {
        return Err(PricingError::NumericalError(
            "early-exercise root is zero".to_string(),
        ));
    }
    Ok(root)
}

fn exercise_boundary(contract: &OptionContract) -> Result<ExerciseBoundary> {
    let root = quadratic_root(contract)?;
    let denom = 1.0 - 1.0 / root;
    if denom.abs() < DEGENERATE_EPS {
        return Err(PricingError::NumericalError(format!(
            "critical price denominator 1 - 1/q vanishes (q = {root})"
        )));
    }
    let critical_price = contract.strike() / denom;
    if !critical_price.is_finite() || critical_price <= 0.0 {
        return Err(PricingError::NumericalError(format!(
            "critical exercise price {critical_price} is not a positive finite level"
        )));
    }
    Ok(ExerciseBoundary {
        root,
        critical_price,
    })
}

/// Critical exercise boundary `S*`, or `None` for a call with `c >= r`,
/// where early exercise never pays.
pub fn critical_exercise_price(contract: &OptionContract) -> Result<Option<ExerciseBoundary>> {
    if contract.option_type() == OptionType::Call && contract.carry() >= contract.rate() {
        return Ok(None);
    }
    exercise_boundary(contract).map(Some)
}

/// Approximate American price for the contract's side.
///
/// # Errors
/// [`PricingError::NumericalError`] or [`PricingError::InvalidInput`] when the quadratic
/// degenerates (vanishing `σ²`, a zero root, or `1 - 1/q` vanishing, as for a call with
/// `c = 0 < r`).
pub fn baw_price(contract: &OptionContract) -> Result<f64> {
    let Some(boundary) = critical_exercise_price(contract)? else {
        return ensure_finite(bs_price(contract), "european price");
    };
    price_with_boundary(contract, &boundary)
}

fn price_with_boundary(contract: &OptionContract, boundary: &ExerciseBoundary) -> Result<f64> {
    let spot = contract.spot();
    let strike = contract.strike();
    let ExerciseBoundary {
        root,
        critical_price,
    } = *boundary;

    let exercise_now = match contract.option_type() {
        OptionType::Call => spot >= critical_price,
        OptionType::Put => spot <= critical_price,
    };
    if exercise_now {
        return Ok(contract.option_type().payoff(spot, strike));
    }

    let european = bs_price(contract);
    let (d1, _) = d1_d2(contract);
    let shifted = d1 + contract.vol() * contract.expiry().sqrt();
    let coefficient = match contract.option_type() {
        OptionType::Call => {
            (critical_price / root) * (1.0 - contract.carry_factor() * normal_cdf(shifted))
        }
        OptionType::Put => {
            (-critical_price / root) * (1.0 - contract.carry_factor() * normal_cdf(-shifted))
        }
    };
    let premium = coefficient * (spot / critical_price).powf(root);
    ensure_finite(european + premium, "american approximation")
}

/// American call approximation. The contract's side is overridden to call.
pub fn baw_american_call(contract: &OptionContract) -> Result<f64> {
    baw_price(&contract.with_option_type(OptionType::Call))
}

/// American put approximation. The contract's side is overridden to put.
pub fn baw_american_put(contract: &OptionContract) -> Result<f64> {
    baw_price(&contract.with_option_type(OptionType::Put))
}

impl PricingEngine for BaroneAdesiWhaleyEngine {
    fn price(&self, contract: &OptionContract) -> Result<PricingResult> {
        let mut diagnostics = Diagnostics::new();
        let price = match critical_exercise_price(contract)? {
            None => ensure_finite(bs_price(contract), "european price")?,
            Some(boundary) => {
                let key = match contract.option_type() {
                    OptionType::Call => DiagKey::Q2,
                    OptionType::Put => DiagKey::Q1,
                };
                diagnostics.insert(key, boundary.root);
                diagnostics.insert(DiagKey::CriticalPrice, boundary.critical_price);
                price_with_boundary(contract, &boundary)?
            }
        };
        Ok(PricingResult::price_only(price, diagnostics))
    }
}
