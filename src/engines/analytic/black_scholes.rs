//! Module `engines::analytic::black_scholes`.
//!
//! Closed-form Black-Scholes-Merton price and Greeks for European options with a
//! continuous yield / cost-of-carry `c`:
//!
//! - `d1 = (ln(S/K) + (r - c + σ²/2)T) / (σ√T)`, `d2 = d1 - σ√T`
//! - call `= S e^(-cT) Φ(d1) - K e^(-rT) Φ(d2)`
//! - put `= K e^(-rT) Φ(-d2) - S e^(-cT) Φ(-d1)`
//!
//! References: Hull (11th ed.) Ch. 15 and 17.
//!
//! The kernels take a validated [`OptionContract`], so `T > 0` and `σ > 0` hold and
//! no intrinsic-value fallbacks are needed here.

use crate::core::{
    DiagKey, Diagnostics, Greeks, OptionContract, OptionType, PricingEngine, PricingResult, Result,
    ensure_finite,
};
use crate::math::{normal_cdf, normal_pdf};

/// Analytic Black-Scholes-Merton engine for European vanilla options.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholesEngine;

impl BlackScholesEngine {
    /// Creates a Black-Scholes engine instance.
    pub fn new() -> Self {
        Self
    }
}

#[inline]
pub fn d1_d2(contract: &OptionContract) -> (f64, f64) {
    let vol = contract.vol();
    let expiry = contract.expiry();
    let sig_sqrt_t = vol * expiry.sqrt();
    let d1 = ((contract.spot() / contract.strike()).ln()
        + (contract.rate() - contract.carry() + 0.5 * vol * vol) * expiry)
        / sig_sqrt_t;
    (d1, d1 - sig_sqrt_t)
}

#[inline]
pub fn bs_price(contract: &OptionContract) -> f64 {
    let (d1, d2) = d1_d2(contract);
    let spot_fwd = contract.spot() * contract.carry_factor();
    let strike_pv = contract.strike() * contract.discount_factor();
    match contract.option_type() {
        OptionType::Call => spot_fwd * normal_cdf(d1) - strike_pv * normal_cdf(d2),
        OptionType::Put => strike_pv * normal_cdf(-d2) - spot_fwd * normal_cdf(-d1),
    }
}

#[inline]
pub fn bs_delta(contract: &OptionContract) -> f64 {
    let (d1, _) = d1_d2(contract);
    let df_c = contract.carry_factor();
    match contract.option_type() {
        OptionType::Call => df_c * normal_cdf(d1),
        OptionType::Put => -df_c * normal_cdf(-d1),
    }
}

#[inline]
pub fn bs_gamma(contract: &OptionContract) -> f64 {
    let (d1, _) = d1_d2(contract);
    contract.carry_factor() * normal_pdf(d1)
        / (contract.spot() * contract.vol() * contract.expiry().sqrt())
}

#[inline]
pub fn bs_vega(contract: &OptionContract) -> f64 {
    let (d1, _) = d1_d2(contract);
    contract.spot() * contract.carry_factor() * normal_pdf(d1) * contract.expiry().sqrt()
}

/// Annual theta, `∂V/∂t` (negative for time decay).
#[inline]
pub fn bs_theta(contract: &OptionContract) -> f64 {
    let (d1, d2) = d1_d2(contract);
    let spot_fwd = contract.spot() * contract.carry_factor();
    let strike_pv = contract.strike() * contract.discount_factor();
    let decay = -spot_fwd * normal_pdf(d1) * contract.vol() / (2.0 * contract.expiry().sqrt());
    match contract.option_type() {
        OptionType::Call => {
            decay - contract.rate() * strike_pv * normal_cdf(d2)
                + contract.carry() * spot_fwd * normal_cdf(d1)
        }
        OptionType::Put => {
            decay + contract.rate() * strike_pv * normal_cdf(-d2)
                - contract.carry() * spot_fwd * normal_cdf(-d1)
        }
    }
}

#[inline]
pub fn bs_rho(contract: &OptionContract) -> f64 {
    let (_, d2) = d1_d2(contract);
    let strike_pv_t = contract.strike() * contract.expiry() * contract.discount_factor();
    match contract.option_type() {
        OptionType::Call => strike_pv_t * normal_cdf(d2),
        OptionType::Put => -strike_pv_t * normal_cdf(-d2),
    }
}

/// All first-order Greeks plus gamma in one pass.
pub fn bs_greeks(contract: &OptionContract) -> Greeks {
    Greeks {
        delta: bs_delta(contract),
        gamma: bs_gamma(contract),
        vega: bs_vega(contract),
        theta: bs_theta(contract),
        rho: bs_rho(contract),
    }
}

impl PricingEngine for BlackScholesEngine {
    fn price(&self, contract: &OptionContract) -> Result<PricingResult> {
        let (d1, d2) = d1_d2(contract);
        let price = ensure_finite(bs_price(contract), "black-scholes price")?;
        let greeks = bs_greeks(contract);
        for (value, what) in [
            (greeks.delta, "delta"),
            (greeks.gamma, "gamma"),
            (greeks.vega, "vega"),
            (greeks.theta, "theta"),
            (greeks.rho, "rho"),
        ] {
            ensure_finite(value, what)?;
        }

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(DiagKey::D1, d1);
        diagnostics.insert(DiagKey::D2, d2);

        Ok(PricingResult {
            price,
            greeks: Some(greeks),
            diagnostics,
        })
    }
}

/// One-liner convenience wrapper for Black-Scholes-Merton pricing.
///
/// # Examples
/// ```rust
/// use vanillaferric::core::OptionType;
/// use vanillaferric::engines::analytic::black_scholes;
///
/// let px = black_scholes(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.2, 0.0).unwrap();
/// assert!((px - 10.4506).abs() < 1e-3);
/// ```
pub fn black_scholes(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    vol: f64,
    carry: f64,
) -> Result<f64> {
    let contract = OptionContract::new(spot, strike, expiry, rate, vol, carry, option_type)?;
    Ok(BlackScholesEngine::new().price(&contract)?.price)
}
