//! Black-Scholes-Merton implied-volatility inversion.
//!
//! Newton-Raphson on vega from a fixed starting guess, with a bracketed bisection fallback
//! whenever Newton stalls (vega too small) or steps outside the admissible band. Prices at or
//! below the discounted forward intrinsic value carry no time value and map to the floor
//! volatility without iterating.
//!
//! The scalar entry point [`implied_volatility`] returns a best-effort estimate even when
//! the bisection budget runs out; [`ImpliedVolSolver::solve`] additionally reports whether
//! the tolerance was met and which phase produced the answer.

use serde::{Deserialize, Serialize};

use crate::core::{OptionContract, OptionType, PricingError, Result};
use crate::engines::analytic::black_scholes::{bs_price, bs_vega};

/// Volatility returned when the market price has no time value.
pub const IV_FLOOR: f64 = 1.0e-8;

/// Solver tolerances, iteration caps and search band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImpliedVolConfig {
    /// Absolute pricing error accepted as converged.
    pub tolerance: f64,
    /// Iteration cap applied separately to the Newton and bisection phases.
    pub max_iterations: usize,
    pub initial_guess: f64,
    /// Lower end of the search band, also returned as the intrinsic floor.
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Vega below which Newton hands over to bisection.
    pub min_vega: f64,
}

impl Default for ImpliedVolConfig {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-8,
            max_iterations: 100,
            initial_guess: 0.2,
            lower_bound: IV_FLOOR,
            upper_bound: 5.0,
            min_vega: 1.0e-8,
        }
    }
}

impl ImpliedVolConfig {
    /// Checks that the band is ordered and the guess lies inside it.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PricingError::invalid(
                "tolerance",
                format!("must be positive and finite, got {}", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(PricingError::invalid("max_iterations", "must be positive"));
        }
        let ordered = self.lower_bound > 0.0
            && self.upper_bound.is_finite()
            && self.lower_bound < self.upper_bound;
        if !ordered {
            return Err(PricingError::invalid(
                "lower_bound",
                format!(
                    "band [{}, {}] must satisfy 0 < lower < upper",
                    self.lower_bound, self.upper_bound
                ),
            ));
        }
        if !(self.lower_bound..=self.upper_bound).contains(&self.initial_guess) {
            return Err(PricingError::invalid(
                "initial_guess",
                format!(
                    "{} is outside [{}, {}]",
                    self.initial_guess, self.lower_bound, self.upper_bound
                ),
            ));
        }
        if self.min_vega.is_nan() || self.min_vega < 0.0 {
            return Err(PricingError::invalid(
                "min_vega",
                format!("must be non-negative, got {}", self.min_vega),
            ));
        }
        Ok(())
    }
}

/// Which stage of the solver produced the returned volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverPhase {
    /// Market price at or below discounted forward intrinsic; floor returned.
    IntrinsicFloor,
    Newton,
    Bisection,
}

impl SolverPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IntrinsicFloor => "intrinsic_floor",
            Self::Newton => "newton",
            Self::Bisection => "bisection",
        }
    }
}

/// Implied volatility together with convergence information.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolResult {
    pub vol: f64,
    /// False only when bisection exhausted its budget without meeting the tolerance.
    pub converged: bool,
    /// Total pricing evaluations across both phases.
    pub iterations: usize,
    pub phase: SolverPhase,
}

/// Newton + bisection implied-volatility solver.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImpliedVolSolver {
    config: ImpliedVolConfig,
}

impl ImpliedVolSolver {
    /// Creates a solver after validating `config`.
    pub fn new(config: ImpliedVolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ImpliedVolConfig {
        &self.config
    }

    /// Inverts `market_price` to a volatility.
    ///
    /// # Errors
    /// [`PricingError::InvalidInput`] for a negative or non-finite market price, or when
    /// spot, strike, expiry, rate or carry fail contract validation.
    #[allow(clippy::too_many_arguments)]
    pub fn solve(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        expiry: f64,
        rate: f64,
        carry: f64,
        market_price: f64,
    ) -> Result<ImpliedVolResult> {
        if !market_price.is_finite() || market_price < 0.0 {
            return Err(PricingError::invalid(
                "market_price",
                format!("must be non-negative and finite, got {market_price}"),
            ));
        }
        let cfg = &self.config;
        let contract = OptionContract::new(
            spot,
            strike,
            expiry,
            rate,
            cfg.initial_guess,
            carry,
            option_type,
        )?;

        if market_price <= contract.forward_intrinsic() {
            return Ok(ImpliedVolResult {
                vol: cfg.lower_bound,
                converged: true,
                iterations: 0,
                phase: SolverPhase::IntrinsicFloor,
            });
        }

        let mut iterations = 0;
        let mut sigma = cfg.initial_guess;
        for _ in 0..cfg.max_iterations {
            iterations += 1;
            let trial = contract.with_vol(sigma)?;
            let diff = bs_price(&trial) - market_price;
            if diff.abs() < cfg.tolerance {
                return Ok(ImpliedVolResult {
                    vol: sigma,
                    converged: true,
                    iterations,
                    phase: SolverPhase::Newton,
                });
            }

            let vega = bs_vega(&trial);
            if vega.is_nan() || vega < cfg.min_vega {
                break;
            }
            let next = sigma - diff / vega;
            if !(cfg.lower_bound..=cfg.upper_bound).contains(&next) {
                break;
            }
            sigma = next;
        }

        let (mut lo, mut hi) = (cfg.lower_bound, cfg.upper_bound);
        for _ in 0..cfg.max_iterations {
            iterations += 1;
            let mid = 0.5 * (lo + hi);
            let price = bs_price(&contract.with_vol(mid)?);
            if (price - market_price).abs() < cfg.tolerance {
                return Ok(ImpliedVolResult {
                    vol: mid,
                    converged: true,
                    iterations,
                    phase: SolverPhase::Bisection,
                });
            }
            if price > market_price {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        Ok(ImpliedVolResult {
            vol: 0.5 * (lo + hi),
            converged: false,
            iterations,
            phase: SolverPhase::Bisection,
        })
    }
}

/// Implied volatility with the default solver settings.
///
/// Returns the floor `1e-8` when the price is at or below discounted forward intrinsic, and
/// the last bisection midpoint if the tolerance is never reached.
///
/// # Examples
/// ```rust
/// use vanillaferric::core::OptionType;
/// use vanillaferric::vol::implied_volatility;
///
/// let vol = implied_volatility(14.231_254_785_985_819, 100.0, 100.0, 1.0, 0.05, 0.0, OptionType::Call)
///     .unwrap();
/// assert!((vol - 0.3).abs() < 1e-6);
/// ```
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    carry: f64,
    option_type: OptionType,
) -> Result<f64> {
    ImpliedVolSolver::default()
        .solve(option_type, spot, strike, expiry, rate, carry, market_price)
        .map(|result| result.vol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn market(option_type: OptionType, strike: f64, expiry: f64, vol: f64) -> f64 {
        let c = OptionContract::new(100.0, strike, expiry, 0.05, vol, 0.0, option_type).unwrap();
        bs_price(&c)
    }

    fn solve(option_type: OptionType, strike: f64, expiry: f64, price: f64) -> ImpliedVolResult {
        ImpliedVolSolver::default()
            .solve(option_type, 100.0, strike, expiry, 0.05, 0.0, price)
            .unwrap()
    }

    #[test]
    fn recovers_atm_vol_with_newton() {
        let price = market(OptionType::Call, 100.0, 1.0, 0.3);
        let result = solve(OptionType::Call, 100.0, 1.0, price);
        assert_relative_eq!(result.vol, 0.3, epsilon = 1e-6);
        assert!(result.converged);
        assert_eq!(result.phase, SolverPhase::Newton);
        assert!(result.iterations <= 10);
    }

    #[test]
    fn starting_guess_that_already_prices_stops_immediately() {
        let price = market(OptionType::Call, 100.0, 1.0, 0.2);
        let result = solve(OptionType::Call, 100.0, 1.0, price);
        assert_eq!(result.vol, 0.2);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn overshooting_newton_falls_back_to_bisection() {
        let price = market(OptionType::Call, 150.0, 1.0, 1.2);
        let result = solve(OptionType::Call, 150.0, 1.0, price);
        assert_eq!(result.phase, SolverPhase::Bisection);
        assert!(result.converged);
        assert_relative_eq!(result.vol, 1.2, epsilon = 1e-6);
    }

    #[test]
    fn short_dated_put_and_high_vol_call() {
        let put = market(OptionType::Put, 100.0, 0.001, 0.25);
        let short = solve(OptionType::Put, 100.0, 0.001, put);
        assert_relative_eq!(short.vol, 0.25, epsilon = 1e-6);

        let call = market(OptionType::Call, 100.0, 1.0, 3.5);
        let high = solve(OptionType::Call, 100.0, 1.0, call);
        assert_relative_eq!(high.vol, 3.5, epsilon = 1e-6);
    }

    #[test]
    fn price_without_time_value_returns_floor() {
        let result = solve(OptionType::Call, 200.0, 0.25, 0.0);
        assert_eq!(result.vol, IV_FLOOR);
        assert_eq!(result.phase, SolverPhase::IntrinsicFloor);
        assert_eq!(result.iterations, 0);

        // Below discounted forward intrinsic of a deep ITM call.
        let vol =
            implied_volatility(5.0, 100.0, 90.0, 1.0, 0.05, 0.0, OptionType::Call).unwrap();
        assert_eq!(vol, IV_FLOOR);
    }

    #[test]
    fn unreachable_price_exhausts_bisection_at_upper_bound() {
        let result = solve(OptionType::Call, 100.0, 1.0, 99.0);
        assert!(!result.converged);
        assert_eq!(result.phase, SolverPhase::Bisection);
        assert!(result.vol > 4.999 && result.vol <= 5.0);
    }

    #[test]
    fn negative_market_price_is_rejected() {
        let err =
            implied_volatility(-1.0, 100.0, 100.0, 1.0, 0.05, 0.0, OptionType::Put).unwrap_err();
        assert_eq!(err.parameter(), Some("market_price"));

        let err =
            implied_volatility(1.0, 100.0, 100.0, 0.0, 0.05, 0.0, OptionType::Put).unwrap_err();
        assert_eq!(err.parameter(), Some("expiry"));
    }

    #[test]
    fn config_validation() {
        assert!(ImpliedVolConfig::default().validate().is_ok());
        let bad = ImpliedVolConfig {
            initial_guess: 7.0,
            ..ImpliedVolConfig::default()
        };
        assert_eq!(
            ImpliedVolSolver::new(bad).unwrap_err().parameter(),
            Some("initial_guess")
        );
        let inverted = ImpliedVolConfig {
            lower_bound: 6.0,
            ..ImpliedVolConfig::default()
        };
        assert!(inverted.validate().is_err());
    }
}
