//! Caller-facing pricing operations.
//!
//! The free functions here are thin dispatchers over the engines; [`Pricer`] adds the
//! configured policy bounds, lattice defaults and solver settings on top of them.

pub mod sweep;

use tracing::debug;

use crate::config::EngineConfig;
use crate::core::{
    AnalyticModel, ExerciseStyle, LatticeModel, Model, OptionContract, OptionType, PricingEngine,
    PricingResult, Result,
};
use crate::engines::analytic::{BaroneAdesiWhaleyEngine, BlackScholesEngine};
use crate::engines::tree::{
    BinomialTreeEngine, TrinomialTreeEngine, binomial_price, trinomial_price,
};
use crate::vol::{ImpliedVolResult, ImpliedVolSolver};

pub use crate::vol::implied_volatility;
pub use sweep::{
    CellOutcome, IvOutcome, IvRow, SWEEP_GREEKS, SweepRequest, SweepRow, calibrate_implied_vols,
    calibrate_implied_vols_with, run_sweep, run_sweep_within, write_iv_csv, write_sweep_csv,
};

/// European BSM price with Greeks, or the BAW American approximation without Greeks.
///
/// # Examples
/// ```rust
/// use vanillaferric::core::{AnalyticModel, OptionContract, OptionType};
/// use vanillaferric::pricing::price_analytic;
///
/// let contract =
///     OptionContract::new(100.0, 100.0, 1.0, 0.05, 0.2, 0.0, OptionType::Call).unwrap();
/// let bsm = price_analytic(AnalyticModel::Bsm, &contract).unwrap();
/// assert!((bsm.price - 10.4506).abs() < 1e-3);
/// assert_eq!(bsm.greeks_map().len(), 8);
///
/// let put = contract.with_option_type(OptionType::Put);
/// let baw = price_analytic(AnalyticModel::Baw, &put).unwrap();
/// assert!(baw.greeks_map().is_empty());
/// ```
pub fn price_analytic(model: AnalyticModel, contract: &OptionContract) -> Result<PricingResult> {
    match model {
        AnalyticModel::Bsm => BlackScholesEngine::new().price(contract),
        AnalyticModel::Baw => BaroneAdesiWhaleyEngine::new().price(contract),
    }
}

/// Lattice price with `steps` steps and the given exercise style.
pub fn price_lattice(
    model: LatticeModel,
    contract: &OptionContract,
    steps: usize,
    style: ExerciseStyle,
) -> Result<f64> {
    match model {
        LatticeModel::Binomial => binomial_price(contract, steps, style),
        LatticeModel::Trinomial => trinomial_price(contract, steps, style),
    }
}

/// Engine for `model`. Lattice engines take `steps` and `style`; analytic ones ignore them.
pub fn engine_for(model: Model, steps: usize, style: ExerciseStyle) -> Box<dyn PricingEngine> {
    match model {
        Model::Analytic(AnalyticModel::Bsm) => Box::new(BlackScholesEngine::new()),
        Model::Analytic(AnalyticModel::Baw) => Box::new(BaroneAdesiWhaleyEngine::new()),
        Model::Lattice(LatticeModel::Binomial) => Box::new(BinomialTreeEngine::new(steps, style)),
        Model::Lattice(LatticeModel::Trinomial) => Box::new(TrinomialTreeEngine::new(steps, style)),
    }
}

/// Configured entry point enforcing [`crate::config::ParameterLimits`] before pricing.
#[derive(Debug, Clone, Default)]
pub struct Pricer {
    config: EngineConfig,
    solver: ImpliedVolSolver,
}

impl Pricer {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            solver: ImpliedVolSolver::new(config.solver)?,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prices with any model; lattice models use the configured steps and style.
    pub fn price(&self, model: Model, contract: &OptionContract) -> Result<PricingResult> {
        let lattice = self.config.lattice;
        self.price_with(model, contract, lattice.steps, lattice.style)
    }

    /// Prices with explicit lattice steps and style.
    pub fn price_with(
        &self,
        model: Model,
        contract: &OptionContract,
        steps: usize,
        style: ExerciseStyle,
    ) -> Result<PricingResult> {
        self.config.limits.check_contract(contract)?;
        debug!(%model, steps, %style, "pricing contract");
        engine_for(model, steps, style).price(contract)
    }

    /// Implied volatility with convergence details, using the configured solver.
    #[allow(clippy::too_many_arguments)]
    pub fn implied_vol(
        &self,
        option_type: OptionType,
        spot: f64,
        strike: f64,
        expiry: f64,
        rate: f64,
        carry: f64,
        market_price: f64,
    ) -> Result<ImpliedVolResult> {
        self.config
            .limits
            .check_market(spot, strike, expiry, rate, carry)?;
        self.solver
            .solve(option_type, spot, strike, expiry, rate, carry, market_price)
    }

    /// Grid sweep; a cell outside the configured limits fails on its own.
    pub fn sweep(&self, request: &SweepRequest) -> Vec<SweepRow> {
        run_sweep_within(request, &self.config.limits)
    }

    /// Implied-vol strip with the configured solver. Each quote is checked against the
    /// limits separately and a violation is reported as that quote's failure.
    #[allow(clippy::too_many_arguments)]
    pub fn implied_vol_strip(
        &self,
        option_type: OptionType,
        spot: f64,
        strikes: &[f64],
        expiry: f64,
        rate: f64,
        carry: f64,
        market_prices: &[f64],
    ) -> Result<Vec<IvRow>> {
        sweep::invert_strip(strikes, market_prices, |strike, price| {
            self.implied_vol(option_type, spot, strike, expiry, rate, carry, price)
        })
    }
}
