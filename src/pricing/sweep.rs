//! Batch driver over strike × maturity grids and strike strips of market quotes.
//!
//! Each cell carries its own outcome. A cell that cannot be priced is reported as
//! [`CellOutcome::Failed`] with the engine error and logged at `warn`; it never turns
//! into a NaN price.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ParameterLimits;
use crate::core::{
    ExerciseStyle, GreekName, Greeks, Model, OptionContract, OptionType, PricingError, Result,
};
use crate::pricing::engine_for;
use crate::vol::{ImpliedVolResult, ImpliedVolSolver};

/// Greek columns written by [`write_sweep_csv`].
pub const SWEEP_GREEKS: [GreekName; 5] = [
    GreekName::Delta,
    GreekName::Gamma,
    GreekName::VegaPct,
    GreekName::ThetaDaily,
    GreekName::RhoPct,
];

fn default_option_type() -> OptionType {
    OptionType::Call
}

fn default_steps() -> usize {
    100
}

/// Grid pricing request. Strikes form the outer loop, maturities the inner one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepRequest {
    pub model: Model,
    pub spot: f64,
    pub strikes: Vec<f64>,
    pub maturities: Vec<f64>,
    #[serde(default)]
    pub rate: f64,
    pub vol: f64,
    #[serde(default)]
    pub carry: f64,
    #[serde(default = "default_option_type")]
    pub option_type: OptionType,
    /// Only used by lattice models.
    #[serde(default)]
    pub exercise: ExerciseStyle,
    /// Only used by lattice models.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Greeks are only produced by `bsm`.
    #[serde(default)]
    pub include_greeks: bool,
}

impl SweepRequest {
    /// Request with zero rate and carry, calls, American lattice exercise, 100 steps and no
    /// Greeks.
    pub fn new(
        model: Model,
        spot: f64,
        strikes: Vec<f64>,
        maturities: Vec<f64>,
        vol: f64,
    ) -> Self {
        Self {
            model,
            spot,
            strikes,
            maturities,
            rate: 0.0,
            vol,
            carry: 0.0,
            option_type: default_option_type(),
            exercise: ExerciseStyle::default(),
            steps: default_steps(),
            include_greeks: false,
        }
    }

    /// Exercise style reported for every row: the requested one for lattices, the model's
    /// own style for analytic models.
    pub fn reported_style(&self) -> ExerciseStyle {
        match self.model {
            Model::Analytic(model) => model.exercise(),
            Model::Lattice(_) => self.exercise,
        }
    }

    fn contract(&self, strike: f64, maturity: f64) -> Result<OptionContract> {
        OptionContract::new(
            self.spot,
            strike,
            maturity,
            self.rate,
            self.vol,
            self.carry,
            self.option_type,
        )
    }
}

/// Result of pricing one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    Priced { price: f64, greeks: Option<Greeks> },
    Failed { error: PricingError },
}

impl CellOutcome {
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Priced { price, .. } => Some(*price),
            Self::Failed { .. } => None,
        }
    }

    pub fn greeks(&self) -> Option<&Greeks> {
        match self {
            Self::Priced { greeks, .. } => greeks.as_ref(),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&PricingError> {
        match self {
            Self::Priced { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}

/// One row of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub strike: f64,
    pub maturity: f64,
    pub model: Model,
    pub style: ExerciseStyle,
    pub outcome: CellOutcome,
}

fn price_cell(
    request: &SweepRequest,
    limits: &ParameterLimits,
    strike: f64,
    maturity: f64,
) -> Result<CellOutcome> {
    if maturity <= 0.0 {
        return Ok(CellOutcome::Priced {
            price: request.option_type.payoff(request.spot, strike),
            greeks: None,
        });
    }
    let contract = request.contract(strike, maturity)?;
    limits.check_contract(&contract)?;
    let result = engine_for(request.model, request.steps, request.exercise).price(&contract)?;
    Ok(CellOutcome::Priced {
        price: result.price,
        greeks: if request.include_greeks {
            result.greeks
        } else {
            None
        },
    })
}

/// Prices every `(strike, maturity)` pair of the request.
///
/// # Examples
/// ```rust
/// use vanillaferric::core::AnalyticModel;
/// use vanillaferric::pricing::{SweepRequest, run_sweep};
///
/// let (strikes, maturities) = (vec![90.0, 110.0], vec![0.5, 1.0]);
/// let mut request = SweepRequest::new(AnalyticModel::Bsm.into(), 100.0, strikes, maturities, 0.2);
/// request.rate = 0.05;
/// let rows = run_sweep(&request);
/// assert_eq!(rows.len(), 4);
/// assert_eq!(rows[1].strike, 90.0);
/// assert_eq!(rows[1].maturity, 1.0);
/// ```
pub fn run_sweep(request: &SweepRequest) -> Vec<SweepRow> {
    run_sweep_within(request, &ParameterLimits::disabled())
}

/// [`run_sweep`] with every priced contract checked against `limits`. A cell outside them
/// fails with [`PricingError::LimitViolation`]; expired cells are intrinsic and unchecked.
pub fn run_sweep_within(request: &SweepRequest, limits: &ParameterLimits) -> Vec<SweepRow> {
    debug!(
        model = %request.model,
        strikes = request.strikes.len(),
        maturities = request.maturities.len(),
        "running sweep"
    );
    let style = request.reported_style();
    let mut rows = Vec::with_capacity(request.strikes.len() * request.maturities.len());
    for &strike in &request.strikes {
        for &maturity in &request.maturities {
            let outcome = price_cell(request, limits, strike, maturity).unwrap_or_else(|error| {
                warn!(strike, maturity, %error, "sweep cell failed");
                CellOutcome::Failed { error }
            });
            rows.push(SweepRow {
                strike,
                maturity,
                model: request.model,
                style,
                outcome,
            });
        }
    }
    rows
}

/// Result of inverting one quote of a strike strip.
#[derive(Debug, Clone, PartialEq)]
pub enum IvOutcome {
    Solved(ImpliedVolResult),
    /// Quote was not strictly positive; no inversion attempted.
    Skipped,
    Failed(PricingError),
}

impl IvOutcome {
    pub fn vol(&self) -> Option<f64> {
        match self {
            Self::Solved(result) => Some(result.vol),
            Self::Skipped | Self::Failed(_) => None,
        }
    }
}

/// One row of an implied-vol strip.
#[derive(Debug, Clone, PartialEq)]
pub struct IvRow {
    pub strike: f64,
    pub market_price: f64,
    pub outcome: IvOutcome,
}

/// Inverts one quote per strike at a single expiry using the default solver.
///
/// # Errors
/// [`PricingError::InvalidInput`] when `strikes` and `market_prices` differ in length.
pub fn calibrate_implied_vols(
    spot: f64,
    strikes: &[f64],
    expiry: f64,
    rate: f64,
    carry: f64,
    market_prices: &[f64],
    option_type: OptionType,
) -> Result<Vec<IvRow>> {
    calibrate_implied_vols_with(
        &ImpliedVolSolver::default(),
        spot,
        strikes,
        expiry,
        rate,
        carry,
        market_prices,
        option_type,
    )
}

/// [`calibrate_implied_vols`] with an explicit solver.
#[allow(clippy::too_many_arguments)]
pub fn calibrate_implied_vols_with(
    solver: &ImpliedVolSolver,
    spot: f64,
    strikes: &[f64],
    expiry: f64,
    rate: f64,
    carry: f64,
    market_prices: &[f64],
    option_type: OptionType,
) -> Result<Vec<IvRow>> {
    invert_strip(strikes, market_prices, |strike, price| {
        solver.solve(option_type, spot, strike, expiry, rate, carry, price)
    })
}

/// Pairs strikes with quotes and inverts every positive quote with `solve(strike, price)`.
pub(crate) fn invert_strip(
    strikes: &[f64],
    market_prices: &[f64],
    solve: impl Fn(f64, f64) -> Result<ImpliedVolResult>,
) -> Result<Vec<IvRow>> {
    if strikes.len() != market_prices.len() {
        let (quotes, count) = (market_prices.len(), strikes.len());
        return Err(PricingError::invalid(
            "market_prices",
            format!("has {quotes} quotes for {count} strikes"),
        ));
    }

    let rows = strikes
        .iter()
        .zip(market_prices)
        .map(|(&strike, &market_price)| {
            let outcome = if market_price > 0.0 {
                match solve(strike, market_price) {
                    Ok(result) => IvOutcome::Solved(result),
                    Err(error) => {
                        warn!(strike, market_price, %error, "implied vol inversion failed");
                        IvOutcome::Failed(error)
                    }
                }
            } else {
                IvOutcome::Skipped
            };
            IvRow {
                strike,
                market_price,
                outcome,
            }
        })
        .collect();
    Ok(rows)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes sweep rows as CSV with a header. Greek columns are written when
/// `include_greeks` is set and left empty for rows without Greeks.
pub fn write_sweep_csv<W: io::Write>(
    rows: &[SweepRow],
    include_greeks: bool,
    writer: W,
) -> std::result::Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Strike", "Maturity", "Price", "Model", "Style"];
    if include_greeks {
        header.extend(SWEEP_GREEKS.iter().map(|name| name.as_str()));
    }
    header.push("Error");
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.strike.to_string(),
            row.maturity.to_string(),
            cell(row.outcome.price()),
            row.model.to_string(),
            row.style.to_string(),
        ];
        if include_greeks {
            let greeks = row.outcome.greeks();
            record.extend(
                SWEEP_GREEKS
                    .iter()
                    .map(|&name| cell(greeks.map(|g| g.get(name)))),
            );
        }
        record.push(
            row.outcome
                .error()
                .map(ToString::to_string)
                .unwrap_or_default(),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes an implied-vol strip as CSV with a header.
pub fn write_iv_csv<W: io::Write>(
    rows: &[IvRow],
    writer: W,
) -> std::result::Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Strike",
        "MarketPrice",
        "ImpliedVol",
        "Converged",
        "Status",
        "Error",
    ])?;
    for row in rows {
        let (converged, status, error) = match &row.outcome {
            IvOutcome::Solved(result) => (result.converged.to_string(), "solved", String::new()),
            IvOutcome::Skipped => (String::new(), "skipped", String::new()),
            IvOutcome::Failed(error) => (String::new(), "failed", error.to_string()),
        };
        wtr.write_record([
            row.strike.to_string(),
            row.market_price.to_string(),
            cell(row.outcome.vol()),
            converged,
            status.to_string(),
            error,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
