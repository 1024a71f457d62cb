//! VanillaFerric CLI - command-line pricing, implied volatility and grid sweeps.
//!
//! # Commands
//!
//! - `vanillaferric price` - price one contract with bsm, baw, binomial or trinomial
//! - `vanillaferric iv` - invert a market price to an implied volatility
//! - `vanillaferric sweep` - price a strike × maturity grid to CSV
//! - `vanillaferric iv-strip` - invert a strip of quotes at one expiry to CSV
//!
//! Logs go to stderr and are filtered by `RUST_LOG`; results go to stdout or `--output`.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use vanillaferric::config::{ConfigError, EngineConfig};
use vanillaferric::core::serialization::{PricingReport, round_to};
use vanillaferric::core::{
    ExerciseStyle, Model, OptionContract, OptionType, PricingError, to_json_pretty,
};
use vanillaferric::pricing::{Pricer, SweepRequest, write_iv_csv, write_sweep_csv};
use vanillaferric::vol::SolverPhase;

/// Decimal places used for JSON output.
const OUTPUT_DECIMALS: i32 = 6;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

type Result<T> = std::result::Result<T, CliError>;

/// Vanilla option pricing from the command line
#[derive(Parser)]
#[command(name = "vanillaferric")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Market inputs shared by every command.
#[derive(Args)]
struct MarketArgs {
    /// Spot price
    #[arg(long)]
    spot: f64,

    /// Risk-free rate, continuously compounded
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rate: f64,

    /// Continuous yield / cost-of-carry
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    carry: f64,

    /// Option side (call, put)
    #[arg(short = 't', long, default_value = "call")]
    option_type: OptionType,
}

#[derive(Subcommand)]
enum Commands {
    /// Price one contract
    Price {
        #[command(flatten)]
        market: MarketArgs,

        /// Model (bsm, baw, binomial, trinomial)
        #[arg(short, long, default_value = "bsm")]
        model: Model,

        #[arg(long)]
        strike: f64,

        /// Time to expiry in years
        #[arg(long)]
        expiry: f64,

        #[arg(long)]
        vol: f64,

        /// Lattice steps (default from config)
        #[arg(long)]
        steps: Option<usize>,

        /// Lattice exercise style (default from config)
        #[arg(long)]
        style: Option<ExerciseStyle>,
    },

    /// Invert a market price to an implied volatility
    Iv {
        #[command(flatten)]
        market: MarketArgs,

        /// Observed option premium
        #[arg(long)]
        price: f64,

        #[arg(long)]
        strike: f64,

        /// Time to expiry in years
        #[arg(long)]
        expiry: f64,
    },

    /// Price a strike × maturity grid and write CSV
    Sweep {
        #[command(flatten)]
        market: MarketArgs,

        /// Model (bsm, baw, binomial, trinomial)
        #[arg(short, long, default_value = "bsm")]
        model: Model,

        /// Comma-separated strikes
        #[arg(long, value_delimiter = ',', required = true)]
        strikes: Vec<f64>,

        /// Comma-separated maturities in years
        #[arg(long, value_delimiter = ',', required = true)]
        maturities: Vec<f64>,

        #[arg(long)]
        vol: f64,

        /// Lattice steps (default from config)
        #[arg(long)]
        steps: Option<usize>,

        /// Lattice exercise style (default from config)
        #[arg(long)]
        style: Option<ExerciseStyle>,

        /// Add Greek columns (bsm only)
        #[arg(long)]
        greeks: bool,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Invert one quote per strike at a single expiry and write CSV
    IvStrip {
        #[command(flatten)]
        market: MarketArgs,

        /// Comma-separated strikes
        #[arg(long, value_delimiter = ',', required = true)]
        strikes: Vec<f64>,

        /// Comma-separated market prices, one per strike
        #[arg(long, value_delimiter = ',', required = true)]
        prices: Vec<f64>,

        /// Time to expiry in years
        #[arg(long)]
        expiry: f64,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct IvReport {
    implied_volatility: f64,
    converged: bool,
    iterations: usize,
    phase: SolverPhase,
}

fn output_writer(output: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    })
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading engine configuration");
            EngineConfig::from_path(path)?
        }
        None => EngineConfig::default(),
    };
    let lattice = config.lattice;

    match cli.command {
        Commands::Price {
            market,
            model,
            strike,
            expiry,
            vol,
            steps,
            style,
        } => {
            let pricer = Pricer::new(config)?;
            let contract = OptionContract::new(
                market.spot,
                strike,
                expiry,
                market.rate,
                vol,
                market.carry,
                market.option_type,
            )?;
            let result = pricer.price_with(
                model,
                &contract,
                steps.unwrap_or(lattice.steps),
                style.unwrap_or(lattice.style),
            )?;
            info!(%model, price = result.price, "priced contract");
            let report = PricingReport::new(model, contract, &result).rounded(OUTPUT_DECIMALS);
            println!("{}", to_json_pretty(&report)?);
        }
        Commands::Iv {
            market,
            price,
            strike,
            expiry,
        } => {
            let pricer = Pricer::new(config)?;
            let result = pricer.implied_vol(
                market.option_type,
                market.spot,
                strike,
                expiry,
                market.rate,
                market.carry,
                price,
            )?;
            info!(
                phase = result.phase.as_str(),
                converged = result.converged,
                "solved implied vol"
            );
            let report = IvReport {
                implied_volatility: round_to(result.vol, OUTPUT_DECIMALS),
                converged: result.converged,
                iterations: result.iterations,
                phase: result.phase,
            };
            println!("{}", to_json_pretty(&report)?);
        }
        Commands::Sweep {
            market,
            model,
            strikes,
            maturities,
            vol,
            steps,
            style,
            greeks,
            output,
        } => {
            let request = SweepRequest {
                model,
                spot: market.spot,
                strikes,
                maturities,
                rate: market.rate,
                vol,
                carry: market.carry,
                option_type: market.option_type,
                exercise: style.unwrap_or(lattice.style),
                steps: steps.unwrap_or(lattice.steps),
                include_greeks: greeks,
            };
            let rows = Pricer::new(config)?.sweep(&request);
            let failed = rows.iter().filter(|r| r.outcome.error().is_some()).count();
            info!(cells = rows.len(), failed, "sweep complete");
            write_sweep_csv(&rows, greeks, output_writer(output.as_ref())?)?;
        }
        Commands::IvStrip {
            market,
            strikes,
            prices,
            expiry,
            output,
        } => {
            let rows = Pricer::new(config)?.implied_vol_strip(
                market.option_type,
                market.spot,
                &strikes,
                expiry,
                market.rate,
                market.carry,
                &prices,
            )?;
            info!(quotes = rows.len(), "implied vol strip complete");
            write_iv_csv(&rows, output_writer(output.as_ref())?)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}
