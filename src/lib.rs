//! VanillaFerric prices European and American vanilla options and their risk
//! sensitivities under Black-Scholes-Merton with a continuous yield / cost-of-carry.
//!
//! The crate provides:
//! - closed-form BSM prices and Greeks,
//! - the Barone-Adesi-Whaley quadratic approximation for American exercise,
//! - Cox-Ross-Rubinstein binomial and log-space trinomial lattices with European or
//!   American exercise,
//! - a Newton + bisection implied-volatility solver,
//! - a batch driver over strike × maturity grids with CSV output.
//!
//! References used across modules include:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 13, 15, 17 and 21.
//! - Barone-Adesi and Whaley (1987) for the quadratic approximation.
//! - Cox, Ross and Rubinstein (1979) and Boyle (1986) for the lattices.
//!
//! Every pricing call is a pure function of a validated [`core::OptionContract`]. Invalid or
//! degenerate inputs surface as [`core::PricingError`]; no routine returns NaN or infinity.
//!
//! # Feature Flags
//! - `cli` (default): builds the `vanillaferric` command-line binary.
//!
//! # Quick Start
//! Price a Black-Scholes call with Greeks:
//! ```rust
//! use vanillaferric::core::{AnalyticModel, OptionContract};
//! use vanillaferric::pricing::price_analytic;
//!
//! let contract = OptionContract::builder()
//!     .spot(100.0)
//!     .strike(100.0)
//!     .expiry(1.0)
//!     .rate(0.05)
//!     .vol(0.2)
//!     .call()
//!     .build()
//!     .unwrap();
//! let result = price_analytic(AnalyticModel::Bsm, &contract).unwrap();
//! assert!((result.price - 10.4506).abs() < 1e-3);
//! let greeks = result.greeks.unwrap();
//! assert!(greeks.delta > 0.0 && greeks.gamma > 0.0 && greeks.vega > 0.0);
//! ```
//!
//! Price an American put on a lattice:
//! ```rust
//! use vanillaferric::core::{ExerciseStyle, LatticeModel, OptionContract, OptionType};
//! use vanillaferric::pricing::price_lattice;
//!
//! let put = OptionContract::new(100.0, 100.0, 1.0, 0.05, 0.2, 0.0, OptionType::Put).unwrap();
//! let american = price_lattice(LatticeModel::Binomial, &put, 200, ExerciseStyle::American).unwrap();
//! let european = price_lattice(LatticeModel::Binomial, &put, 200, ExerciseStyle::European).unwrap();
//! assert!(american > european);
//! ```
//!
//! Invert implied volatility:
//! ```rust
//! use vanillaferric::core::OptionType;
//! use vanillaferric::engines::analytic::black_scholes;
//! use vanillaferric::pricing::implied_volatility;
//!
//! let market = black_scholes(OptionType::Call, 100.0, 105.0, 1.0, 0.02, 0.25, 0.01).unwrap();
//! let sigma = implied_volatility(market, 100.0, 105.0, 1.0, 0.02, 0.01, OptionType::Call).unwrap();
//! assert!((sigma - 0.25).abs() < 1.0e-6);
//! ```

pub mod config;
pub mod core;
pub mod engines;
pub mod math;
pub mod pricing;
pub mod vol;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::config::{EngineConfig, LatticeConfig, ParameterLimits};
    pub use crate::core::*;
    pub use crate::engines::analytic::*;
    pub use crate::engines::tree::*;
    pub use crate::pricing::{Pricer, price_analytic, price_lattice};
    pub use crate::vol::*;
}
