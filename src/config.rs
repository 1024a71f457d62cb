//! Engine configuration: parameter policy bounds, solver settings and lattice defaults.
//!
//! Every field has a default, so an empty TOML document is a valid configuration.
//!
//! ```toml
//! [limits]
//! enforce = true
//! vol = { min = 1e-6, max = 5.0 }
//!
//! [solver]
//! tolerance = 1e-10
//!
//! [lattice]
//! steps = 500
//! style = "european"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::{ExerciseStyle, OptionContract, PricingError, Result};
use crate::vol::ImpliedVolConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] PricingError),
}

/// Inclusive `[min, max]` range for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Policy bounds re-validated at the [`crate::pricing::Pricer`] boundary.
///
/// These are caller policy, not model requirements: the engines accept anything a valid
/// [`OptionContract`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterLimits {
    /// When false, [`Self::check_contract`] and [`Self::check_market`] always pass.
    pub enforce: bool,
    pub spot: Bounds,
    pub strike: Bounds,
    pub expiry: Bounds,
    pub rate: Bounds,
    pub vol: Bounds,
    pub carry: Bounds,
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            enforce: true,
            spot: Bounds::new(0.01, f64::INFINITY),
            strike: Bounds::new(0.01, f64::INFINITY),
            expiry: Bounds::new(1.0e-6, 10.0),
            rate: Bounds::new(-1.0, 1.0),
            vol: Bounds::new(1.0e-6, 5.0),
            carry: Bounds::new(0.0, 1.0),
        }
    }
}

fn check(parameter: &'static str, value: f64, bounds: &Bounds) -> Result<()> {
    if bounds.contains(value) {
        return Ok(());
    }
    debug!(
        parameter,
        value,
        min = bounds.min,
        max = bounds.max,
        "parameter limit violated"
    );
    Err(PricingError::LimitViolation {
        parameter,
        value,
        min: bounds.min,
        max: bounds.max,
    })
}

impl ParameterLimits {
    /// Limits that accept everything.
    pub fn disabled() -> Self {
        Self {
            enforce: false,
            ..Self::default()
        }
    }

    /// Checks every contract field, reporting the first violation.
    pub fn check_contract(&self, contract: &OptionContract) -> Result<()> {
        if !self.enforce {
            return Ok(());
        }
        self.check_market(
            contract.spot(),
            contract.strike(),
            contract.expiry(),
            contract.rate(),
            contract.carry(),
        )?;
        check("vol", contract.vol(), &self.vol)
    }

    /// Checks the inputs of an implied-volatility solve (everything except vol).
    pub fn check_market(
        &self,
        spot: f64,
        strike: f64,
        expiry: f64,
        rate: f64,
        carry: f64,
    ) -> Result<()> {
        if !self.enforce {
            return Ok(());
        }
        check("spot", spot, &self.spot)?;
        check("strike", strike, &self.strike)?;
        check("expiry", expiry, &self.expiry)?;
        check("rate", rate, &self.rate)?;
        check("carry", carry, &self.carry)
    }

    fn validate(&self) -> Result<()> {
        for (parameter, bounds) in [
            ("spot", self.spot),
            ("strike", self.strike),
            ("expiry", self.expiry),
            ("rate", self.rate),
            ("vol", self.vol),
            ("carry", self.carry),
        ] {
            let Bounds { min, max } = bounds;
            if min.is_nan() || max.is_nan() || min > max {
                return Err(PricingError::invalid(
                    parameter,
                    format!("limits [{min}, {max}] are not an ordered range"),
                ));
            }
        }
        Ok(())
    }
}

/// Defaults for lattice pricing when the caller does not specify them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatticeConfig {
    pub steps: usize,
    pub style: ExerciseStyle,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            style: ExerciseStyle::American,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub limits: ParameterLimits,
    pub solver: ImpliedVolConfig,
    pub lattice: LatticeConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        self.solver.validate()?;
        if self.lattice.steps == 0 {
            return Err(PricingError::invalid("steps", "must be at least 1, got 0"));
        }
        Ok(())
    }
}
