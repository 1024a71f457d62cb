//! Core traits, common domain types, and library-wide result/error structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod contract;
pub mod serialization;
pub mod types;

pub use contract::{OptionContract, OptionContractBuilder};
pub use serialization::{from_json, to_json, to_json_pretty};
pub use types::*;

/// Library-wide result alias.
pub type Result<T> = std::result::Result<T, PricingError>;

/// Engine and model errors surfaced by the API.
///
/// Every variant is a domain error: the call was rejected before a price was
/// produced, so no NaN or infinity ever escapes a pricing routine.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PricingError {
    /// Input validation error naming the offending parameter.
    #[error("invalid input: {parameter} {reason}")]
    InvalidInput {
        parameter: &'static str,
        reason: String,
    },
    /// Unrecognised option kind, model, or exercise style.
    #[error("unknown {kind} `{value}`")]
    UnknownVariant { kind: &'static str, value: String },
    /// Degenerate intermediate value inside a formula (zero denominator, overflow).
    #[error("numerical error: {0}")]
    NumericalError(String),
    /// Parameter outside the configured policy bounds.
    #[error("{parameter} = {value} is outside the allowed range [{min}, {max}]")]
    LimitViolation {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl PricingError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter,
            reason: reason.into(),
        }
    }

    /// Name of the offending parameter, when the error is tied to one.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            Self::InvalidInput { parameter, .. } | Self::LimitViolation { parameter, .. } => {
                Some(parameter)
            }
            Self::UnknownVariant { kind, .. } => Some(kind),
            Self::NumericalError(_) => None,
        }
    }
}

/// Fixed Greek names used by the analytic engine's named map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GreekName {
    #[serde(rename = "Delta")]
    Delta,
    #[serde(rename = "Gamma")]
    Gamma,
    #[serde(rename = "Vega (per 1.0 vol)")]
    Vega,
    #[serde(rename = "Vega (per 1% vol)")]
    VegaPct,
    #[serde(rename = "Theta (annual)")]
    Theta,
    #[serde(rename = "Theta (per day)")]
    ThetaDaily,
    #[serde(rename = "Rho (per 1.0 rate)")]
    Rho,
    #[serde(rename = "Rho (per 1% rate)")]
    RhoPct,
}

impl GreekName {
    pub const ALL: [GreekName; 8] = [
        Self::Delta,
        Self::Gamma,
        Self::Vega,
        Self::VegaPct,
        Self::Theta,
        Self::ThetaDaily,
        Self::Rho,
        Self::RhoPct,
    ];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delta => "Delta",
            Self::Gamma => "Gamma",
            Self::Vega => "Vega (per 1.0 vol)",
            Self::VegaPct => "Vega (per 1% vol)",
            Self::Theta => "Theta (annual)",
            Self::ThetaDaily => "Theta (per day)",
            Self::Rho => "Rho (per 1.0 rate)",
            Self::RhoPct => "Rho (per 1% rate)",
        }
    }
}

impl std::str::FromStr for GreekName {
    type Err = PricingError;

    fn from_str(key: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == key)
            .ok_or_else(|| PricingError::UnknownVariant {
                kind: "greek",
                value: key.to_string(),
            })
    }
}

/// Named Greeks keyed by their display label. Price is never part of the map.
pub type GreeksMap = BTreeMap<GreekName, f64>;

/// Standardized Greeks container used by engine results.
///
/// Values are per unit of the underlying quantity and theta is per year;
/// the scaled conventions are available through the accessor methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// First derivative to spot.
    pub delta: f64,
    /// Second derivative to spot.
    pub gamma: f64,
    /// First derivative to volatility.
    pub vega: f64,
    /// Time decay per year.
    pub theta: f64,
    /// First derivative to rate.
    pub rho: f64,
}

impl Greeks {
    /// Vega per one volatility point.
    #[inline]
    pub fn vega_per_pct(&self) -> f64 {
        self.vega * 0.01
    }

    /// Rho per one rate point.
    #[inline]
    pub fn rho_per_pct(&self) -> f64 {
        self.rho * 0.01
    }

    /// Theta per calendar day.
    #[inline]
    pub fn theta_per_day(&self) -> f64 {
        self.theta / 365.0
    }

    pub fn get(&self, name: GreekName) -> f64 {
        match name {
            GreekName::Delta => self.delta,
            GreekName::Gamma => self.gamma,
            GreekName::Vega => self.vega,
            GreekName::VegaPct => self.vega_per_pct(),
            GreekName::Theta => self.theta,
            GreekName::ThetaDaily => self.theta_per_day(),
            GreekName::Rho => self.rho,
            GreekName::RhoPct => self.rho_per_pct(),
        }
    }

    /// All eight named variants.
    pub fn to_map(&self) -> GreeksMap {
        GreekName::ALL
            .into_iter()
            .map(|name| (name, self.get(name)))
            .collect()
    }
}

/// Compact key set for engine diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagKey {
    CriticalPrice,
    D,
    D1,
    D2,
    Dr,
    NumSteps,
    Pd,
    Pm,
    Pu,
    Q1,
    Q2,
    U,
}

impl DiagKey {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CriticalPrice => "critical_price",
            Self::D => "d",
            Self::D1 => "d1",
            Self::D2 => "d2",
            Self::Dr => "dr",
            Self::NumSteps => "num_steps",
            Self::Pd => "pd",
            Self::Pm => "pm",
            Self::Pu => "pu",
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::U => "u",
        }
    }
}

const DIAGNOSTICS_CAPACITY: usize = 8;

/// Inline diagnostics storage used in [`PricingResult`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: [Option<(DiagKey, f64)>; DIAGNOSTICS_CAPACITY],
}

impl Diagnostics {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries[0].is_none()
    }

    /// Inserts or overwrites a value. New keys beyond the eight inline slots are dropped.
    #[inline]
    pub fn insert(&mut self, key: DiagKey, value: f64) -> Option<f64> {
        for (entry_key, existing) in self.entries.iter_mut().flatten() {
            if *entry_key == key {
                let prev = *existing;
                *existing = value;
                return Some(prev);
            }
        }

        if let Some(slot) = self.entries.iter_mut().find(|entry| entry.is_none()) {
            *slot = Some((key, value));
        }
        None
    }

    #[inline]
    pub fn get(&self, key: DiagKey) -> Option<f64> {
        self.iter()
            .find_map(|(entry_key, value)| (entry_key == key).then_some(value))
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (DiagKey, f64)> + '_ {
        self.entries.iter().filter_map(|entry| *entry)
    }
}

/// Unified engine result payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult {
    /// Present value.
    pub price: f64,
    /// Greeks when available from the engine (analytic BSM only).
    pub greeks: Option<Greeks>,
    /// Engine-specific scalar diagnostics.
    pub diagnostics: Diagnostics,
}

impl PricingResult {
    pub(crate) fn price_only(price: f64, diagnostics: Diagnostics) -> Self {
        Self {
            price,
            greeks: None,
            diagnostics,
        }
    }

    /// Named Greeks map, empty when the engine does not produce Greeks.
    pub fn greeks_map(&self) -> GreeksMap {
        self.greeks.map(|g| g.to_map()).unwrap_or_default()
    }
}

/// Pricing engine abstraction over a validated contract.
pub trait PricingEngine {
    /// Prices the contract. Implementations are pure and hold no per-call state.
    fn price(&self, contract: &OptionContract) -> Result<PricingResult>;
}

/// Fails with [`PricingError::NumericalError`] unless `value` is finite.
#[inline]
pub(crate) fn ensure_finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::NumericalError(format!(
            "{what} is not finite ({value})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_greeks() -> Greeks {
        Greeks {
            delta: 0.6,
            gamma: 0.02,
            vega: 37.5,
            theta: -6.5,
            rho: 53.0,
        }
    }

    #[test]
    fn scaled_variants_follow_conventions() {
        let g = sample_greeks();
        assert_relative_eq!(g.vega_per_pct(), 0.375, epsilon = 1e-15);
        assert_relative_eq!(g.rho_per_pct(), 0.53, epsilon = 1e-15);
        assert_relative_eq!(g.theta_per_day(), -6.5 / 365.0, epsilon = 1e-15);
    }

    #[test]
    fn named_map_has_every_label_and_no_price() {
        let map = sample_greeks().to_map();
        assert_eq!(map.len(), 8);
        assert_eq!(map[&GreekName::VegaPct], 0.375);
        let json = serde_json::to_value(&map).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("Theta (per day)"));
        assert!(obj.contains_key("Rho (per 1% rate)"));
        assert!(!obj.contains_key("Price"));
    }

    #[test]
    fn greek_names_round_trip_through_labels() {
        for name in GreekName::ALL {
            assert_eq!(name.as_str().parse::<GreekName>().unwrap(), name);
        }
        assert!("Vanna".parse::<GreekName>().is_err());
    }

    #[test]
    fn diagnostics_overwrite_and_lookup() {
        let mut diag = Diagnostics::new();
        assert!(diag.is_empty());
        assert_eq!(diag.insert(DiagKey::D1, 0.35), None);
        assert_eq!(diag.insert(DiagKey::D1, 0.40), Some(0.35));
        diag.insert(DiagKey::NumSteps, 100.0);
        assert_eq!(diag.len(), 2);
        assert_eq!(diag.get(DiagKey::D1), Some(0.40));
        assert_eq!(diag.get(DiagKey::Pu), None);
    }

    #[test]
    fn diagnostics_drop_keys_past_capacity() {
        let keys = [
            DiagKey::CriticalPrice,
            DiagKey::D,
            DiagKey::D1,
            DiagKey::D2,
            DiagKey::Dr,
            DiagKey::NumSteps,
            DiagKey::Pd,
            DiagKey::Pm,
            DiagKey::Pu,
        ];
        let mut diag = Diagnostics::new();
        for (i, key) in keys.into_iter().enumerate() {
            diag.insert(key, i as f64);
        }
        assert_eq!(diag.len(), DIAGNOSTICS_CAPACITY);
        assert_eq!(diag.get(DiagKey::Pm), Some(7.0));
        assert_eq!(diag.get(DiagKey::Pu), None);
        assert_eq!(diag.insert(DiagKey::D, -1.0), Some(1.0));
    }

    #[test]
    fn error_reports_offending_parameter() {
        let err = PricingError::invalid("expiry", "must be > 0, got 0");
        assert_eq!(err.parameter(), Some("expiry"));
        assert!(err.to_string().contains("expiry"));
        assert_eq!(PricingError::NumericalError("x".into()).parameter(), None);
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PricingError>();
    }
}
