//! Serde payloads for pricing outputs and JSON helpers.
//!
//! # Examples
//! ```rust
//! use vanillaferric::core::{from_json, to_json, OptionContract, OptionType};
//!
//! let contract = OptionContract::new(100.0, 95.0, 0.5, 0.03, 0.25, 0.01, OptionType::Put).unwrap();
//! let json = to_json(&contract).expect("json serialization");
//! let decoded: OptionContract = from_json(&json).expect("json deserialization");
//! assert_eq!(decoded, contract);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{GreeksMap, Model, OptionContract, PricingResult};

/// Pricing audit record: what was priced, with which model, and the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingReport {
    pub model: Model,
    pub contract: OptionContract,
    pub price: f64,
    /// Empty for models without closed-form Greeks.
    #[serde(default)]
    pub greeks: GreeksMap,
}

impl PricingReport {
    pub fn new(model: Model, contract: OptionContract, result: &PricingResult) -> Self {
        Self {
            model,
            contract,
            price: result.price,
            greeks: result.greeks_map(),
        }
    }

    /// Copy with price and Greeks rounded to `decimals` places, for display.
    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            price: round_to(self.price, decimals),
            greeks: self
                .greeks
                .iter()
                .map(|(&name, &value)| (name, round_to(value, decimals)))
                .collect(),
            ..self.clone()
        }
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Serialize a value to compact JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Serialize a value to pretty-printed JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}
