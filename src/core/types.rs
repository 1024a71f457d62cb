use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::PricingError;

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Immediate-exercise payoff `max(±(spot - strike), 0)`.
    #[inline]
    pub fn payoff(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

/// Exercise rights for a lattice-priced option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseStyle {
    /// Exercise only at expiry.
    European,
    /// Exercise at any node up to expiry.
    #[default]
    American,
}

impl ExerciseStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::European => "european",
            Self::American => "american",
        }
    }
}

/// Closed-form model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticModel {
    /// Black-Scholes-Merton, European exercise.
    Bsm,
    /// Barone-Adesi-Whaley quadratic approximation, American exercise.
    Baw,
}

impl AnalyticModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bsm => "bsm",
            Self::Baw => "baw",
        }
    }

    /// Exercise style implied by the model.
    pub fn exercise(self) -> ExerciseStyle {
        match self {
            Self::Bsm => ExerciseStyle::European,
            Self::Baw => ExerciseStyle::American,
        }
    }
}

/// Lattice model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatticeModel {
    /// Cox-Ross-Rubinstein binomial tree.
    Binomial,
    /// Log-space trinomial tree.
    Trinomial,
}

impl LatticeModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binomial => "binomial",
            Self::Trinomial => "trinomial",
        }
    }
}

/// Any supported pricing model, as named by collaborators (`bsm`, `baw`, `binomial`, `trinomial`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Model {
    Analytic(AnalyticModel),
    Lattice(LatticeModel),
}

impl Model {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analytic(m) => m.as_str(),
            Self::Lattice(m) => m.as_str(),
        }
    }
}

impl From<AnalyticModel> for Model {
    fn from(model: AnalyticModel) -> Self {
        Self::Analytic(model)
    }
}

impl From<LatticeModel> for Model {
    fn from(model: LatticeModel) -> Self {
        Self::Lattice(model)
    }
}

impl TryFrom<String> for Model {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.as_str().to_string()
    }
}

fn unknown(kind: &'static str, value: &str) -> PricingError {
    PricingError::UnknownVariant {
        kind,
        value: value.to_string(),
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            _ => Err(unknown("option type", s)),
        }
    }
}

impl FromStr for ExerciseStyle {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "european" => Ok(Self::European),
            "american" => Ok(Self::American),
            _ => Err(unknown("exercise style", s)),
        }
    }
}

impl FromStr for AnalyticModel {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bsm" => Ok(Self::Bsm),
            "baw" => Ok(Self::Baw),
            _ => Err(unknown("analytic model", s)),
        }
    }
}

impl FromStr for LatticeModel {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binomial" => Ok(Self::Binomial),
            "trinomial" => Ok(Self::Trinomial),
            _ => Err(unknown("lattice model", s)),
        }
    }
}

impl FromStr for Model {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(model) = s.parse::<AnalyticModel>() {
            return Ok(Self::Analytic(model));
        }
        s.parse::<LatticeModel>()
            .map(Self::Lattice)
            .map_err(|_| unknown("model", s))
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(
    OptionType,
    ExerciseStyle,
    AnalyticModel,
    LatticeModel,
    Model
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("CALL".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" Put ".parse::<OptionType>().unwrap(), OptionType::Put);
        assert_eq!(
            "American".parse::<ExerciseStyle>().unwrap(),
            ExerciseStyle::American
        );
        assert_eq!(
            "BAW".parse::<Model>().unwrap(),
            Model::Analytic(AnalyticModel::Baw)
        );
        assert_eq!(
            "trinomial".parse::<Model>().unwrap(),
            Model::Lattice(LatticeModel::Trinomial)
        );
    }

    #[test]
    fn unknown_variants_are_rejected() {
        let err = "straddle".parse::<OptionType>().unwrap_err();
        assert_eq!(
            err,
            PricingError::UnknownVariant {
                kind: "option type",
                value: "straddle".to_string()
            }
        );
        assert!("monte_carlo".parse::<Model>().is_err());
        assert!("bermudan".parse::<ExerciseStyle>().is_err());
    }

    #[test]
    fn payoff_matches_side() {
        assert_eq!(OptionType::Call.payoff(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.payoff(90.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.payoff(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.payoff(110.0, 100.0), 0.0);
    }

    #[test]
    fn model_serializes_as_lowercase_name() {
        let json = serde_json::to_string(&Model::Lattice(LatticeModel::Binomial)).unwrap();
        assert_eq!(json, "\"binomial\"");
        let model: Model = serde_json::from_str("\"bsm\"").unwrap();
        assert_eq!(model, Model::Analytic(AnalyticModel::Bsm));
        assert!(serde_json::from_str::<Model>("\"heston\"").is_err());
    }
}
