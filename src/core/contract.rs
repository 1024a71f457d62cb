//! Canonical option contract used by every engine.
//!
//! [`OptionContract`] bundles the full BSM parameter tuple: spot `S`, strike `K`,
//! expiry `T` in years, continuously compounded rate `r`, volatility `σ`,
//! continuous yield / cost-of-carry `c`, and the option side.
//! The value is immutable once built; every constructor validates, so engines
//! can assume `S, K, T, σ > 0` and finite `r`, `c`.
//! Deserialization goes through the same validation.

use serde::{Deserialize, Serialize};

use crate::core::{OptionType, PricingError, Result};

/// Validated vanilla option contract.
///
/// # Examples
/// ```
/// use vanillaferric::core::{OptionContract, OptionType};
///
/// let contract = OptionContract::new(100.0, 100.0, 1.0, 0.05, 0.2, 0.0, OptionType::Call).unwrap();
/// assert_eq!(contract.vol(), 0.2);
///
/// assert!(OptionContract::new(100.0, 100.0, 0.0, 0.05, 0.2, 0.0, OptionType::Call).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OptionContractRaw", into = "OptionContractRaw")]
pub struct OptionContract {
    spot: f64,
    strike: f64,
    expiry: f64,
    rate: f64,
    vol: f64,
    carry: f64,
    option_type: OptionType,
}

#[derive(Serialize, Deserialize)]
struct OptionContractRaw {
    spot: f64,
    strike: f64,
    expiry: f64,
    #[serde(default)]
    rate: f64,
    vol: f64,
    #[serde(default)]
    carry: f64,
    option_type: OptionType,
}

impl TryFrom<OptionContractRaw> for OptionContract {
    type Error = PricingError;

    fn try_from(raw: OptionContractRaw) -> Result<Self> {
        Self::new(
            raw.spot,
            raw.strike,
            raw.expiry,
            raw.rate,
            raw.vol,
            raw.carry,
            raw.option_type,
        )
    }
}

impl From<OptionContract> for OptionContractRaw {
    fn from(c: OptionContract) -> Self {
        Self {
            spot: c.spot,
            strike: c.strike,
            expiry: c.expiry,
            rate: c.rate,
            vol: c.vol,
            carry: c.carry,
            option_type: c.option_type,
        }
    }
}

fn positive(value: f64, parameter: &'static str) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PricingError::invalid(
            parameter,
            format!("must be positive and finite, got {value}"),
        ));
    }
    Ok(value)
}

fn finite(value: f64, parameter: &'static str) -> Result<f64> {
    if !value.is_finite() {
        return Err(PricingError::invalid(
            parameter,
            format!("must be finite, got {value}"),
        ));
    }
    Ok(value)
}

impl OptionContract {
    /// Builds a contract, rejecting `T <= 0`, `σ <= 0`, non-positive spot or strike,
    /// and non-finite values.
    pub fn new(
        spot: f64,
        strike: f64,
        expiry: f64,
        rate: f64,
        vol: f64,
        carry: f64,
        option_type: OptionType,
    ) -> Result<Self> {
        Ok(Self {
            spot: positive(spot, "spot")?,
            strike: positive(strike, "strike")?,
            expiry: positive(expiry, "expiry")?,
            rate: finite(rate, "rate")?,
            vol: positive(vol, "vol")?,
            carry: finite(carry, "carry")?,
            option_type,
        })
    }

    /// Starts a contract builder.
    #[inline]
    pub fn builder() -> OptionContractBuilder {
        OptionContractBuilder::default()
    }

    /// Returns a copy with a different volatility, validated like [`Self::new`].
    pub fn with_vol(self, vol: f64) -> Result<Self> {
        Ok(Self {
            vol: positive(vol, "vol")?,
            ..self
        })
    }

    /// Returns a copy with the opposite side (call <-> put).
    pub fn with_option_type(self, option_type: OptionType) -> Self {
        Self {
            option_type,
            ..self
        }
    }

    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    #[inline]
    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn vol(&self) -> f64 {
        self.vol
    }

    /// Continuous yield / cost-of-carry `c`.
    #[inline]
    pub fn carry(&self) -> f64 {
        self.carry
    }

    #[inline]
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// `e^(-rT)`.
    #[inline]
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.expiry).exp()
    }

    /// `e^(-cT)`.
    #[inline]
    pub fn carry_factor(&self) -> f64 {
        (-self.carry * self.expiry).exp()
    }

    /// Discounted forward intrinsic value `max(±(S·e^(-cT) - K·e^(-rT)), 0)`.
    pub fn forward_intrinsic(&self) -> f64 {
        self.option_type.payoff(
            self.spot * self.carry_factor(),
            self.strike * self.discount_factor(),
        )
    }

    /// Spot intrinsic value `max(±(S - K), 0)`.
    #[inline]
    pub fn intrinsic(&self) -> f64 {
        self.option_type.payoff(self.spot, self.strike)
    }
}

/// Builder for [`OptionContract`].
#[derive(Debug, Clone, Default)]
pub struct OptionContractBuilder {
    spot: Option<f64>,
    strike: Option<f64>,
    expiry: Option<f64>,
    rate: Option<f64>,
    vol: Option<f64>,
    carry: Option<f64>,
    option_type: Option<OptionType>,
}

impl OptionContractBuilder {
    /// Sets the spot price.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets the strike price.
    #[inline]
    pub fn strike(mut self, strike: f64) -> Self {
        self.strike = Some(strike);
        self
    }

    /// Sets time to expiry in years.
    #[inline]
    pub fn expiry(mut self, expiry: f64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Sets the flat risk-free rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Sets the flat volatility.
    #[inline]
    pub fn vol(mut self, vol: f64) -> Self {
        self.vol = Some(vol);
        self
    }

    /// Sets the continuous yield / cost-of-carry.
    #[inline]
    pub fn carry(mut self, carry: f64) -> Self {
        self.carry = Some(carry);
        self
    }

    #[inline]
    pub fn option_type(mut self, option_type: OptionType) -> Self {
        self.option_type = Some(option_type);
        self
    }

    #[inline]
    pub fn call(self) -> Self {
        self.option_type(OptionType::Call)
    }

    #[inline]
    pub fn put(self) -> Self {
        self.option_type(OptionType::Put)
    }

    /// Validates and builds an [`OptionContract`].
    ///
    /// Spot, strike, expiry and vol are required; rate and carry default to zero
    /// and the side defaults to call.
    pub fn build(self) -> Result<OptionContract> {
        let required = |value: Option<f64>, parameter: &'static str| {
            value.ok_or_else(|| PricingError::invalid(parameter, "is required"))
        };
        OptionContract::new(
            required(self.spot, "spot")?,
            required(self.strike, "strike")?,
            required(self.expiry, "expiry")?,
            self.rate.unwrap_or(0.0),
            required(self.vol, "vol")?,
            self.carry.unwrap_or(0.0),
            self.option_type.unwrap_or(OptionType::Call),
        )
    }
}
