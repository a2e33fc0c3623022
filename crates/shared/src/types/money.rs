//! Currency codes and monetary rounding helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; amounts are stored at full
//! internal precision and rounded to 2 decimal places only for display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places used when presenting monetary amounts.
pub const DISPLAY_SCALE: u32 = 2;

/// Error returned for malformed currency codes.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid ISO 4217 currency code: {0}")]
pub struct InvalidCurrency(pub String);

/// ISO 4217 currency code (three uppercase ASCII letters).
///
/// The set of currencies is open; validation is purely structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// Lowercase input is accepted and uppercased.
    pub fn new(code: &str) -> Result<Self, InvalidCurrency> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.len() == 3 && normalized.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(normalized))
        } else {
            Err(InvalidCurrency(code.to_string()))
        }
    }

    /// US dollar, the default base currency.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = InvalidCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Rounding mode applied at display boundaries and allocation splits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Banker's rounding (round half to even). Minimizes cumulative drift.
    #[default]
    HalfEven,
    /// Round half away from zero.
    HalfUp,
}

impl RoundingMode {
    /// Maps to the `rust_decimal` rounding strategy.
    #[must_use]
    pub const fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        }
    }
}

/// Rounds an amount to the given number of decimal places.
#[must_use]
pub fn round_to(amount: Decimal, decimal_places: u32, mode: RoundingMode) -> Decimal {
    amount.round_dp_with_strategy(decimal_places, mode.strategy())
}

/// Rounds an amount to display precision (2 decimal places).
#[must_use]
pub fn round_display(amount: Decimal, mode: RoundingMode) -> Decimal {
    round_to(amount, DISPLAY_SCALE, mode)
}

/// Returns true when two amounts agree within the given epsilon.
#[must_use]
pub fn within_epsilon(a: Decimal, b: Decimal, epsilon: Decimal) -> bool {
    (a - b).abs() <= epsilon
}
