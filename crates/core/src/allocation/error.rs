//! Allocation rule error types.

use rust_decimal::Decimal;
use tally_shared::CoreError;
use tally_shared::types::AllocationRuleId;
use thiserror::Error;

/// Errors that can occur in the allocation engine.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Rule not found.
    #[error("Allocation rule not found: {0}")]
    NotFound(AllocationRuleId),

    /// Rule name already in use for the company.
    #[error("Allocation rule name {0:?} is already in use")]
    NameInUse(String),

    /// A rule needs at least one active destination.
    #[error("Allocation rule has no active destinations")]
    NoActiveDestinations,

    /// Percentage destinations must sum to 100%.
    #[error("Active percentages sum to {sum}, expected 100")]
    InvalidPercentages {
        /// The actual sum of active percentages.
        sum: Decimal,
    },

    /// A destination is missing the amount its method requires.
    #[error("Destination {index} is missing the amount required by the method")]
    MissingDestinationAmount {
        /// Zero-based destination index.
        index: usize,
    },

    /// Fixed amounts must be non-negative and sum to a positive total.
    #[error("Fixed destination amounts must be non-negative with a positive sum")]
    InvalidFixedAmounts,

    /// Fixed destinations do not sum to the input amount.
    #[error("Fixed destinations sum to {actual}, input is {expected}")]
    Mismatch {
        /// The input amount.
        expected: Decimal,
        /// The destinations' sum.
        actual: Decimal,
    },
}

impl AllocationError {
    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::NoActiveDestinations
            | Self::InvalidPercentages { .. }
            | Self::MissingDestinationAmount { .. }
            | Self::InvalidFixedAmounts => "VALIDATION",
            Self::NameInUse(_) => "BUSINESS_RULE",
            Self::Mismatch { .. } => "ALLOCATION_MISMATCH",
        }
    }
}

impl From<AllocationError> for CoreError {
    fn from(err: AllocationError) -> Self {
        let message = err.to_string();
        match err {
            AllocationError::NotFound(_) => Self::NotFound(message),
            AllocationError::NameInUse(_) => Self::BusinessRule(message),
            AllocationError::Mismatch { .. } => Self::AllocationMismatch(message),
            _ => Self::Validation(message),
        }
    }
}
