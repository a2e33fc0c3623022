//! Ledger-wide error surface.
//!
//! Each core module defines its own `thiserror` enum with precise variants;
//! `CoreError` is the flattened form surfaced to callers, carrying the
//! machine-readable code and an actionable message.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Flattened error surfaced to callers of the ledger core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Structurally invalid input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Input is well-formed but violates a business rule.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// The target accounting period is closed.
    #[error("Period closed: {0}")]
    PeriodClosed(String),

    /// Entry debits and credits do not agree.
    #[error("Unbalanced entry: {0}")]
    UnbalancedEntry(String),

    /// A referenced account is not active.
    #[error("Account inactive: {0}")]
    AccountInactive(String),

    /// Entry number collided with an existing entry.
    #[error("Duplicate entry number: {0}")]
    DuplicateEntryNumber(String),

    /// Fixed allocation destinations do not sum to the input amount.
    #[error("Allocation mismatch: {0}")]
    AllocationMismatch(String),

    /// Concurrent writers raced; the operation is safe to retry.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::BusinessRule(_) => "BUSINESS_RULE",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::UnbalancedEntry(_) => "UNBALANCED_ENTRY",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::DuplicateEntryNumber(_) => "DUPLICATE_ENTRY_NUMBER",
            Self::AllocationMismatch(_) => "ALLOCATION_MISMATCH",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::UnbalancedEntry(_)
            | Self::AccountInactive(_)
            | Self::AllocationMismatch(_) => 400,
            Self::NotFound(_) => 404,
            Self::BusinessRule(_) | Self::PeriodClosed(_) => 422,
            Self::DuplicateEntryNumber(_) | Self::ConcurrentModification(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if retrying the operation unchanged may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_) | Self::Internal(_))
    }
}
