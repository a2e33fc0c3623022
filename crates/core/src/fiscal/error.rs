//! Period registry error types.

use chrono::NaiveDate;
use tally_shared::CoreError;
use tally_shared::types::PeriodId;
use thiserror::Error;

/// Errors that can occur during period registry operations.
#[derive(Debug, Error)]
pub enum PeriodError {
    /// Period not found.
    #[error("Accounting period not found: {0}")]
    NotFound(PeriodId),

    /// No period covers the given date.
    #[error("No accounting period covers {0}")]
    NoPeriodForDate(NaiveDate),

    /// Start date is after end date.
    #[error("Period start {start} is after end {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// The requested range overlaps an existing period.
    #[error("Period overlaps existing period {0}")]
    Overlapping(String),

    /// The period is already closed.
    #[error("Period {0} is already closed")]
    AlreadyClosed(String),

    /// The period is not closed, so it cannot be reopened.
    #[error("Period {0} is not closed")]
    NotClosed(String),

    /// Unposted entries block the close.
    #[error("Cannot close period {name}: {blockers} entries are not posted or void")]
    UnpostedEntries {
        /// Period name.
        name: String,
        /// Number of blocking entries.
        blockers: usize,
    },
}

impl PeriodError {
    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::NoPeriodForDate(_) => "NOT_FOUND",
            Self::InvalidDateRange { .. } => "VALIDATION",
            Self::Overlapping(_)
            | Self::AlreadyClosed(_)
            | Self::NotClosed(_)
            | Self::UnpostedEntries { .. } => "BUSINESS_RULE",
        }
    }
}

impl From<PeriodError> for CoreError {
    fn from(err: PeriodError) -> Self {
        let message = err.to_string();
        match err {
            PeriodError::NotFound(_) | PeriodError::NoPeriodForDate(_) => Self::NotFound(message),
            PeriodError::InvalidDateRange { .. } => Self::Validation(message),
            _ => Self::BusinessRule(message),
        }
    }
}
