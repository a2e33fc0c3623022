//! Recurring template error types.

use rust_decimal::Decimal;
use tally_shared::CoreError;
use tally_shared::types::TemplateId;
use thiserror::Error;

use super::types::TemplateStatus;
use crate::journal::error::JournalError;
use crate::posting::error::PostingError;

/// Errors that can occur in the recurring scheduler.
#[derive(Debug, Error)]
pub enum RecurringError {
    /// Template not found.
    #[error("Recurring template not found: {0}")]
    NotFound(TemplateId),

    /// Template name already in use for the company.
    #[error("Recurring template name {0:?} is already in use")]
    NameInUse(String),

    /// Interval must be a positive integer.
    #[error("Template interval must be at least 1")]
    InvalidInterval,

    /// A template blueprint needs at least two lines.
    #[error("Template must have at least 2 lines")]
    InsufficientLines,

    /// The template's line blueprint does not balance.
    #[error("Template lines are not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedTemplate {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// The template is not in a status that allows the operation.
    #[error("Template is {0:?} and cannot be modified this way")]
    InvalidStatus(TemplateStatus),

    /// Entry creation for a due occurrence failed.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Posting a generated entry failed.
    #[error(transparent)]
    Posting(#[from] PostingError),
}

impl RecurringError {
    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidInterval | Self::InsufficientLines => "VALIDATION",
            Self::UnbalancedTemplate { .. } => "UNBALANCED_ENTRY",
            Self::NameInUse(_) | Self::InvalidStatus(_) => "BUSINESS_RULE",
            Self::Journal(inner) => inner.error_code(),
            Self::Posting(inner) => inner.error_code(),
        }
    }
}

impl From<RecurringError> for CoreError {
    fn from(err: RecurringError) -> Self {
        match err {
            RecurringError::NotFound(_) => Self::NotFound(err.to_string()),
            RecurringError::InvalidInterval | RecurringError::InsufficientLines => {
                Self::Validation(err.to_string())
            }
            RecurringError::UnbalancedTemplate { .. } => Self::UnbalancedEntry(err.to_string()),
            RecurringError::NameInUse(_) | RecurringError::InvalidStatus(_) => {
                Self::BusinessRule(err.to_string())
            }
            RecurringError::Journal(inner) => inner.into(),
            RecurringError::Posting(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RecurringError::NotFound(TemplateId::new()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(RecurringError::InvalidInterval.error_code(), "VALIDATION");
        assert_eq!(
            RecurringError::UnbalancedTemplate {
                debit: dec!(10),
                credit: dec!(20)
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(
            RecurringError::InvalidStatus(TemplateStatus::Completed).error_code(),
            "BUSINESS_RULE"
        );
    }

    #[test]
    fn test_wrapped_errors_keep_their_codes() {
        let err = RecurringError::Posting(PostingError::NoOpenPeriod(
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        ));
        assert_eq!(err.error_code(), "PERIOD_CLOSED");
    }
}
