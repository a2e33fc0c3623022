//! Posting engine error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::CoreError;
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

use crate::journal::types::EntryStatus;

/// Errors that can occur while posting or reversing.
///
/// All variants are user-recoverable; the engine never leaves a
/// partially-updated balance behind any of them.
#[derive(Debug, Error)]
pub enum PostingError {
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    NotFound(JournalEntryId),

    /// Entry is not in a postable state.
    #[error("Journal entry is in status {status:?} and cannot be posted")]
    InvalidState {
        /// The entry's current status.
        status: EntryStatus,
    },

    /// Entry totals drifted out of balance.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// No period covers the entry date.
    #[error("No open accounting period covers {0}")]
    NoOpenPeriod(NaiveDate),

    /// The target period is closed.
    #[error("Accounting period {period} is closed for {date}")]
    PeriodClosed {
        /// Period name.
        period: String,
        /// The entry date that was rejected.
        date: NaiveDate,
    },

    /// A referenced account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// A referenced account is not active.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Reversal target has not been posted.
    #[error("Journal entry {0} is not posted and cannot be reversed")]
    NotPosted(JournalEntryId),

    /// Reversal target already has a reversal.
    #[error("Journal entry {0} has already been reversed")]
    AlreadyReversed(JournalEntryId),
}

impl PostingError {
    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::AccountNotFound(_) => "NOT_FOUND",
            Self::InvalidState { .. } | Self::NotPosted(_) | Self::AlreadyReversed(_) => {
                "BUSINESS_RULE"
            }
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::NoOpenPeriod(_) | Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
        }
    }
}

impl From<PostingError> for CoreError {
    fn from(err: PostingError) -> Self {
        let message = err.to_string();
        match err {
            PostingError::NotFound(_) | PostingError::AccountNotFound(_) => {
                Self::NotFound(message)
            }
            PostingError::InvalidState { .. }
            | PostingError::NotPosted(_)
            | PostingError::AlreadyReversed(_) => Self::BusinessRule(message),
            PostingError::Unbalanced { .. } => Self::UnbalancedEntry(message),
            PostingError::NoOpenPeriod(_) | PostingError::PeriodClosed { .. } => {
                Self::PeriodClosed(message)
            }
            PostingError::AccountInactive(_) => Self::AccountInactive(message),
        }
    }
}
