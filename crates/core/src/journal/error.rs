//! Journal store error types.

use rust_decimal::Decimal;
use tally_shared::CoreError;
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

use super::types::EntryStatus;

/// Errors that can occur during journal store operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    NotFound(JournalEntryId),

    /// An entry needs at least two lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Debits and credits disagree beyond the monetary epsilon.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A line must carry a positive debit or a positive credit, not both
    /// and not neither.
    #[error("Line {line} must set exactly one of debit or credit to a positive amount")]
    InvalidLineAmounts {
        /// Offending line number (1-based input order).
        line: usize,
    },

    /// Line amounts cannot be negative.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// Offending line number.
        line: usize,
    },

    /// Two lines of one entry cannot reference the same account.
    #[error("Account {0} appears on more than one line")]
    DuplicateAccount(AccountId),

    /// Referenced account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Referenced account is not active.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Exchange rate must be positive.
    #[error("Exchange rate must be positive")]
    InvalidExchangeRate,

    /// Only Draft and PendingApproval entries are mutable.
    #[error("Journal entry in status {0:?} cannot be modified")]
    NotEditable(EntryStatus),

    /// Soft delete is limited to Draft entries.
    #[error("Only draft journal entries can be deleted")]
    CanOnlyDeleteDraft,

    /// The requested status transition is not allowed.
    #[error("Cannot transition journal entry from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current status.
        from: EntryStatus,
        /// Requested status.
        to: EntryStatus,
    },

    /// Entry number collided with an existing entry.
    #[error("Entry number {0} already exists")]
    DuplicateEntryNumber(String),
}

impl JournalError {
    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::AccountNotFound(_) => "NOT_FOUND",
            Self::InsufficientLines
            | Self::InvalidLineAmounts { .. }
            | Self::NegativeAmount { .. }
            | Self::DuplicateAccount(_)
            | Self::InvalidExchangeRate => "VALIDATION",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::NotEditable(_) | Self::CanOnlyDeleteDraft | Self::InvalidTransition { .. } => {
                "BUSINESS_RULE"
            }
            Self::DuplicateEntryNumber(_) => "DUPLICATE_ENTRY_NUMBER",
        }
    }
}

impl From<JournalError> for CoreError {
    fn from(err: JournalError) -> Self {
        let message = err.to_string();
        match err {
            JournalError::NotFound(_) | JournalError::AccountNotFound(_) => Self::NotFound(message),
            JournalError::Unbalanced { .. } => Self::UnbalancedEntry(message),
            JournalError::AccountInactive(_) => Self::AccountInactive(message),
            JournalError::DuplicateEntryNumber(_) => Self::DuplicateEntryNumber(message),
            JournalError::InsufficientLines
            | JournalError::InvalidLineAmounts { .. }
            | JournalError::NegativeAmount { .. }
            | JournalError::DuplicateAccount(_)
            | JournalError::InvalidExchangeRate => Self::Validation(message),
            JournalError::NotEditable(_)
            | JournalError::CanOnlyDeleteDraft
            | JournalError::InvalidTransition { .. } => Self::BusinessRule(message),
        }
    }
}
