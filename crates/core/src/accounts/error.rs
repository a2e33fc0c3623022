//! Account registry error types.

use tally_shared::CoreError;
use tally_shared::types::AccountId;
use thiserror::Error;

/// Errors that can occur during account registry operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Account code is empty or malformed.
    #[error("Invalid account code: {0:?}")]
    InvalidCode(String),

    /// Account code already in use for the company.
    #[error("Account code {0} is already in use")]
    CodeInUse(String),

    /// Currency code is malformed.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Parent account not found.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    /// Parent belongs to a different company.
    #[error("Parent account {0} belongs to a different company")]
    ParentCompanyMismatch(AccountId),

    /// Parent and child must share a classification.
    #[error("Parent account {0} has a different classification")]
    ParentClassificationMismatch(AccountId),

    /// The proposed parent is a descendant of the account being moved.
    #[error("Moving account {0} under {1} would create a cycle")]
    HierarchyCycle(AccountId, AccountId),

    /// System accounts cannot be deleted or retyped.
    #[error("Account {0} is a system account and cannot be modified this way")]
    SystemAccountProtected(AccountId),

    /// Classification, subtype, and reconcilable flag freeze once posted
    /// lines reference the account.
    #[error("Account {0} has posted activity; protected fields cannot change")]
    ProtectedFieldChange(AccountId),

    /// Deletion blocked by active children.
    #[error("Account {0} still has active child accounts")]
    HasActiveChildren(AccountId),

    /// Deletion blocked by posted activity.
    #[error("Account {0} has posted journal lines and cannot be deleted")]
    HasPostedLines(AccountId),
}

impl AccountError {
    /// Returns the machine-readable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidCode(_) | Self::InvalidCurrency(_) => "VALIDATION",
            Self::CodeInUse(_)
            | Self::ParentNotFound(_)
            | Self::ParentCompanyMismatch(_)
            | Self::ParentClassificationMismatch(_)
            | Self::HierarchyCycle(_, _)
            | Self::SystemAccountProtected(_)
            | Self::ProtectedFieldChange(_)
            | Self::HasActiveChildren(_)
            | Self::HasPostedLines(_) => "BUSINESS_RULE",
        }
    }
}

impl From<AccountError> for CoreError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        match err {
            AccountError::NotFound(_) => Self::NotFound(message),
            AccountError::InvalidCode(_) | AccountError::InvalidCurrency(_) => {
                Self::Validation(message)
            }
            _ => Self::BusinessRule(message),
        }
    }
}
