//! Chart of accounts.
//!
//! - Hierarchical, typed accounts with lifecycle status
//! - Classification-driven normal-balance sides
//! - Balance queries over posted activity, with descendant roll-up

pub mod error;
pub mod registry;
pub mod types;

pub use error::AccountError;
pub use registry::AccountRegistry;
pub use types::{
    Account, AccountClassification, AccountFilter, AccountNode, AccountStatus, AccountSubtype,
    BalanceReport, CashFlowSection, CreateAccountInput, NormalSide, UpdateAccountPatch,
};
