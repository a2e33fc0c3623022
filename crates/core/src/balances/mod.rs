//! Per-account, per-period ledger balances.
//!
//! Derived state: maintained only through the posting engine, frozen for
//! closed periods, and fully reconstructible from posted lines.

pub mod projection;
pub mod types;

pub use projection::{BalanceDiscrepancy, BalanceError, BalanceProjection, RebuildReport};
pub use types::LedgerBalance;
