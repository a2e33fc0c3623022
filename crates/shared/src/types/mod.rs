//! Common types used across the ledger core.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{CurrencyCode, InvalidCurrency, RoundingMode, round_display, round_to, within_epsilon};
pub use pagination::{PageMeta, PageRequest, PageResponse};
