//! Accounting periods.
//!
//! - Non-overlapping date ranges per company
//! - Atomic close with blocker detection
//! - Date resolution used by the journal store and posting engine

pub mod error;
pub mod registry;
pub mod types;

pub use error::PeriodError;
pub use registry::PeriodRegistry;
pub use types::{AccountingPeriod, date_ranges_overlap, valid_date_range};
