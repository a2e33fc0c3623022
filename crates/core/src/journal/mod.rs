//! Journal entries.
//!
//! - Structural validation (line rules, balance within epsilon)
//! - Sequential entry numbering per company and month
//! - Search with filters and pagination
//! - Approval-hook state transitions

pub mod error;
pub mod numbering;
pub mod store;
pub mod types;
pub mod validation;

pub use error::JournalError;
pub use store::JournalStore;
pub use types::{
    CreateEntryInput, EntryFilter, EntryStatus, JournalEntry, JournalLine, LineInput,
    UpdateEntryPatch,
};
pub use validation::{LineAccountInfo, ValidatedLines, validate_lines};
