//! Recurring journal templates.
//!
//! Scheduled generation of journal entries with month-end-aware frequency
//! arithmetic and crash-safe idempotence.

pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod types;

pub use error::RecurringError;
pub use schedule::{add_months_clamped, days_in_month, occurrence_date};
pub use scheduler::{RecurringScheduler, RunOutcome};
pub use types::{
    CreateTemplateInput, EndRule, Frequency, RecurringTemplate, TemplateLine, TemplateStatus,
    UpdateTemplatePatch,
};
