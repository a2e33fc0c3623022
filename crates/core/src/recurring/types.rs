//! Recurring journal template types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CompanyId, CurrencyCode, TemplateId, UserId};

/// How often a template emits an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every `interval` days.
    Daily,
    /// Every `interval` weeks.
    Weekly,
    /// Every `interval` fortnights.
    Biweekly,
    /// Every `interval` months.
    Monthly,
    /// Every `interval` quarters.
    Quarterly,
    /// Every `interval` half-years.
    SemiAnnually,
    /// Every `interval` years.
    Annually,
    /// Every `interval` days, caller-defined cadence.
    Custom,
}

impl Frequency {
    /// Number of days per unit for day-based frequencies.
    #[must_use]
    pub const fn days_per_unit(self) -> Option<u32> {
        match self {
            Self::Daily | Self::Custom => Some(1),
            Self::Weekly => Some(7),
            Self::Biweekly => Some(14),
            _ => None,
        }
    }

    /// Number of months per unit for month-based frequencies.
    #[must_use]
    pub const fn months_per_unit(self) -> Option<u32> {
        match self {
            Self::Monthly => Some(1),
            Self::Quarterly => Some(3),
            Self::SemiAnnually => Some(6),
            Self::Annually => Some(12),
            _ => None,
        }
    }
}

/// When a template stops emitting entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndRule {
    /// Runs until paused or cancelled.
    Never,
    /// Stops after the given number of occurrences.
    AfterOccurrences(u32),
    /// Stops once the next run would fall after the given date.
    OnDate(NaiveDate),
}

/// Template lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    /// Eligible for scheduling.
    Active,
    /// Temporarily suspended; resume restores Active.
    Paused,
    /// End rule reached; terminal.
    Completed,
    /// Cancelled by a caller; terminal.
    Cancelled,
}

/// A line of the template's entry blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateLine {
    /// Account posted against.
    pub account_id: AccountId,
    /// Optional line description.
    pub description: Option<String>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// A recurring journal template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTemplate {
    /// Unique identifier.
    pub id: TemplateId,
    /// Company this template belongs to.
    pub company_id: CompanyId,
    /// Template name, unique per company.
    pub name: String,
    /// Emission frequency.
    pub frequency: Frequency,
    /// Positive multiplier on the frequency unit.
    pub interval: u32,
    /// First occurrence date; also the day-of-month anchor for month-based
    /// frequencies.
    pub start_date: NaiveDate,
    /// End rule.
    pub end_rule: EndRule,
    /// Lifecycle status.
    pub status: TemplateStatus,
    /// Fully balanced line blueprint.
    pub lines: Vec<TemplateLine>,
    /// Entry currency; defaults to the base currency.
    pub currency: Option<CurrencyCode>,
    /// Next date an entry is due.
    pub next_run_date: NaiveDate,
    /// Date of the most recent emission.
    pub last_run_date: Option<NaiveDate>,
    /// Number of entries emitted so far.
    pub occurrence_count: u32,
    /// Who owns generated entries.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RecurringTemplate {
    /// Returns true if the template is due at the given date.
    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.status == TemplateStatus::Active && self.next_run_date <= today
    }
}

/// Input for creating a recurring template.
#[derive(Debug, Clone)]
pub struct CreateTemplateInput {
    /// Company the template belongs to.
    pub company_id: CompanyId,
    /// Template name, unique per company.
    pub name: String,
    /// Emission frequency.
    pub frequency: Frequency,
    /// Positive multiplier on the frequency unit.
    pub interval: u32,
    /// First occurrence date.
    pub start_date: NaiveDate,
    /// End rule.
    pub end_rule: EndRule,
    /// Fully balanced line blueprint (at least 2 lines).
    pub lines: Vec<TemplateLine>,
    /// Entry currency; defaults to the base currency.
    pub currency: Option<CurrencyCode>,
    /// Who owns generated entries.
    pub created_by: UserId,
}

/// Patch for updating a recurring template.
#[derive(Debug, Clone, Default)]
pub struct UpdateTemplatePatch {
    /// New name.
    pub name: Option<String>,
    /// New frequency.
    pub frequency: Option<Frequency>,
    /// New interval.
    pub interval: Option<u32>,
    /// New end rule.
    pub end_rule: Option<EndRule>,
    /// Replacement line blueprint.
    pub lines: Option<Vec<TemplateLine>>,
}
