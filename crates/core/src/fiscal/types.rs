//! Accounting period types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{CompanyId, PeriodId, UserId};

/// An accounting period.
///
/// Periods partition a company's ledger activity into contiguous,
/// non-overlapping date ranges and anchor the balance snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Unique identifier.
    pub id: PeriodId,
    /// Company this period belongs to.
    pub company_id: CompanyId,
    /// Period name (e.g., "January 2025").
    pub name: String,
    /// First day of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Whether the period has been closed.
    pub closed: bool,
    /// When the period was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Who closed the period.
    pub closed_by: Option<UserId>,
}

impl AccountingPeriod {
    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if transactions may be posted to this period.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed
    }
}

/// Validates that `start_date` is not after `end_date`.
#[must_use]
pub fn valid_date_range(start_date: NaiveDate, end_date: NaiveDate) -> bool {
    start_date <= end_date
}

/// Checks if two inclusive date ranges overlap.
///
/// Two ranges [a_start, a_end] and [b_start, b_end] overlap if
/// a_start <= b_end AND a_end >= b_start.
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}
