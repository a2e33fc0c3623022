//! Frequency arithmetic for recurring templates.
//!
//! Month-based frequencies anchor on the template's start day: when the
//! target month is shorter, the date clamps to its last day and never
//! rolls into the following month. Day-based frequencies add a fixed
//! number of days.

use chrono::{Datelike, Days, NaiveDate};

use super::types::Frequency;

/// Days in the given month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(28, |d| d.day())
}

/// Adds whole months to `start`, clamping the day to the target month's
/// length. The anchor day is always `start`'s day, so a January 31 anchor
/// yields February 28 and then March 31.
#[must_use]
pub fn add_months_clamped(start: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = start.month0() + months;
    let year = start.year() + i32::try_from(zero_based / 12).unwrap_or(0);
    let month = zero_based % 12 + 1;
    let day = start.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(start)
}

/// The date of occurrence `index` (0-based; index 0 is `start`).
#[must_use]
pub fn occurrence_date(
    start: NaiveDate,
    frequency: Frequency,
    interval: u32,
    index: u32,
) -> NaiveDate {
    let steps = interval.saturating_mul(index);
    if let Some(days) = frequency.days_per_unit() {
        let total = u64::from(days) * u64::from(steps);
        start.checked_add_days(Days::new(total)).unwrap_or(start)
    } else if let Some(months) = frequency.months_per_unit() {
        add_months_clamped(start, months.saturating_mul(steps))
    } else {
        start
    }
}
