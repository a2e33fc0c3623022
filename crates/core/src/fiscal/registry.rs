//! Period registry service.
//!
//! Tracks accounting periods and their open/closed lifecycle. Closing is
//! atomic and serialized against posting through the company-scoped lock.

use std::sync::Arc;

use chrono::NaiveDate;
use tally_shared::types::{CompanyId, PeriodId, UserId};
use tally_shared::{Clock, LedgerConfig};

use super::error::PeriodError;
use super::types::{AccountingPeriod, date_ranges_overlap, valid_date_range};
use crate::store::LedgerStore;

/// Service for accounting-period operations.
#[derive(Clone)]
pub struct PeriodRegistry {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
}

impl PeriodRegistry {
    /// Creates a new registry over the shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: Arc<LedgerConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, clock }
    }

    /// Opens a period.
    ///
    /// The range must be well-ordered and must not overlap any existing
    /// period of the company.
    pub async fn open_period(
        &self,
        company_id: CompanyId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        name: impl Into<String>,
    ) -> Result<AccountingPeriod, PeriodError> {
        if !valid_date_range(start_date, end_date) {
            return Err(PeriodError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let mut state = self.store.write().await;

        if let Some(existing) = state.periods.values().find(|p| {
            p.company_id == company_id
                && date_ranges_overlap(p.start_date, p.end_date, start_date, end_date)
        }) {
            return Err(PeriodError::Overlapping(existing.name.clone()));
        }

        let period = AccountingPeriod {
            id: PeriodId::new(),
            company_id,
            name: name.into(),
            start_date,
            end_date,
            closed: false,
            closed_at: None,
            closed_by: None,
        };
        state.periods.insert(period.id, period.clone());

        tracing::debug!(period = %period.id, name = %period.name, "period opened");
        Ok(period)
    }

    /// Closes the period containing the given month.
    ///
    /// Fails with the number of blockers when any entry dated inside the
    /// period is neither Posted nor Void. The closed flag, close timestamp,
    /// and closing user are written together.
    pub async fn close_period(
        &self,
        company_id: CompanyId,
        year: i32,
        month: u32,
        closed_by: UserId,
    ) -> Result<AccountingPeriod, PeriodError> {
        let anchor = NaiveDate::from_ymd_opt(year, month, 1).ok_or(
            PeriodError::NoPeriodForDate(NaiveDate::MIN),
        )?;
        let now = self.clock.now_utc();

        // Blocks posting into the period for the duration of the close.
        let _company_guard = self.store.lock_company(company_id).await;
        let mut state = self.store.write().await;

        let period = state
            .resolve_period(company_id, anchor)
            .ok_or(PeriodError::NoPeriodForDate(anchor))?
            .clone();

        if period.closed {
            return Err(PeriodError::AlreadyClosed(period.name));
        }

        let blockers = state
            .entries
            .values()
            .filter(|e| {
                e.company_id == company_id
                    && !e.deleted
                    && period.contains_date(e.entry_date)
                    && !e.status.is_terminal()
            })
            .count();
        if blockers > 0 {
            return Err(PeriodError::UnpostedEntries {
                name: period.name,
                blockers,
            });
        }

        let stored = state
            .periods
            .get_mut(&period.id)
            .ok_or(PeriodError::NotFound(period.id))?;
        stored.closed = true;
        stored.closed_at = Some(now);
        stored.closed_by = Some(closed_by);
        let closed = stored.clone();

        tracing::info!(period = %closed.id, name = %closed.name, "period closed");
        Ok(closed)
    }

    /// Reopens a closed period.
    ///
    /// Administrative escape hatch; the core enforces no policy on who may
    /// call it.
    pub async fn reopen_period(&self, id: PeriodId) -> Result<AccountingPeriod, PeriodError> {
        let mut state = self.store.write().await;
        let period = state
            .periods
            .get_mut(&id)
            .ok_or(PeriodError::NotFound(id))?;
        if !period.closed {
            return Err(PeriodError::NotClosed(period.name.clone()));
        }
        period.closed = false;
        period.closed_at = None;
        period.closed_by = None;
        let reopened = period.clone();

        tracing::info!(period = %id, name = %reopened.name, "period reopened");
        Ok(reopened)
    }

    /// Resolves the period containing the given date, if any.
    pub async fn resolve(&self, company_id: CompanyId, date: NaiveDate) -> Option<AccountingPeriod> {
        let state = self.store.read().await;
        state.resolve_period(company_id, date).cloned()
    }

    /// Fetches a period by id.
    pub async fn get_period(&self, id: PeriodId) -> Result<AccountingPeriod, PeriodError> {
        let state = self.store.read().await;
        state.periods.get(&id).cloned().ok_or(PeriodError::NotFound(id))
    }

    /// Lists a company's periods ordered by start date.
    pub async fn list_periods(&self, company_id: CompanyId) -> Vec<AccountingPeriod> {
        let state = self.store.read().await;
        state
            .periods_sorted(company_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns true if an entry dated `entry_date` may post into `period`
    /// today, honoring the closed flag and the configured grace window.
    #[must_use]
    pub fn allows_posting(&self, period: &AccountingPeriod, today: NaiveDate) -> bool {
        if !period.closed {
            return true;
        }
        let grace = i64::from(self.config.period_open_grace_days);
        grace > 0 && today <= period.end_date + chrono::Duration::days(grace)
    }
}
