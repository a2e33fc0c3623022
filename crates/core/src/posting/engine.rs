//! Posting engine.
//!
//! Atomically transitions journal entries from Approved to Posted and
//! applies their lines to the balance projection. Concurrent posts that
//! share an account serialize on that account's lock; posts over disjoint
//! accounts proceed in parallel. Verification runs before any mutation,
//! and every mutation happens under one write guard, so a failure at any
//! step leaves nothing behind.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::types::{JournalEntryId, PeriodId, UserId};
use tally_shared::{Clock, LedgerConfig};

use super::error::PostingError;
use crate::balances::projection::plan_account_delta;
use crate::balances::types::LedgerBalance;
use crate::journal::types::{EntryStatus, JournalEntry, JournalLine};
use crate::store::{LedgerState, LedgerStore};

/// Everything a verified post will write, computed before any mutation.
struct PostPlan {
    period_id: PeriodId,
    rows: Vec<LedgerBalance>,
}

/// Service that posts and reverses journal entries.
#[derive(Clone)]
pub struct PostingEngine {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
}

impl PostingEngine {
    /// Creates a new posting engine over the shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: Arc<LedgerConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, clock }
    }

    /// Posts an Approved entry.
    ///
    /// Locks the entry's accounts in ascending order, verifies state and
    /// period inside the locked region, applies each line to the balance
    /// projection in line order, and stamps the entry, all under one
    /// atomic commit.
    pub async fn post(
        &self,
        entry_id: JournalEntryId,
        user: UserId,
    ) -> Result<JournalEntry, PostingError> {
        let touched = {
            let state = self.store.read().await;
            state
                .entries
                .get(&entry_id)
                .filter(|e| !e.deleted)
                .map(JournalEntry::touched_accounts)
                .ok_or(PostingError::NotFound(entry_id))?
        };

        // Cancellation is honored up to here; once the locks are held the
        // post runs to completion without suspension points.
        let _account_guards = self.store.lock_accounts(&touched).await;
        let today = self.clock.today_in(self.config.time_zone);
        let now = self.clock.now_utc();

        let mut state = self.store.write().await;
        let entry = state
            .entries
            .get(&entry_id)
            .filter(|e| !e.deleted)
            .cloned()
            .ok_or(PostingError::NotFound(entry_id))?;

        let plan = self.verify_postable(&state, &entry, EntryStatus::Approved, today)?;
        commit_post(&mut state, entry_id, &plan, user, today, now);

        let posted = state.entries[&entry_id].clone();
        tracing::info!(
            entry = %posted.entry_number,
            debit = %posted.total_debit,
            "journal entry posted"
        );
        Ok(posted)
    }

    /// Reverses a Posted entry.
    ///
    /// Creates a fresh entry with debits and credits swapped line for
    /// line, posts it through the same algorithm, links both sides via
    /// `reversed_entry_id`, and voids the original. The whole operation is
    /// one atomic commit.
    pub async fn reverse(
        &self,
        entry_id: JournalEntryId,
        reversal_date: NaiveDate,
        reference: Option<String>,
        user: UserId,
    ) -> Result<JournalEntry, PostingError> {
        let touched = {
            let state = self.store.read().await;
            state
                .entries
                .get(&entry_id)
                .filter(|e| !e.deleted)
                .map(JournalEntry::touched_accounts)
                .ok_or(PostingError::NotFound(entry_id))?
        };

        let _account_guards = self.store.lock_accounts(&touched).await;
        let today = self.clock.today_in(self.config.time_zone);
        let now = self.clock.now_utc();

        let mut state = self.store.write().await;
        let original = state
            .entries
            .get(&entry_id)
            .filter(|e| !e.deleted)
            .cloned()
            .ok_or(PostingError::NotFound(entry_id))?;

        if original.status != EntryStatus::Posted {
            return Err(PostingError::NotPosted(entry_id));
        }
        if original.reversed_entry_id.is_some() {
            return Err(PostingError::AlreadyReversed(entry_id));
        }

        // Build the reversal with a placeholder number; the sequence is
        // only consumed once verification cannot fail anymore.
        let mut reversal = build_reversal(&original, reversal_date, reference, now);
        let plan = self.verify_postable(&state, &reversal, EntryStatus::Reversing, today)?;

        reversal.entry_number = state.next_entry_number(original.company_id, reversal_date);
        let reversal_id = reversal.id;
        state
            .entry_numbers
            .insert((original.company_id, reversal.entry_number.clone()), reversal_id);
        state.entries.insert(reversal_id, reversal);

        commit_post(&mut state, reversal_id, &plan, user, today, now);

        if let Some(original) = state.entries.get_mut(&entry_id) {
            original.status = EntryStatus::Void;
            original.reversed_entry_id = Some(reversal_id);
            original.updated_at = now;
        }

        let reversal = state.entries[&reversal_id].clone();
        tracing::info!(
            original = %original.entry_number,
            reversal = %reversal.entry_number,
            "journal entry reversed"
        );
        Ok(reversal)
    }

    /// Verifies an entry can post today and computes the balance rows the
    /// post will write. Read-only: mutation is deferred to `commit_post`.
    fn verify_postable(
        &self,
        state: &LedgerState,
        entry: &JournalEntry,
        expected_status: EntryStatus,
        today: NaiveDate,
    ) -> Result<PostPlan, PostingError> {
        if entry.status != expected_status {
            return Err(PostingError::InvalidState { status: entry.status });
        }

        let total_debit: Decimal = entry.lines.iter().map(|l| l.debit).sum();
        let total_credit: Decimal = entry.lines.iter().map(|l| l.credit).sum();
        if (total_debit - total_credit).abs() > self.config.monetary_epsilon {
            return Err(PostingError::Unbalanced {
                debit: total_debit,
                credit: total_credit,
            });
        }

        let period = state
            .resolve_period(entry.company_id, entry.entry_date)
            .ok_or(PostingError::NoOpenPeriod(entry.entry_date))?;
        if !self.period_allows_posting(period.closed, period.end_date, today) {
            return Err(PostingError::PeriodClosed {
                period: period.name.clone(),
                date: entry.entry_date,
            });
        }
        let period_id = period.id;

        let mut lines: Vec<&JournalLine> = entry.lines.iter().collect();
        lines.sort_by_key(|l| l.line_number);

        let mut rows = Vec::new();
        for line in lines {
            let account = state
                .accounts
                .get(&line.account_id)
                .filter(|a| a.company_id == entry.company_id)
                .ok_or(PostingError::AccountNotFound(line.account_id))?;
            if !account.is_active() {
                return Err(PostingError::AccountInactive(line.account_id));
            }
            // Accounts are distinct per entry, so per-line plans touch
            // disjoint balance chains and cannot interfere.
            rows.extend(plan_account_delta(
                state,
                account,
                period_id,
                line.debit,
                line.credit,
            ));
        }

        // Closed-period freeze: a plan may create value-neutral carry rows
        // in closed periods, but never change an existing row there.
        for row in &rows {
            if row.period_id == period_id {
                continue;
            }
            let Some(row_period) = state.periods.get(&row.period_id) else {
                continue;
            };
            if !row_period.closed {
                continue;
            }
            let frozen_changed = match state.balances.get(&(row.account_id, row.period_id)) {
                Some(existing) => {
                    existing.opening_balance != row.opening_balance
                        || existing.closing_balance != row.closing_balance
                        || existing.period_debit != row.period_debit
                        || existing.period_credit != row.period_credit
                }
                None => !row.period_debit.is_zero() || !row.period_credit.is_zero(),
            };
            if frozen_changed {
                return Err(PostingError::PeriodClosed {
                    period: row_period.name.clone(),
                    date: entry.entry_date,
                });
            }
        }

        Ok(PostPlan { period_id, rows })
    }

    fn period_allows_posting(&self, closed: bool, end_date: NaiveDate, today: NaiveDate) -> bool {
        if !closed {
            return true;
        }
        let grace = i64::from(self.config.period_open_grace_days);
        grace > 0 && today <= end_date + chrono::Duration::days(grace)
    }
}

/// Applies a verified plan. Infallible by construction; runs entirely
/// under the caller's write guard.
fn commit_post(
    state: &mut LedgerState,
    entry_id: JournalEntryId,
    plan: &PostPlan,
    user: UserId,
    today: NaiveDate,
    now: chrono::DateTime<chrono::Utc>,
) {
    for row in &plan.rows {
        state
            .balances
            .insert((row.account_id, row.period_id), row.clone());
    }
    if let Some(entry) = state.entries.get_mut(&entry_id) {
        entry.status = EntryStatus::Posted;
        entry.period_id = Some(plan.period_id);
        entry.posted_by = Some(user);
        entry.posting_date = Some(today);
        entry.posted_at = Some(now);
        entry.updated_at = now;
    }
}

/// Builds the reversing entry: same accounts and amounts with debit and
/// credit swapped line for line.
fn build_reversal(
    original: &JournalEntry,
    reversal_date: NaiveDate,
    reference: Option<String>,
    now: chrono::DateTime<chrono::Utc>,
) -> JournalEntry {
    let lines: Vec<JournalLine> = original
        .lines
        .iter()
        .map(|line| JournalLine {
            line_number: line.line_number,
            account_id: line.account_id,
            description: line.description.clone(),
            reference: line.reference.clone(),
            tracking_category_id: line.tracking_category_id,
            debit: line.credit,
            credit: line.debit,
            currency: line.currency.clone(),
            exchange_rate: line.exchange_rate,
        })
        .collect();

    JournalEntry {
        id: JournalEntryId::new(),
        company_id: original.company_id,
        entry_number: String::new(),
        entry_date: reversal_date,
        reference,
        memo: Some(format!("Reversal of {}", original.entry_number)),
        currency: original.currency.clone(),
        exchange_rate: original.exchange_rate,
        status: EntryStatus::Reversing,
        is_adjusting: original.is_adjusting,
        is_reversing: true,
        reversed_entry_id: Some(original.id),
        period_id: None,
        total_debit: original.total_credit,
        total_credit: original.total_debit,
        lines,
        created_by: original.created_by,
        approved_by: None,
        rejection_reason: None,
        posted_by: None,
        posting_date: None,
        posted_at: None,
        deleted: false,
        created_at: now,
        updated_at: now,
    }
}
