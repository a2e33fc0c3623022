//! Balance projection.
//!
//! Maintains the per-account, per-period `LedgerBalance` chain: openings
//! carry forward from the previous period's closing (seeded from the
//! account's stated opening balance before any activity exists), and
//! closings recompute from the signed net of the period. The planning
//! functions are pure: they compute the full set of rows a change implies
//! without touching state, so the posting engine can verify the plan
//! (closed-period freeze) and then commit it atomically.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::LedgerConfig;
use tally_shared::types::{AccountId, PeriodId};
use thiserror::Error;

use super::types::LedgerBalance;
use crate::accounts::types::Account;
use crate::journal::types::EntryStatus;
use crate::store::{LedgerState, LedgerStore};

/// Errors from balance projection reads and rebuilds.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Period not found.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(PeriodId),
}

impl From<BalanceError> for tally_shared::CoreError {
    fn from(err: BalanceError) -> Self {
        Self::NotFound(err.to_string())
    }
}

/// Computes the rows implied by applying `(debit, credit)` to an account
/// in the given period.
///
/// The returned plan contains, in period order: carry rows for any gap
/// periods between the account's latest earlier row and the target, the
/// updated target row, and recomputed rows for every later period through
/// the account's last existing row. Committing the whole plan preserves
/// the opening/closing chain.
pub(crate) fn plan_account_delta(
    state: &LedgerState,
    account: &Account,
    target_period_id: PeriodId,
    debit: Decimal,
    credit: Decimal,
) -> Vec<LedgerBalance> {
    let side = account.normal_side();
    let periods = state.periods_sorted(account.company_id);
    let Some(target_idx) = periods.iter().position(|p| p.id == target_period_id) else {
        return Vec::new();
    };

    let mut plan = Vec::new();

    // Seed the carry from the latest earlier row, or the stated opening
    // balance when the account has no history yet.
    let latest_earlier = (0..target_idx)
        .rev()
        .find(|i| state.balances.contains_key(&(account.id, periods[*i].id)));
    let mut carry = match latest_earlier {
        Some(idx) => {
            let closing = state.balances[&(account.id, periods[idx].id)].closing_balance;
            // Prime skipped periods between the last activity and the target.
            for period in &periods[idx + 1..target_idx] {
                plan.push(LedgerBalance::opening(account.id, period.id, closing));
            }
            closing
        }
        None => account.opening_balance,
    };

    let mut target_row = state
        .balances
        .get(&(account.id, target_period_id))
        .cloned()
        .unwrap_or_else(|| LedgerBalance::opening(account.id, target_period_id, carry));
    target_row.apply(debit, credit, side);
    carry = target_row.closing_balance;
    plan.push(target_row);

    // Ripple the new closing through every later existing row, creating
    // carry rows for gaps so adjacency holds end to end.
    let last_existing = (target_idx + 1..periods.len())
        .rev()
        .find(|i| state.balances.contains_key(&(account.id, periods[*i].id)));
    if let Some(last) = last_existing {
        for period in &periods[target_idx + 1..=last] {
            let mut row = state
                .balances
                .get(&(account.id, period.id))
                .cloned()
                .unwrap_or_else(|| LedgerBalance::opening(account.id, period.id, carry));
            row.opening_balance = carry;
            row.recompute(side);
            carry = row.closing_balance;
            plan.push(row);
        }
    }

    plan
}

/// Synthesizes the balance row for `(account, period)` without writing:
/// the stored row if one exists, otherwise a carry row from the nearest
/// earlier activity.
pub(crate) fn synthesize_row(
    state: &LedgerState,
    account: &Account,
    period_id: PeriodId,
) -> LedgerBalance {
    if let Some(row) = state.balances.get(&(account.id, period_id)) {
        return row.clone();
    }
    let periods = state.periods_sorted(account.company_id);
    let carry = periods
        .iter()
        .position(|p| p.id == period_id)
        .and_then(|idx| {
            (0..idx)
                .rev()
                .find_map(|i| state.balances.get(&(account.id, periods[i].id)))
        })
        .map_or(account.opening_balance, |row| row.closing_balance);
    LedgerBalance::opening(account.id, period_id, carry)
}

/// One discrepancy surfaced by `rebuild_balances`.
#[derive(Debug, Clone)]
pub struct BalanceDiscrepancy {
    /// The period whose stored row disagreed.
    pub period_id: PeriodId,
    /// Closing balance that was stored.
    pub stored_closing: Decimal,
    /// Closing balance recomputed from posted lines.
    pub recomputed_closing: Decimal,
}

/// Result of an authoritative balance rebuild.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    /// The rebuilt rows, in period order.
    pub rows: Vec<LedgerBalance>,
    /// Stored rows that disagreed with the recomputation.
    pub discrepancies: Vec<BalanceDiscrepancy>,
}

/// Balance projection service.
///
/// Invoked by the posting engine on every post and by the period registry
/// at period open; exposed to administrators through `rebuild_balances`.
#[derive(Clone)]
pub struct BalanceProjection {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
}

impl BalanceProjection {
    /// Creates a new projection over the shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: Arc<LedgerConfig>) -> Self {
        Self { store, config }
    }

    /// Reads the balance row for `(account, period)`.
    ///
    /// Periods without stored activity synthesize a carry row; the result
    /// always satisfies `closing = opening + signed_delta`.
    pub async fn read_balance(
        &self,
        account_id: AccountId,
        period_id: PeriodId,
    ) -> Result<LedgerBalance, BalanceError> {
        let state = self.store.read().await;
        let account = state
            .accounts
            .get(&account_id)
            .ok_or(BalanceError::AccountNotFound(account_id))?;
        if !state.periods.contains_key(&period_id) {
            return Err(BalanceError::PeriodNotFound(period_id));
        }
        Ok(synthesize_row(&state, account, period_id))
    }

    /// Materializes carry rows from the account's latest activity through
    /// `through_period`, priming opening balances for skipped periods.
    pub async fn forward_fill(
        &self,
        account_id: AccountId,
        through_period: PeriodId,
    ) -> Result<Vec<LedgerBalance>, BalanceError> {
        let mut state = self.store.write().await;
        let account = state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(BalanceError::AccountNotFound(account_id))?;
        if !state.periods.contains_key(&through_period) {
            return Err(BalanceError::PeriodNotFound(through_period));
        }

        let plan = plan_account_delta(&state, &account, through_period, Decimal::ZERO, Decimal::ZERO);
        let mut created = Vec::new();
        for row in plan {
            let key = (row.account_id, row.period_id);
            if !state.balances.contains_key(&key) {
                state.balances.insert(key, row.clone());
                created.push(row);
            }
        }
        Ok(created)
    }

    /// Recomputes every balance row for the account from posted lines plus
    /// the stated opening balance, replaces the stored rows, and reports
    /// any rows that disagreed. This is the authoritative check.
    pub async fn rebuild_balances(&self, account_id: AccountId) -> Result<RebuildReport, BalanceError> {
        let epsilon = self.config.monetary_epsilon;
        let mut state = self.store.write().await;
        let account = state
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(BalanceError::AccountNotFound(account_id))?;
        let side = account.normal_side();

        // Period activity from posted lines, resolved by entry date.
        let periods: Vec<crate::fiscal::types::AccountingPeriod> = state
            .periods_sorted(account.company_id)
            .into_iter()
            .cloned()
            .collect();
        let mut activity: Vec<(Decimal, Decimal)> = vec![(Decimal::ZERO, Decimal::ZERO); periods.len()];
        for entry in state.entries.values() {
            if entry.company_id != account.company_id
                || entry.deleted
                || entry.status != EntryStatus::Posted
            {
                continue;
            }
            let Some(idx) = periods.iter().position(|p| p.contains_date(entry.entry_date)) else {
                continue;
            };
            for line in entry.lines.iter().filter(|l| l.account_id == account_id) {
                activity[idx].0 += line.debit;
                activity[idx].1 += line.credit;
            }
        }

        let first_active = activity
            .iter()
            .position(|(d, c)| !d.is_zero() || !c.is_zero());

        let mut rows = Vec::new();
        let mut discrepancies = Vec::new();
        let mut carry = account.opening_balance;
        for (idx, period) in periods.iter().enumerate() {
            let (debit, credit) = activity[idx];
            let had_stored = state.balances.contains_key(&(account_id, period.id));
            let within_chain = first_active.is_some_and(|f| idx >= f);
            if !within_chain && !had_stored {
                continue;
            }

            let mut row = LedgerBalance::opening(account_id, period.id, carry);
            row.apply(debit, credit, side);
            carry = row.closing_balance;

            if let Some(stored) = state.balances.get(&(account_id, period.id))
                && (stored.closing_balance - row.closing_balance).abs() > epsilon
            {
                discrepancies.push(BalanceDiscrepancy {
                    period_id: period.id,
                    stored_closing: stored.closing_balance,
                    recomputed_closing: row.closing_balance,
                });
            }
            rows.push(row);
        }

        // Replace the stored chain with the recomputation.
        state.balances.retain(|(acct, _), _| *acct != account_id);
        for row in &rows {
            state.balances.insert((account_id, row.period_id), row.clone());
        }

        if discrepancies.is_empty() {
            tracing::debug!(account = %account_id, rows = rows.len(), "balances rebuilt clean");
        } else {
            tracing::warn!(
                account = %account_id,
                discrepancies = discrepancies.len(),
                "balance rebuild found discrepancies"
            );
        }

        Ok(RebuildReport { rows, discrepancies })
    }
}
