//! Statement generator.
//!
//! All four reports are pure functions of posted entries, the account
//! registry state, and (for the balance sheet and cash flow) the stated
//! opening balances. Rows are ordered by account code and amounts stay at
//! full decimal precision, so re-running a report over the same posted
//! dataset reproduces identical numeric rows.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::LedgerConfig;
use tally_shared::types::{AccountId, CompanyId};

use super::types::{
    BalanceSheetReport, CashFlowReport, IncomeStatementReport, ReportOptions, ReportRow,
    ReportSection, TrialBalanceReport, TrialBalanceRow, TrialBalanceTotals,
};
use crate::accounts::types::{Account, AccountClassification, AccountStatus, CashFlowSection};
use crate::store::{LedgerState, LedgerStore};

/// Service generating the trial balance and the three financial statements.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
}

impl ReportService {
    /// Creates a new report service over the shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: Arc<LedgerConfig>) -> Self {
        Self { store, config }
    }

    /// Trial balance: gross posted debits and credits per account through
    /// `as_of`. Balanced iff the two columns agree within epsilon.
    pub async fn trial_balance(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
        options: ReportOptions,
    ) -> TrialBalanceReport {
        let state = self.store.read().await;
        let activity = posted_activity(&state, company_id, None, Some(as_of));

        let mut rows = Vec::new();
        for account in sorted_accounts(&state, company_id) {
            let (debit, credit) = activity
                .get(&account.id)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            if debit.is_zero() && credit.is_zero() && !options.include_zero_balances {
                continue;
            }
            rows.push(TrialBalanceRow {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                classification: account.classification,
                debit_balance: debit,
                credit_balance: credit,
            });
        }

        let total_debit: Decimal = rows.iter().map(|r| r.debit_balance).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit_balance).sum();
        let is_balanced = (total_debit - total_credit).abs() <= self.config.monetary_epsilon;

        TrialBalanceReport {
            company_id,
            as_of,
            currency: self.config.base_currency.clone(),
            rows,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced,
            },
        }
    }

    /// Balance sheet as of a date.
    ///
    /// Partitions Asset / Liability / Equity accounts with balances signed
    /// by the normal side, seeded from stated opening balances. Retained
    /// earnings for the unclosed year appear only once a closing entry has
    /// been posted.
    pub async fn balance_sheet(
        &self,
        company_id: CompanyId,
        as_of: NaiveDate,
        options: ReportOptions,
    ) -> BalanceSheetReport {
        let state = self.store.read().await;
        let activity = posted_activity(&state, company_id, None, Some(as_of));

        let mut assets = ReportSection::default();
        let mut liabilities = ReportSection::default();
        let mut equity = ReportSection::default();

        for account in sorted_accounts(&state, company_id) {
            let section = match account.classification {
                AccountClassification::Asset => &mut assets,
                AccountClassification::Liability => &mut liabilities,
                AccountClassification::Equity => &mut equity,
                _ => continue,
            };
            let (debit, credit) = activity
                .get(&account.id)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            let amount =
                account.opening_balance + account.normal_side().signed_delta(debit, credit);
            if amount.is_zero() && !options.include_zero_balances {
                continue;
            }
            section.push(ReportRow {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                amount,
            });
        }

        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = equity.total;
        let liabilities_and_equity = total_liabilities + total_equity;
        let is_balanced =
            (total_assets - liabilities_and_equity).abs() <= self.config.monetary_epsilon;

        BalanceSheetReport {
            company_id,
            as_of,
            currency: self.config.base_currency.clone(),
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            liabilities_and_equity,
            is_balanced,
        }
    }

    /// Income statement over a date range: Revenue and Gain against
    /// Expense and Loss, each signed by its normal side.
    pub async fn income_statement(
        &self,
        company_id: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
        options: ReportOptions,
    ) -> IncomeStatementReport {
        let state = self.store.read().await;
        let activity = posted_activity(&state, company_id, Some(start), Some(end));

        let mut revenue = ReportSection::default();
        let mut expenses = ReportSection::default();

        for account in sorted_accounts(&state, company_id) {
            let section = match account.classification {
                AccountClassification::Revenue | AccountClassification::Gain => &mut revenue,
                AccountClassification::Expense | AccountClassification::Loss => &mut expenses,
                _ => continue,
            };
            let (debit, credit) = activity
                .get(&account.id)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            let amount = account.normal_side().signed_delta(debit, credit);
            if amount.is_zero() && !options.include_zero_balances {
                continue;
            }
            section.push(ReportRow {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                amount,
            });
        }

        let net_income = revenue.total - expenses.total;

        IncomeStatementReport {
            company_id,
            period_start: start,
            period_end: end,
            currency: self.config.base_currency.clone(),
            revenue,
            expenses,
            net_income,
        }
    }

    /// Cash flow over a date range, derived from posted lines only.
    ///
    /// Each posted line on a Cash/Bank account distributes its cash delta
    /// across the entry's non-cash lines on the opposite side,
    /// proportionally by amount, and lands in the section named by the
    /// contra account's subtype. Transfers between cash positions touch no
    /// section, so the three sections always net to the change in cash.
    pub async fn cash_flow(
        &self,
        company_id: CompanyId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CashFlowReport {
        let state = self.store.read().await;

        // Cash position entering the range.
        let mut opening_cash = Decimal::ZERO;
        let before = start.pred_opt();
        let prior_activity = match before {
            Some(cutoff) => posted_activity(&state, company_id, None, Some(cutoff)),
            None => HashMap::new(),
        };
        for account in state.accounts.values() {
            if account.company_id != company_id || !account.is_cash_position() {
                continue;
            }
            let (debit, credit) = prior_activity
                .get(&account.id)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            opening_cash +=
                account.opening_balance + account.normal_side().signed_delta(debit, credit);
        }

        // Distribute each cash line's delta across the contra side.
        let mut by_account: HashMap<AccountId, Decimal> = HashMap::new();
        for entry in state.entries.values() {
            if entry.company_id != company_id
                || entry.deleted
                || entry.status != crate::journal::types::EntryStatus::Posted
                || entry.entry_date < start
                || entry.entry_date > end
            {
                continue;
            }
            let is_cash = |account_id: AccountId| {
                state
                    .accounts
                    .get(&account_id)
                    .is_some_and(Account::is_cash_position)
            };
            for cash_line in entry.lines.iter().filter(|l| is_cash(l.account_id)) {
                let delta = cash_line.debit - cash_line.credit;
                let inflow = delta > Decimal::ZERO;
                let contra: Vec<(AccountId, Decimal)> = entry
                    .lines
                    .iter()
                    .filter(|l| !is_cash(l.account_id))
                    .map(|l| (l.account_id, if inflow { l.credit } else { l.debit }))
                    .filter(|(_, weight)| *weight > Decimal::ZERO)
                    .collect();
                let total_weight: Decimal = contra.iter().map(|(_, w)| *w).sum();
                if total_weight.is_zero() {
                    continue;
                }
                for (account_id, weight) in contra {
                    *by_account.entry(account_id).or_default() +=
                        delta * weight / total_weight;
                }
            }
        }

        let mut operating = ReportSection::default();
        let mut investing = ReportSection::default();
        let mut financing = ReportSection::default();
        let mut contra_accounts: Vec<(&Account, Decimal)> = by_account
            .iter()
            .filter_map(|(id, amount)| state.accounts.get(id).map(|a| (a, *amount)))
            .collect();
        contra_accounts.sort_by(|(a, _), (b, _)| a.code.cmp(&b.code));
        for (account, amount) in contra_accounts {
            if amount.is_zero() {
                continue;
            }
            let section = match account
                .subtype
                .map_or(CashFlowSection::Operating, |s| s.cash_flow_section())
            {
                CashFlowSection::Operating => &mut operating,
                CashFlowSection::Investing => &mut investing,
                CashFlowSection::Financing => &mut financing,
            };
            section.push(ReportRow {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                amount,
            });
        }

        let net_change = operating.total + investing.total + financing.total;

        CashFlowReport {
            company_id,
            period_start: start,
            period_end: end,
            currency: self.config.base_currency.clone(),
            operating,
            investing,
            financing,
            net_change,
            opening_cash,
            closing_cash: opening_cash + net_change,
        }
    }
}

/// Gross posted (debit, credit) per account over an optional date window.
fn posted_activity(
    state: &LedgerState,
    company_id: CompanyId,
    from: Option<NaiveDate>,
    through: Option<NaiveDate>,
) -> HashMap<AccountId, (Decimal, Decimal)> {
    let mut activity: HashMap<AccountId, (Decimal, Decimal)> = HashMap::new();
    for (_, line) in state.posted_lines(company_id, from, through) {
        let slot = activity.entry(line.account_id).or_default();
        slot.0 += line.debit;
        slot.1 += line.credit;
    }
    activity
}

/// Non-archived accounts of the company, ordered by code.
fn sorted_accounts(state: &LedgerState, company_id: CompanyId) -> Vec<Account> {
    let mut accounts: Vec<Account> = state
        .accounts
        .values()
        .filter(|a| a.company_id == company_id && a.status != AccountStatus::Archived)
        .cloned()
        .collect();
    accounts.sort_by(|a, b| a.code.cmp(&b.code));
    accounts
}
