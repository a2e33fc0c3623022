//! Embedded ledger store.
//!
//! Holds every entity table behind one async `RwLock` plus the lock
//! registries used for per-account and per-company serialization. The
//! unique indexes required by the outer layers (`(company, code)` on
//! active accounts, `(company, entry_number)` on entries, `(account,
//! period)` on balances) are maintained here and nowhere else.
//!
//! Mutations performed under a single write guard commit atomically:
//! readers never observe a partially-applied post.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tally_shared::types::{
    AccountId, AllocationRuleId, CompanyId, JournalEntryId, PeriodId, TemplateId,
};

use crate::accounts::types::Account;
use crate::allocation::types::AllocationRule;
use crate::balances::types::LedgerBalance;
use crate::fiscal::types::AccountingPeriod;
use crate::journal::types::{EntryStatus, JournalEntry, JournalLine};
use crate::recurring::types::RecurringTemplate;

/// In-memory tables plus the secondary indexes over them.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    /// Chart of accounts.
    pub accounts: HashMap<AccountId, Account>,
    /// `(company, code)` unique index over non-archived accounts.
    pub account_codes: HashMap<(CompanyId, String), AccountId>,
    /// Accounting periods.
    pub periods: HashMap<PeriodId, AccountingPeriod>,
    /// Journal entries with embedded lines.
    pub entries: HashMap<JournalEntryId, JournalEntry>,
    /// `(company, entry_number)` unique index.
    pub entry_numbers: HashMap<(CompanyId, String), JournalEntryId>,
    /// Last allocated sequence per `(company, YYYYMM)`.
    pub sequences: HashMap<(CompanyId, String), u32>,
    /// `(account, period)` unique balance rows.
    pub balances: HashMap<(AccountId, PeriodId), LedgerBalance>,
    /// Recurring templates.
    pub templates: HashMap<TemplateId, RecurringTemplate>,
    /// `(template, entry_date)` occurrences already generated.
    pub generated_occurrences: HashSet<(TemplateId, NaiveDate)>,
    /// Allocation rules.
    pub rules: HashMap<AllocationRuleId, AllocationRule>,
}

impl LedgerState {
    /// Periods of a company ordered by start date.
    pub fn periods_sorted(&self, company_id: CompanyId) -> Vec<&AccountingPeriod> {
        let mut periods: Vec<&AccountingPeriod> = self
            .periods
            .values()
            .filter(|p| p.company_id == company_id)
            .collect();
        periods.sort_by_key(|p| p.start_date);
        periods
    }

    /// Resolves the period containing the given date, if any.
    pub fn resolve_period(&self, company_id: CompanyId, date: NaiveDate) -> Option<&AccountingPeriod> {
        self.periods
            .values()
            .find(|p| p.company_id == company_id && p.contains_date(date))
    }

    /// The period immediately preceding `period` for the same company.
    pub fn previous_period(&self, period: &AccountingPeriod) -> Option<&AccountingPeriod> {
        self.periods
            .values()
            .filter(|p| p.company_id == period.company_id && p.end_date < period.start_date)
            .max_by_key(|p| p.end_date)
    }

    /// Periods of the company strictly between two periods, ordered by start.
    pub fn periods_between(
        &self,
        company_id: CompanyId,
        after_end: NaiveDate,
        before_start: NaiveDate,
    ) -> Vec<&AccountingPeriod> {
        let mut periods: Vec<&AccountingPeriod> = self
            .periods
            .values()
            .filter(|p| {
                p.company_id == company_id
                    && p.start_date > after_end
                    && p.end_date < before_start
            })
            .collect();
        periods.sort_by_key(|p| p.start_date);
        periods
    }

    /// Iterates posted lines of a company, optionally bounded by date.
    pub fn posted_lines(
        &self,
        company_id: CompanyId,
        from: Option<NaiveDate>,
        through: Option<NaiveDate>,
    ) -> impl Iterator<Item = (&JournalEntry, &JournalLine)> {
        self.entries
            .values()
            .filter(move |e| {
                e.company_id == company_id
                    && !e.deleted
                    && e.status == EntryStatus::Posted
                    && from.is_none_or(|d| e.entry_date >= d)
                    && through.is_none_or(|d| e.entry_date <= d)
            })
            .flat_map(|e| e.lines.iter().map(move |l| (e, l)))
    }

    /// Returns true if any posted, non-deleted line references the account.
    pub fn account_has_posted_lines(&self, account_id: AccountId) -> bool {
        self.entries.values().any(|e| {
            !e.deleted
                && e.status == EntryStatus::Posted
                && e.lines.iter().any(|l| l.account_id == account_id)
        })
    }

    /// Direct children of an account, non-archived only.
    pub fn child_accounts(&self, parent_id: AccountId) -> Vec<&Account> {
        self.accounts
            .values()
            .filter(|a| a.parent_id == Some(parent_id))
            .collect()
    }

    /// The account plus all its descendants, depth-first.
    pub fn account_with_descendants(&self, root: AccountId) -> Vec<AccountId> {
        let mut result = vec![root];
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            for child in self.accounts.values().filter(|a| a.parent_id == Some(current)) {
                result.push(child.id);
                stack.push(child.id);
            }
        }
        result
    }

    /// Walks ancestor links from `start`; returns true if `needle` is
    /// reached. Used to reject hierarchy cycles before persisting a parent
    /// change.
    pub fn is_ancestor_or_self(&self, needle: AccountId, start: AccountId) -> bool {
        let mut current = Some(start);
        let mut hops = 0usize;
        while let Some(id) = current {
            if id == needle {
                return true;
            }
            // Defensive bound: the chart is far shallower than this.
            hops += 1;
            if hops > self.accounts.len() {
                return true;
            }
            current = self.accounts.get(&id).and_then(|a| a.parent_id);
        }
        false
    }

    /// Allocates the next entry number for the company and month,
    /// formatted `JE-<YYYYMM>-<NNNN>`. Strictly monotonic per key.
    pub fn next_entry_number(&mut self, company_id: CompanyId, entry_date: NaiveDate) -> String {
        let prefix = crate::journal::numbering::month_prefix(entry_date);
        let seq = self
            .sequences
            .entry((company_id, prefix.clone()))
            .and_modify(|s| *s += 1)
            .or_insert(1);
        crate::journal::numbering::format_entry_number(&prefix, *seq)
    }
}

/// Shared, concurrency-safe ledger store.
#[derive(Debug, Default)]
pub struct LedgerStore {
    state: RwLock<LedgerState>,
    account_locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
    company_locks: Mutex<HashMap<CompanyId, Arc<Mutex<()>>>>,
}

impl LedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a shared read guard over the state.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().await
    }

    /// Takes the exclusive write guard; everything mutated under one guard
    /// commits atomically.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().await
    }

    /// Locks the given accounts in ascending id order (deadlock-free) and
    /// returns the held guards. Concurrent posts sharing an account
    /// serialize here; disjoint posts proceed in parallel.
    pub(crate) async fn lock_accounts(&self, accounts: &[AccountId]) -> Vec<OwnedMutexGuard<()>> {
        let mut ids: Vec<AccountId> = accounts.to_vec();
        ids.sort();
        ids.dedup();

        let handles: Vec<Arc<Mutex<()>>> = {
            let mut registry = self.account_locks.lock().await;
            ids.iter()
                .map(|id| Arc::clone(registry.entry(*id).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }
        guards
    }

    /// Locks the company-scoped lock used to serialize period close
    /// against posting.
    pub(crate) async fn lock_company(&self, company_id: CompanyId) -> OwnedMutexGuard<()> {
        let handle = {
            let mut registry = self.company_locks.lock().await;
            Arc::clone(registry.entry(company_id).or_default())
        };
        handle.lock_owned().await
    }
}
