//! Ledger facade.
//!
//! Owns the configuration, clock, and embedded store, and hands out the
//! component services that callers operate through. All services share
//! the same store, so state observed through one is immediately visible
//! through the others.

use std::sync::Arc;

use tally_shared::{Clock, LedgerConfig, SystemClock};

use crate::accounts::registry::AccountRegistry;
use crate::allocation::engine::AllocationService;
use crate::balances::projection::BalanceProjection;
use crate::fiscal::registry::PeriodRegistry;
use crate::journal::store::JournalStore;
use crate::posting::engine::PostingEngine;
use crate::recurring::scheduler::RecurringScheduler;
use crate::reports::service::ReportService;
use crate::store::LedgerStore;

/// The assembled general ledger core.
#[derive(Clone)]
pub struct Ledger {
    accounts: AccountRegistry,
    periods: PeriodRegistry,
    journal: JournalStore,
    posting: PostingEngine,
    balances: BalanceProjection,
    reports: ReportService,
    recurring: RecurringScheduler,
    allocations: AllocationService,
}

impl Ledger {
    /// Assembles the core with the system clock.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Assembles the core with a caller-provided clock.
    #[must_use]
    pub fn with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(LedgerStore::new());
        let config = Arc::new(config);

        let journal = JournalStore::new(Arc::clone(&store), Arc::clone(&config), Arc::clone(&clock));
        let posting = PostingEngine::new(Arc::clone(&store), Arc::clone(&config), Arc::clone(&clock));

        Self {
            accounts: AccountRegistry::new(
                Arc::clone(&store),
                Arc::clone(&config),
                Arc::clone(&clock),
            ),
            periods: PeriodRegistry::new(Arc::clone(&store), Arc::clone(&config), Arc::clone(&clock)),
            balances: BalanceProjection::new(Arc::clone(&store), Arc::clone(&config)),
            reports: ReportService::new(Arc::clone(&store), Arc::clone(&config)),
            recurring: RecurringScheduler::new(
                Arc::clone(&store),
                Arc::clone(&config),
                Arc::clone(&clock),
                journal.clone(),
                posting.clone(),
            ),
            allocations: AllocationService::new(store, config, clock),
            journal,
            posting,
        }
    }

    /// Chart of accounts operations.
    #[must_use]
    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    /// Accounting-period operations.
    #[must_use]
    pub fn periods(&self) -> &PeriodRegistry {
        &self.periods
    }

    /// Journal entry CRUD and workflow transitions.
    #[must_use]
    pub fn journal(&self) -> &JournalStore {
        &self.journal
    }

    /// Posting and reversal.
    #[must_use]
    pub fn posting(&self) -> &PostingEngine {
        &self.posting
    }

    /// Ledger balance reads, forward fill, and rebuild.
    #[must_use]
    pub fn balances(&self) -> &BalanceProjection {
        &self.balances
    }

    /// Trial balance and financial statements.
    #[must_use]
    pub fn reports(&self) -> &ReportService {
        &self.reports
    }

    /// Recurring templates and the scheduler.
    #[must_use]
    pub fn recurring(&self) -> &RecurringScheduler {
        &self.recurring
    }

    /// Allocation rules.
    #[must_use]
    pub fn allocations(&self) -> &AllocationService {
        &self.allocations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_assembles() {
        let ledger = Ledger::new(LedgerConfig::default());
        // Services are wired over one shared store; cloning the facade
        // keeps pointing at the same ledger.
        let _clone = ledger.clone();
    }
}
