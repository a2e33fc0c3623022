//! Journal store service.
//!
//! Persists journal entries and their lines, enforcing the structural
//! invariants at create and update time. Entries are born Draft; the
//! approval transitions here are the hook surface for an external
//! workflow, and no routing policy lives in the core.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::types::{CompanyId, JournalEntryId, PageRequest, PageResponse, UserId};
use tally_shared::{Clock, LedgerConfig};

use super::error::JournalError;
use super::types::{
    CreateEntryInput, EntryFilter, EntryStatus, JournalEntry, UpdateEntryPatch,
};
use super::validation::{LineAccountInfo, validate_lines};
use crate::store::LedgerStore;

/// Service for journal entry CRUD and workflow transitions.
#[derive(Clone)]
pub struct JournalStore {
    store: Arc<LedgerStore>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
}

impl JournalStore {
    /// Creates a new journal store over the shared store.
    #[must_use]
    pub fn new(store: Arc<LedgerStore>, config: Arc<LedgerConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, clock }
    }

    /// Creates a Draft entry.
    ///
    /// Lines are validated structurally and numbered; the period is
    /// resolved from the entry date when one covers it (a Draft without an
    /// open period may be stored but cannot advance to Posted). The entry
    /// number comes from the atomic per-company monthly sequence.
    pub async fn create_entry(&self, input: CreateEntryInput) -> Result<JournalEntry, JournalError> {
        let exchange_rate = input.exchange_rate.unwrap_or(Decimal::ONE);
        if exchange_rate <= Decimal::ZERO {
            return Err(JournalError::InvalidExchangeRate);
        }
        let currency = input
            .currency
            .clone()
            .unwrap_or_else(|| self.config.base_currency.clone());
        let now = self.clock.now_utc();

        let mut state = self.store.write().await;

        let validated = validate_lines(
            &input.lines,
            &self.config.base_currency,
            self.config.monetary_epsilon,
            |id| {
                state
                    .accounts
                    .get(&id)
                    .filter(|a| a.company_id == input.company_id)
                    .map(|a| LineAccountInfo {
                        id: a.id,
                        is_active: a.is_active(),
                    })
                    .ok_or(JournalError::AccountNotFound(id))
            },
        )?;

        let period_id = state
            .resolve_period(input.company_id, input.entry_date)
            .map(|p| p.id);

        let entry_number = state.next_entry_number(input.company_id, input.entry_date);
        if state
            .entry_numbers
            .contains_key(&(input.company_id, entry_number.clone()))
        {
            return Err(JournalError::DuplicateEntryNumber(entry_number));
        }

        let entry = JournalEntry {
            id: JournalEntryId::new(),
            company_id: input.company_id,
            entry_number: entry_number.clone(),
            entry_date: input.entry_date,
            reference: input.reference,
            memo: input.memo,
            currency,
            exchange_rate,
            status: EntryStatus::Draft,
            is_adjusting: input.is_adjusting,
            is_reversing: false,
            reversed_entry_id: None,
            period_id,
            total_debit: validated.total_debit,
            total_credit: validated.total_credit,
            lines: validated.lines,
            created_by: input.created_by,
            approved_by: None,
            rejection_reason: None,
            posted_by: None,
            posting_date: None,
            posted_at: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        state
            .entry_numbers
            .insert((input.company_id, entry_number), entry.id);
        state.entries.insert(entry.id, entry.clone());

        tracing::debug!(entry = %entry.entry_number, "journal entry created");
        Ok(entry)
    }

    /// Fetches an entry by id.
    pub async fn get_entry(&self, id: JournalEntryId) -> Result<JournalEntry, JournalError> {
        let state = self.store.read().await;
        state
            .entries
            .get(&id)
            .filter(|e| !e.deleted)
            .cloned()
            .ok_or(JournalError::NotFound(id))
    }

    /// Updates a Draft or PendingApproval entry.
    ///
    /// Any field change recomputes totals and re-runs balance validation;
    /// Posted and Void entries accept no mutations.
    pub async fn update_entry(
        &self,
        id: JournalEntryId,
        patch: UpdateEntryPatch,
    ) -> Result<JournalEntry, JournalError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;

        let current = state
            .entries
            .get(&id)
            .filter(|e| !e.deleted)
            .cloned()
            .ok_or(JournalError::NotFound(id))?;
        if !current.status.is_editable() {
            return Err(JournalError::NotEditable(current.status));
        }

        let entry_date = patch.entry_date.unwrap_or(current.entry_date);

        let validated = match &patch.lines {
            Some(lines) => Some(validate_lines(
                lines,
                &self.config.base_currency,
                self.config.monetary_epsilon,
                |account_id| {
                    state
                        .accounts
                        .get(&account_id)
                        .filter(|a| a.company_id == current.company_id)
                        .map(|a| LineAccountInfo {
                            id: a.id,
                            is_active: a.is_active(),
                        })
                        .ok_or(JournalError::AccountNotFound(account_id))
                },
            )?),
            None => None,
        };

        let period_id = state
            .resolve_period(current.company_id, entry_date)
            .map(|p| p.id);

        let entry = state
            .entries
            .get_mut(&id)
            .ok_or(JournalError::NotFound(id))?;
        entry.entry_date = entry_date;
        entry.period_id = period_id;
        if let Some(reference) = patch.reference {
            entry.reference = reference;
        }
        if let Some(memo) = patch.memo {
            entry.memo = memo;
        }
        if let Some(is_adjusting) = patch.is_adjusting {
            entry.is_adjusting = is_adjusting;
        }
        if let Some(validated) = validated {
            entry.lines = validated.lines;
            entry.total_debit = validated.total_debit;
            entry.total_credit = validated.total_credit;
        }
        entry.updated_at = now;

        Ok(entry.clone())
    }

    /// Soft-deletes a Draft entry.
    ///
    /// Every other status requires a reversal through the posting engine.
    pub async fn delete_entry(&self, id: JournalEntryId) -> Result<(), JournalError> {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;

        let entry = state
            .entries
            .get_mut(&id)
            .filter(|e| !e.deleted)
            .ok_or(JournalError::NotFound(id))?;
        if entry.status != EntryStatus::Draft {
            return Err(JournalError::CanOnlyDeleteDraft);
        }
        entry.deleted = true;
        entry.updated_at = now;

        tracing::debug!(entry = %entry.entry_number, "journal entry deleted");
        Ok(())
    }

    /// Searches entries with filters and pagination, ordered by entry date
    /// then entry number.
    pub async fn search(
        &self,
        company_id: CompanyId,
        filter: EntryFilter,
        page: PageRequest,
    ) -> PageResponse<JournalEntry> {
        let state = self.store.read().await;
        let mut entries: Vec<JournalEntry> = state
            .entries
            .values()
            .filter(|e| e.company_id == company_id && !e.deleted)
            .filter(|e| filter.status.is_none_or(|s| e.status == s))
            .filter(|e| filter.date_from.is_none_or(|d| e.entry_date >= d))
            .filter(|e| filter.date_to.is_none_or(|d| e.entry_date <= d))
            .filter(|e| {
                filter.reference.as_ref().is_none_or(|needle| {
                    e.reference.as_ref().is_some_and(|r| r.contains(needle))
                })
            })
            .filter(|e| {
                filter
                    .memo
                    .as_ref()
                    .is_none_or(|needle| e.memo.as_ref().is_some_and(|m| m.contains(needle)))
            })
            .filter(|e| {
                filter
                    .account_id
                    .is_none_or(|a| e.lines.iter().any(|l| l.account_id == a))
            })
            .filter(|e| filter.created_by.is_none_or(|u| e.created_by == u))
            .filter(|e| filter.approved_by.is_none_or(|u| e.approved_by == Some(u)))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.entry_number.cmp(&b.entry_number))
        });

        let total = entries.len() as u64;
        let data: Vec<JournalEntry> = entries
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();
        PageResponse::new(data, page.page, page.per_page, total)
    }

    /// Submits a Draft entry for approval.
    pub async fn submit_for_approval(
        &self,
        id: JournalEntryId,
    ) -> Result<JournalEntry, JournalError> {
        self.transition(id, EntryStatus::Draft, EntryStatus::PendingApproval, |_| {})
            .await
    }

    /// Marks a PendingApproval entry Approved.
    ///
    /// The approver is whatever external authority the caller consulted;
    /// the core records it without policy checks.
    pub async fn approve(
        &self,
        id: JournalEntryId,
        approver: UserId,
    ) -> Result<JournalEntry, JournalError> {
        self.transition(
            id,
            EntryStatus::PendingApproval,
            EntryStatus::Approved,
            |entry| {
                entry.approved_by = Some(approver);
                entry.rejection_reason = None;
            },
        )
        .await
    }

    /// Rejects a PendingApproval entry back to Draft, recording the reason.
    pub async fn reject(
        &self,
        id: JournalEntryId,
        reason: impl Into<String>,
    ) -> Result<JournalEntry, JournalError> {
        let reason = reason.into();
        self.transition(
            id,
            EntryStatus::PendingApproval,
            EntryStatus::Draft,
            move |entry| {
                entry.rejection_reason = Some(reason);
                entry.approved_by = None;
            },
        )
        .await
    }

    async fn transition<F>(
        &self,
        id: JournalEntryId,
        from: EntryStatus,
        to: EntryStatus,
        mutate: F,
    ) -> Result<JournalEntry, JournalError>
    where
        F: FnOnce(&mut JournalEntry),
    {
        let now = self.clock.now_utc();
        let mut state = self.store.write().await;
        let entry = state
            .entries
            .get_mut(&id)
            .filter(|e| !e.deleted)
            .ok_or(JournalError::NotFound(id))?;
        if entry.status != from {
            return Err(JournalError::InvalidTransition {
                from: entry.status,
                to,
            });
        }
        entry.status = to;
        mutate(entry);
        entry.updated_at = now;
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::registry::AccountRegistry;
    use crate::accounts::types::{AccountClassification, CreateAccountInput};
    use crate::journal::types::LineInput;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::FixedClock;
    use tally_shared::types::{AccountId, CurrencyCode};

    struct Fixture {
        journal: JournalStore,
        accounts: AccountRegistry,
        company: CompanyId,
        user: UserId,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> Fixture {
        let store = Arc::new(LedgerStore::new());
        let config = Arc::new(LedgerConfig::default());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_date(date(2025, 1, 1)));
        Fixture {
            journal: JournalStore::new(Arc::clone(&store), Arc::clone(&config), Arc::clone(&clock)),
            accounts: AccountRegistry::new(store, config, clock),
            company: CompanyId::new(),
            user: UserId::new(),
        }
    }

    async fn make_account(fx: &Fixture, code: &str, classification: AccountClassification) -> AccountId {
        fx.accounts
            .create_account(CreateAccountInput {
                company_id: fx.company,
                code: code.to_string(),
                name: format!("Account {code}"),
                description: None,
                classification,
                subtype: None,
                parent_id: None,
                is_system: false,
                is_tax_related: false,
                is_reconcilable: false,
                currency: CurrencyCode::usd(),
                opening_balance: dec!(0),
                opening_balance_date: None,
            })
            .await
            .unwrap()
            .id
    }

    fn entry_input(fx: &Fixture, cash: AccountId, revenue: AccountId) -> CreateEntryInput {
        CreateEntryInput {
            company_id: fx.company,
            entry_date: date(2025, 1, 15),
            reference: Some("INV-100".to_string()),
            memo: Some("January sales".to_string()),
            currency: None,
            exchange_rate: None,
            is_adjusting: false,
            lines: vec![
                LineInput::debit(cash, dec!(1000)),
                LineInput::credit(revenue, dec!(1000)),
            ],
            created_by: fx.user,
        }
    }

    #[tokio::test]
    async fn test_create_entry_assigns_sequential_numbers() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;

        let first = fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();
        let second = fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();

        assert_eq!(first.entry_number, "JE-202501-0001");
        assert_eq!(second.entry_number, "JE-202501-0002");
        assert_eq!(first.status, EntryStatus::Draft);
        assert_eq!(first.total_debit, dec!(1000));
        assert_eq!(first.total_credit, dec!(1000));
    }

    #[tokio::test]
    async fn test_create_entry_without_period_is_draft_only() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;

        // No period has been opened, so the entry stores with no period.
        let entry = fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();
        assert!(entry.period_id.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_unbalanced() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;

        let mut input = entry_input(&fx, cash, revenue);
        input.lines[1] = LineInput::credit(revenue, dec!(900));
        let err = fx.journal.create_entry(input).await.unwrap_err();
        assert!(matches!(err, JournalError::Unbalanced { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_company_account() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;

        let mut input = entry_input(&fx, cash, revenue);
        input.company_id = CompanyId::new();
        let err = fx.journal.create_entry(input).await.unwrap_err();
        assert!(matches!(err, JournalError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_recomputes_totals() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;
        let entry = fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();

        let updated = fx
            .journal
            .update_entry(
                entry.id,
                UpdateEntryPatch {
                    lines: Some(vec![
                        LineInput::debit(cash, dec!(250)),
                        LineInput::credit(revenue, dec!(250)),
                    ]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_debit, dec!(250));
        assert_eq!(updated.entry_number, entry.entry_number);
    }

    #[tokio::test]
    async fn test_delete_draft_only() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;
        let entry = fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();

        fx.journal.submit_for_approval(entry.id).await.unwrap();
        let err = fx.journal.delete_entry(entry.id).await.unwrap_err();
        assert!(matches!(err, JournalError::CanOnlyDeleteDraft));

        fx.journal.reject(entry.id, "not yet").await.unwrap();
        fx.journal.delete_entry(entry.id).await.unwrap();
        assert!(matches!(
            fx.journal.get_entry(entry.id).await,
            Err(JournalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_approval_round_trip() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;
        let entry = fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();

        // Draft cannot be approved directly.
        let err = fx.journal.approve(entry.id, fx.user).await.unwrap_err();
        assert!(matches!(err, JournalError::InvalidTransition { .. }));

        fx.journal.submit_for_approval(entry.id).await.unwrap();
        let rejected = fx.journal.reject(entry.id, "wrong account").await.unwrap();
        assert_eq!(rejected.status, EntryStatus::Draft);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("wrong account"));

        fx.journal.submit_for_approval(entry.id).await.unwrap();
        let approved = fx.journal.approve(entry.id, fx.user).await.unwrap();
        assert_eq!(approved.status, EntryStatus::Approved);
        assert_eq!(approved.approved_by, Some(fx.user));
        assert!(approved.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn test_approved_entry_is_not_editable() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;
        let entry = fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();
        fx.journal.submit_for_approval(entry.id).await.unwrap();
        fx.journal.approve(entry.id, fx.user).await.unwrap();

        let err = fx
            .journal
            .update_entry(entry.id, UpdateEntryPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::NotEditable(EntryStatus::Approved)));
    }

    #[tokio::test]
    async fn test_search_filters() {
        let fx = fixture();
        let cash = make_account(&fx, "1010", AccountClassification::Asset).await;
        let revenue = make_account(&fx, "4000", AccountClassification::Revenue).await;
        let expense = make_account(&fx, "6000", AccountClassification::Expense).await;

        fx.journal.create_entry(entry_input(&fx, cash, revenue)).await.unwrap();
        let mut other = entry_input(&fx, expense, cash);
        other.entry_date = date(2025, 2, 10);
        other.memo = Some("February rent".to_string());
        fx.journal.create_entry(other).await.unwrap();

        let by_memo = fx
            .journal
            .search(
                fx.company,
                EntryFilter {
                    memo: Some("rent".to_string()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await;
        assert_eq!(by_memo.meta.total, 1);
        assert_eq!(by_memo.data[0].entry_date, date(2025, 2, 10));

        let by_account = fx
            .journal
            .search(
                fx.company,
                EntryFilter {
                    account_id: Some(cash),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await;
        assert_eq!(by_account.meta.total, 2);

        let by_dates = fx
            .journal
            .search(
                fx.company,
                EntryFilter {
                    date_from: Some(date(2025, 2, 1)),
                    date_to: Some(date(2025, 2, 28)),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await;
        assert_eq!(by_dates.meta.total, 1);
    }
}
