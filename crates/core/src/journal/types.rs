//! Journal entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    AccountId, CompanyId, CurrencyCode, JournalEntryId, PeriodId, TrackingCategoryId, UserId,
};

/// Journal entry status.
///
/// Entries progress Draft → PendingApproval → Approved → Posted; a posted
/// entry becomes Void only through a reversal. `Reversing` is the transient
/// state of a system-generated reversal entry between creation and posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Being drafted; fully mutable.
    Draft,
    /// Submitted for approval; still mutable.
    PendingApproval,
    /// Approved by an external authority; ready to post.
    Approved,
    /// Applied to ledger balances; immutable.
    Posted,
    /// Negated by a posted reversal; immutable.
    Void,
    /// System-generated reversal awaiting its posting step.
    Reversing,
}

impl EntryStatus {
    /// Returns true if the entry can still be modified.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft | Self::PendingApproval)
    }

    /// Returns true for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Posted | Self::Void)
    }
}

/// A single line of a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Line number, 1-based and contiguous within the entry.
    pub line_number: u32,
    /// Account posted against.
    pub account_id: AccountId,
    /// Optional line description.
    pub description: Option<String>,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Optional tracking category.
    pub tracking_category_id: Option<TrackingCategoryId>,
    /// Debit amount in base currency (zero when credit is set).
    pub debit: Decimal,
    /// Credit amount in base currency (zero when debit is set).
    pub credit: Decimal,
    /// Source currency of the line.
    pub currency: CurrencyCode,
    /// Exchange rate from source to base currency.
    pub exchange_rate: Decimal,
}

/// A journal entry with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Company this entry belongs to.
    pub company_id: CompanyId,
    /// Sequential entry number, `JE-<YYYYMM>-<NNNN>`, unique per company.
    pub entry_number: String,
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Optional memo.
    pub memo: Option<String>,
    /// Entry currency.
    pub currency: CurrencyCode,
    /// Exchange rate from entry currency to base currency.
    pub exchange_rate: Decimal,
    /// Workflow status.
    pub status: EntryStatus,
    /// Adjusting-entry flag.
    pub is_adjusting: bool,
    /// Set on reversal entries generated by the posting engine.
    pub is_reversing: bool,
    /// Bidirectional reversal linkage: on the original it names the
    /// reversal, on the reversal it names the original.
    pub reversed_entry_id: Option<JournalEntryId>,
    /// Accounting period resolved from the entry date, when one exists.
    pub period_id: Option<PeriodId>,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// The entry's lines, ordered by line number.
    pub lines: Vec<JournalLine>,
    /// Who created the entry.
    pub created_by: UserId,
    /// Who approved the entry.
    pub approved_by: Option<UserId>,
    /// Reason recorded when an approval was rejected.
    pub rejection_reason: Option<String>,
    /// Who posted the entry.
    pub posted_by: Option<UserId>,
    /// Posting date in company-local time.
    pub posting_date: Option<NaiveDate>,
    /// Posting instant.
    pub posted_at: Option<DateTime<Utc>>,
    /// Soft-delete flag; deleted entries are hidden from reads.
    pub deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Returns the distinct accounts referenced by this entry's lines.
    #[must_use]
    pub fn touched_accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self.lines.iter().map(|l| l.account_id).collect();
        accounts.sort();
        accounts.dedup();
        accounts
    }
}

/// Input for a single journal line.
#[derive(Debug, Clone)]
pub struct LineInput {
    /// Account posted against.
    pub account_id: AccountId,
    /// Optional line description.
    pub description: Option<String>,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Optional tracking category.
    pub tracking_category_id: Option<TrackingCategoryId>,
    /// Debit amount (set exactly one of debit/credit positive).
    pub debit: Decimal,
    /// Credit amount (set exactly one of debit/credit positive).
    pub credit: Decimal,
    /// Line currency; defaults to the base currency.
    pub currency: Option<CurrencyCode>,
    /// Exchange rate to base currency; defaults to 1.
    pub exchange_rate: Option<Decimal>,
}

impl LineInput {
    /// Convenience constructor for a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            reference: None,
            tracking_category_id: None,
            debit: amount,
            credit: Decimal::ZERO,
            currency: None,
            exchange_rate: None,
        }
    }

    /// Convenience constructor for a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            reference: None,
            tracking_category_id: None,
            debit: Decimal::ZERO,
            credit: amount,
            currency: None,
            exchange_rate: None,
        }
    }
}

/// Input for creating a journal entry.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// Company the entry belongs to.
    pub company_id: CompanyId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Optional external reference.
    pub reference: Option<String>,
    /// Optional memo.
    pub memo: Option<String>,
    /// Entry currency; defaults to the base currency.
    pub currency: Option<CurrencyCode>,
    /// Exchange rate to base currency; defaults to 1.
    pub exchange_rate: Option<Decimal>,
    /// Adjusting-entry flag.
    pub is_adjusting: bool,
    /// The lines (at least 2).
    pub lines: Vec<LineInput>,
    /// Who is creating the entry.
    pub created_by: UserId,
}

/// Patch for updating a Draft or PendingApproval entry.
///
/// Any change recomputes totals and re-runs balance validation.
#[derive(Debug, Clone, Default)]
pub struct UpdateEntryPatch {
    /// New accounting date.
    pub entry_date: Option<NaiveDate>,
    /// New reference (`Some(None)` clears it).
    pub reference: Option<Option<String>>,
    /// New memo (`Some(None)` clears it).
    pub memo: Option<Option<String>>,
    /// Replacement lines.
    pub lines: Option<Vec<LineInput>>,
    /// New adjusting flag.
    pub is_adjusting: Option<bool>,
}

/// Filter options for searching journal entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Filter by status.
    pub status: Option<EntryStatus>,
    /// Entries dated on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Entries dated on or before this date.
    pub date_to: Option<NaiveDate>,
    /// Substring match on the external reference.
    pub reference: Option<String>,
    /// Substring match on the memo.
    pub memo: Option<String>,
    /// Entries touching this account.
    pub account_id: Option<AccountId>,
    /// Filter by creator.
    pub created_by: Option<UserId>,
    /// Filter by approver.
    pub approved_by: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_editable() {
        assert!(EntryStatus::Draft.is_editable());
        assert!(EntryStatus::PendingApproval.is_editable());
        assert!(!EntryStatus::Approved.is_editable());
        assert!(!EntryStatus::Posted.is_editable());
        assert!(!EntryStatus::Void.is_editable());
        assert!(!EntryStatus::Reversing.is_editable());
    }

    #[test]
    fn test_status_terminal() {
        assert!(EntryStatus::Posted.is_terminal());
        assert!(EntryStatus::Void.is_terminal());
        assert!(!EntryStatus::Draft.is_terminal());
        assert!(!EntryStatus::Approved.is_terminal());
    }

    #[test]
    fn test_line_input_constructors() {
        let account = AccountId::new();
        let line = LineInput::debit(account, dec!(100));
        assert_eq!(line.debit, dec!(100));
        assert_eq!(line.credit, Decimal::ZERO);

        let line = LineInput::credit(account, dec!(50));
        assert_eq!(line.credit, dec!(50));
        assert_eq!(line.debit, Decimal::ZERO);
    }
}
