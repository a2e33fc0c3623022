//! Chart of accounts domain types.
//!
//! Accounts are typed by a closed classification variant; the
//! normal-balance side and statement sectioning are total functions over
//! it, so no runtime polymorphism is needed anywhere downstream.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CompanyId, CurrencyCode};

/// Account classification.
///
/// Determines the normal-balance side and which financial statement the
/// account reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClassification {
    /// Resources owned (debit-normal).
    Asset,
    /// Obligations owed (credit-normal).
    Liability,
    /// Owner's residual interest (credit-normal).
    Equity,
    /// Income from operations (credit-normal).
    Revenue,
    /// Costs of operations (debit-normal).
    Expense,
    /// Non-operating income (credit-normal).
    Gain,
    /// Non-operating costs (debit-normal).
    Loss,
}

impl AccountClassification {
    /// Returns the normal-balance side for this classification.
    #[must_use]
    pub const fn normal_side(self) -> NormalSide {
        match self {
            Self::Asset | Self::Expense | Self::Loss => NormalSide::Debit,
            Self::Liability | Self::Equity | Self::Revenue | Self::Gain => NormalSide::Credit,
        }
    }

    /// Returns true for accounts reported on the balance sheet.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    /// Returns true for accounts reported on the income statement.
    #[must_use]
    pub const fn is_income_statement(self) -> bool {
        !self.is_balance_sheet()
    }
}

/// Side on which an account's balance normally sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    /// Debit-normal: balance grows with debits.
    Debit,
    /// Credit-normal: balance grows with credits.
    Credit,
}

impl NormalSide {
    /// Signed balance change contributed by a (debit, credit) pair.
    #[must_use]
    pub fn signed_delta(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Account subtype.
///
/// Refines the classification for statement sectioning and cash-flow
/// categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSubtype {
    /// Cash on hand.
    Cash,
    /// Bank and money-market accounts.
    Bank,
    /// Trade receivables.
    AccountsReceivable,
    /// Stock held for sale.
    Inventory,
    /// Expenses paid in advance.
    PrepaidExpense,
    /// Property, plant, and equipment.
    FixedAsset,
    /// Contra-asset for accumulated depreciation.
    AccumulatedDepreciation,
    /// Any other asset.
    OtherAsset,
    /// Trade payables.
    AccountsPayable,
    /// Credit card balances.
    CreditCard,
    /// Taxes collected or owed.
    TaxPayable,
    /// Debt due within a year.
    ShortTermLoan,
    /// Debt due beyond a year.
    LongTermDebt,
    /// Any other liability.
    OtherLiability,
    /// Capital contributed by owners.
    ShareCapital,
    /// Accumulated earnings.
    RetainedEarnings,
    /// Distributions to owners.
    OwnerDraw,
    /// Core trading revenue.
    OperatingRevenue,
    /// Non-core revenue.
    OtherRevenue,
    /// Direct cost of goods sold.
    CostOfGoodsSold,
    /// Day-to-day running costs.
    OperatingExpense,
    /// Depreciation and amortization charges.
    Depreciation,
    /// Interest on debt.
    InterestExpense,
    /// Income tax charges.
    TaxExpense,
    /// Any other expense.
    OtherExpense,
}

/// Cash-flow statement section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashFlowSection {
    /// Day-to-day trading activity.
    Operating,
    /// Acquisition and disposal of long-lived assets.
    Investing,
    /// Debt and equity funding activity.
    Financing,
}

impl AccountSubtype {
    /// Returns true for subtypes that represent a cash position.
    #[must_use]
    pub const fn is_cash_position(self) -> bool {
        matches!(self, Self::Cash | Self::Bank)
    }

    /// Cash-flow section for activity against an account of this subtype.
    #[must_use]
    pub const fn cash_flow_section(self) -> CashFlowSection {
        match self {
            Self::FixedAsset | Self::AccumulatedDepreciation | Self::Depreciation => {
                CashFlowSection::Investing
            }
            Self::ShortTermLoan
            | Self::LongTermDebt
            | Self::ShareCapital
            | Self::RetainedEarnings
            | Self::OwnerDraw => CashFlowSection::Financing,
            _ => CashFlowSection::Operating,
        }
    }
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Usable on new journal lines.
    Active,
    /// Hidden from pickers; existing history remains.
    Inactive,
    /// Soft-deleted; the code is free for reuse.
    Archived,
}

/// A chart of accounts entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Company (tenant) this account belongs to.
    pub company_id: CompanyId,
    /// Account code, uppercase, unique per company among non-archived accounts.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Classification driving the normal side and statement placement.
    pub classification: AccountClassification,
    /// Optional subtype refinement.
    pub subtype: Option<AccountSubtype>,
    /// Parent account in the hierarchy (acyclic).
    pub parent_id: Option<AccountId>,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// System accounts cannot be deleted or retyped.
    pub is_system: bool,
    /// Flagged for tax reporting.
    pub is_tax_related: bool,
    /// Eligible for reconciliation workflows.
    pub is_reconcilable: bool,
    /// Account currency (ISO 4217).
    pub currency: CurrencyCode,
    /// Opening balance, on the account's normal side.
    pub opening_balance: Decimal,
    /// Date the opening balance takes effect.
    pub opening_balance_date: Option<NaiveDate>,
    /// Set when a child account is created under this one.
    pub has_children: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns the normal-balance side for this account.
    #[must_use]
    pub const fn normal_side(&self) -> NormalSide {
        self.classification.normal_side()
    }

    /// Returns true if the account may appear on new journal lines.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Returns true if the account represents a cash position.
    #[must_use]
    pub fn is_cash_position(&self) -> bool {
        self.subtype.is_some_and(AccountSubtype::is_cash_position)
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Company the account belongs to.
    pub company_id: CompanyId,
    /// Account code; uppercased on create.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Classification.
    pub classification: AccountClassification,
    /// Optional subtype.
    pub subtype: Option<AccountSubtype>,
    /// Optional parent account.
    pub parent_id: Option<AccountId>,
    /// System account flag.
    pub is_system: bool,
    /// Tax-related flag.
    pub is_tax_related: bool,
    /// Reconcilable flag.
    pub is_reconcilable: bool,
    /// Account currency.
    pub currency: CurrencyCode,
    /// Opening balance on the normal side.
    pub opening_balance: Decimal,
    /// Effective date of the opening balance.
    pub opening_balance_date: Option<NaiveDate>,
}

/// Patch for updating an account.
///
/// `None` leaves a field unchanged; `parent_id` uses a nested `Option` so
/// an account can be explicitly detached from its parent.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountPatch {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// New classification (rejected once posted lines exist).
    pub classification: Option<AccountClassification>,
    /// New subtype (rejected once posted lines exist).
    pub subtype: Option<Option<AccountSubtype>>,
    /// New parent (`Some(None)` detaches).
    pub parent_id: Option<Option<AccountId>>,
    /// New status.
    pub status: Option<AccountStatus>,
    /// New tax-related flag.
    pub is_tax_related: Option<bool>,
    /// New reconcilable flag (rejected once posted lines exist).
    pub is_reconcilable: Option<bool>,
    /// New currency.
    pub currency: Option<CurrencyCode>,
    /// New opening balance.
    pub opening_balance: Option<Decimal>,
    /// New opening balance date.
    pub opening_balance_date: Option<Option<NaiveDate>>,
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Filter by status.
    pub status: Option<AccountStatus>,
    /// Filter by classification.
    pub classification: Option<AccountClassification>,
    /// Filter by parent (`Some(None)` = root accounts only).
    pub parent_id: Option<Option<AccountId>>,
}

/// A node in the account hierarchy tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountNode {
    /// The account at this node.
    pub account: Account,
    /// Child nodes, ordered by code.
    pub children: Vec<AccountNode>,
}

/// Result of an account balance query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    /// The queried account.
    pub account_id: AccountId,
    /// The queried account's code.
    pub code: String,
    /// Balance cut-off date (inclusive); `None` means all posted activity.
    pub as_of: Option<NaiveDate>,
    /// Whether descendant accounts were included.
    pub include_children: bool,
    /// Total posted debits through the cut-off.
    pub debit_total: Decimal,
    /// Total posted credits through the cut-off.
    pub credit_total: Decimal,
    /// Net balance signed by the account's normal side.
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normal_side_total_function() {
        assert_eq!(AccountClassification::Asset.normal_side(), NormalSide::Debit);
        assert_eq!(AccountClassification::Expense.normal_side(), NormalSide::Debit);
        assert_eq!(AccountClassification::Loss.normal_side(), NormalSide::Debit);
        assert_eq!(AccountClassification::Liability.normal_side(), NormalSide::Credit);
        assert_eq!(AccountClassification::Equity.normal_side(), NormalSide::Credit);
        assert_eq!(AccountClassification::Revenue.normal_side(), NormalSide::Credit);
        assert_eq!(AccountClassification::Gain.normal_side(), NormalSide::Credit);
    }

    #[test]
    fn test_signed_delta() {
        // Debit-normal: debits increase the balance
        assert_eq!(NormalSide::Debit.signed_delta(dec!(100), dec!(30)), dec!(70));
        // Credit-normal: credits increase the balance
        assert_eq!(NormalSide::Credit.signed_delta(dec!(30), dec!(100)), dec!(70));
        assert_eq!(NormalSide::Credit.signed_delta(dec!(100), dec!(0)), dec!(-100));
    }

    #[test]
    fn test_statement_placement() {
        assert!(AccountClassification::Asset.is_balance_sheet());
        assert!(AccountClassification::Liability.is_balance_sheet());
        assert!(AccountClassification::Equity.is_balance_sheet());
        assert!(AccountClassification::Revenue.is_income_statement());
        assert!(AccountClassification::Gain.is_income_statement());
        assert!(AccountClassification::Loss.is_income_statement());
    }

    #[test]
    fn test_cash_position_subtypes() {
        assert!(AccountSubtype::Cash.is_cash_position());
        assert!(AccountSubtype::Bank.is_cash_position());
        assert!(!AccountSubtype::AccountsReceivable.is_cash_position());
    }

    #[test]
    fn test_cash_flow_sections() {
        assert_eq!(
            AccountSubtype::FixedAsset.cash_flow_section(),
            CashFlowSection::Investing
        );
        assert_eq!(
            AccountSubtype::LongTermDebt.cash_flow_section(),
            CashFlowSection::Financing
        );
        assert_eq!(
            AccountSubtype::AccountsReceivable.cash_flow_section(),
            CashFlowSection::Operating
        );
        assert_eq!(
            AccountSubtype::OperatingExpense.cash_flow_section(),
            CashFlowSection::Operating
        );
    }
}
