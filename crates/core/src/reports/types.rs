//! Financial report data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CompanyId, CurrencyCode};

use crate::accounts::types::AccountClassification;

/// Optional report filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Include accounts with zero activity or balance.
    pub include_zero_balances: bool,
}

/// One account row in the trial balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account classification.
    pub classification: AccountClassification,
    /// Sum of posted debits through the cut-off.
    pub debit_balance: Decimal,
    /// Sum of posted credits through the cut-off.
    pub credit_balance: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total of the debit column.
    pub total_debit: Decimal,
    /// Total of the credit column.
    pub total_credit: Decimal,
    /// Whether the columns agree within the monetary epsilon.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Company reported on.
    pub company_id: CompanyId,
    /// Cut-off date (inclusive).
    pub as_of: NaiveDate,
    /// Reporting currency.
    pub currency: CurrencyCode,
    /// Account rows, ordered by code.
    pub rows: Vec<TrialBalanceRow>,
    /// Column totals.
    pub totals: TrialBalanceTotals,
}

/// A single account row in a statement section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Signed amount for the row.
    pub amount: Decimal,
}

/// A statement section with its rows and total.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total.
    pub total: Decimal,
    /// Rows, ordered by account code.
    pub rows: Vec<ReportRow>,
}

impl ReportSection {
    /// Adds a row and folds its amount into the total.
    pub fn push(&mut self, row: ReportRow) {
        self.total += row.amount;
        self.rows.push(row);
    }
}

/// Balance sheet report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// Company reported on.
    pub company_id: CompanyId,
    /// Cut-off date (inclusive).
    pub as_of: NaiveDate,
    /// Reporting currency.
    pub currency: CurrencyCode,
    /// Assets section (debit-normal).
    pub assets: ReportSection,
    /// Liabilities section (credit-normal).
    pub liabilities: ReportSection,
    /// Equity section (credit-normal).
    pub equity: ReportSection,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Total equity.
    pub total_equity: Decimal,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity within epsilon.
    pub is_balanced: bool,
}

/// Income statement report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// Company reported on.
    pub company_id: CompanyId,
    /// Range start (inclusive).
    pub period_start: NaiveDate,
    /// Range end (inclusive).
    pub period_end: NaiveDate,
    /// Reporting currency.
    pub currency: CurrencyCode,
    /// Revenue section (Revenue and Gain accounts).
    pub revenue: ReportSection,
    /// Expense section (Expense and Loss accounts).
    pub expenses: ReportSection,
    /// Net income: revenue minus expenses.
    pub net_income: Decimal,
}

/// Cash flow report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowReport {
    /// Company reported on.
    pub company_id: CompanyId,
    /// Range start (inclusive).
    pub period_start: NaiveDate,
    /// Range end (inclusive).
    pub period_end: NaiveDate,
    /// Reporting currency.
    pub currency: CurrencyCode,
    /// Operating activity.
    pub operating: ReportSection,
    /// Investing activity.
    pub investing: ReportSection,
    /// Financing activity.
    pub financing: ReportSection,
    /// Net change in cash: the three sections' sum.
    pub net_change: Decimal,
    /// Cash position entering the range.
    pub opening_cash: Decimal,
    /// Cash position leaving the range.
    pub closing_cash: Decimal,
}
