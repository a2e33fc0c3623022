use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, CompanyId, CurrencyCode, UserId};
use tally_shared::{Clock, FixedClock, LedgerConfig};

use crate::accounts::registry::AccountRegistry;
use crate::accounts::types::{AccountClassification, AccountSubtype, CreateAccountInput};
use crate::fiscal::registry::PeriodRegistry;
use crate::journal::store::JournalStore;
use crate::journal::types::{CreateEntryInput, LineInput};
use crate::posting::engine::PostingEngine;
use crate::reports::service::ReportService;
use crate::reports::types::ReportOptions;
use crate::store::LedgerStore;

struct Fixture {
    reports: ReportService,
    journal: JournalStore,
    engine: PostingEngine,
    accounts: AccountRegistry,
    periods: PeriodRegistry,
    company: CompanyId,
    user: UserId,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fixture() -> Fixture {
    let store = Arc::new(LedgerStore::new());
    let config = Arc::new(LedgerConfig::default());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_date(date(2025, 1, 31)));
    Fixture {
        reports: ReportService::new(Arc::clone(&store), Arc::clone(&config)),
        journal: JournalStore::new(Arc::clone(&store), Arc::clone(&config), Arc::clone(&clock)),
        engine: PostingEngine::new(Arc::clone(&store), Arc::clone(&config), Arc::clone(&clock)),
        accounts: AccountRegistry::new(Arc::clone(&store), Arc::clone(&config), Arc::clone(&clock)),
        periods: PeriodRegistry::new(store, config, clock),
        company: CompanyId::new(),
        user: UserId::new(),
    }
}

async fn account(
    fx: &Fixture,
    code: &str,
    classification: AccountClassification,
    subtype: Option<AccountSubtype>,
    opening: Decimal,
) -> AccountId {
    fx.accounts
        .create_account(CreateAccountInput {
            company_id: fx.company,
            code: code.to_string(),
            name: format!("Account {code}"),
            description: None,
            classification,
            subtype,
            parent_id: None,
            is_system: false,
            is_tax_related: false,
            is_reconcilable: false,
            currency: CurrencyCode::usd(),
            opening_balance: opening,
            opening_balance_date: None,
        })
        .await
        .unwrap()
        .id
}

async fn post(fx: &Fixture, entry_date: NaiveDate, lines: Vec<LineInput>) {
    let entry = fx
        .journal
        .create_entry(CreateEntryInput {
            company_id: fx.company,
            entry_date,
            reference: None,
            memo: None,
            currency: None,
            exchange_rate: None,
            is_adjusting: false,
            lines,
            created_by: fx.user,
        })
        .await
        .unwrap();
    fx.journal.submit_for_approval(entry.id).await.unwrap();
    fx.journal.approve(entry.id, fx.user).await.unwrap();
    fx.engine.post(entry.id, fx.user).await.unwrap();
}

#[tokio::test]
async fn test_trial_balance_balances() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let cash = account(&fx, "1010", AccountClassification::Asset, None, dec!(0)).await;
    let revenue = account(&fx, "4000", AccountClassification::Revenue, None, dec!(0)).await;
    let expense = account(&fx, "6000", AccountClassification::Expense, None, dec!(0)).await;

    post(
        &fx,
        date(2025, 1, 15),
        vec![LineInput::debit(cash, dec!(1000)), LineInput::credit(revenue, dec!(1000))],
    )
    .await;
    post(
        &fx,
        date(2025, 1, 20),
        vec![LineInput::debit(expense, dec!(400)), LineInput::credit(cash, dec!(400))],
    )
    .await;

    let report = fx
        .reports
        .trial_balance(fx.company, date(2025, 1, 31), ReportOptions::default())
        .await;

    assert!(report.totals.is_balanced);
    assert_eq!(report.totals.total_debit, dec!(1400));
    assert_eq!(report.totals.total_credit, dec!(1400));
    // Ordered by code: 1010, 4000, 6000.
    let codes: Vec<&str> = report.rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["1010", "4000", "6000"]);
    assert_eq!(report.rows[0].debit_balance, dec!(1000));
    assert_eq!(report.rows[0].credit_balance, dec!(400));
}

#[tokio::test]
async fn test_trial_balance_zero_rows_opt_in() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let cash = account(&fx, "1010", AccountClassification::Asset, None, dec!(0)).await;
    let revenue = account(&fx, "4000", AccountClassification::Revenue, None, dec!(0)).await;
    account(&fx, "9999", AccountClassification::Expense, None, dec!(0)).await;

    post(
        &fx,
        date(2025, 1, 15),
        vec![LineInput::debit(cash, dec!(100)), LineInput::credit(revenue, dec!(100))],
    )
    .await;

    let without = fx
        .reports
        .trial_balance(fx.company, date(2025, 1, 31), ReportOptions::default())
        .await;
    assert_eq!(without.rows.len(), 2);

    let with = fx
        .reports
        .trial_balance(
            fx.company,
            date(2025, 1, 31),
            ReportOptions { include_zero_balances: true },
        )
        .await;
    assert_eq!(with.rows.len(), 3);
}

#[tokio::test]
async fn test_trial_balance_cutoff_excludes_later_activity() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    fx.periods
        .open_period(fx.company, date(2025, 2, 1), date(2025, 2, 28), "February 2025")
        .await
        .unwrap();
    let cash = account(&fx, "1010", AccountClassification::Asset, None, dec!(0)).await;
    let revenue = account(&fx, "4000", AccountClassification::Revenue, None, dec!(0)).await;

    post(
        &fx,
        date(2025, 1, 15),
        vec![LineInput::debit(cash, dec!(100)), LineInput::credit(revenue, dec!(100))],
    )
    .await;
    post(
        &fx,
        date(2025, 2, 15),
        vec![LineInput::debit(cash, dec!(50)), LineInput::credit(revenue, dec!(50))],
    )
    .await;

    let january = fx
        .reports
        .trial_balance(fx.company, date(2025, 1, 31), ReportOptions::default())
        .await;
    assert_eq!(january.totals.total_debit, dec!(100));

    let february = fx
        .reports
        .trial_balance(fx.company, date(2025, 2, 28), ReportOptions::default())
        .await;
    assert_eq!(february.totals.total_debit, dec!(150));
}

#[tokio::test]
async fn test_balance_sheet_identity() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let cash = account(&fx, "1010", AccountClassification::Asset, None, dec!(0)).await;
    let loan = account(&fx, "2100", AccountClassification::Liability, None, dec!(0)).await;
    let capital = account(&fx, "3000", AccountClassification::Equity, None, dec!(0)).await;

    // Owner funds the company, then it borrows.
    post(
        &fx,
        date(2025, 1, 5),
        vec![LineInput::debit(cash, dec!(5000)), LineInput::credit(capital, dec!(5000))],
    )
    .await;
    post(
        &fx,
        date(2025, 1, 10),
        vec![LineInput::debit(cash, dec!(2000)), LineInput::credit(loan, dec!(2000))],
    )
    .await;

    let report = fx
        .reports
        .balance_sheet(fx.company, date(2025, 1, 31), ReportOptions::default())
        .await;

    assert!(report.is_balanced);
    assert_eq!(report.total_assets, dec!(7000));
    assert_eq!(report.total_liabilities, dec!(2000));
    assert_eq!(report.total_equity, dec!(5000));
    assert_eq!(report.liabilities_and_equity, dec!(7000));
}

#[tokio::test]
async fn test_income_statement_net_income() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let cash = account(&fx, "1010", AccountClassification::Asset, None, dec!(0)).await;
    let revenue = account(&fx, "4000", AccountClassification::Revenue, None, dec!(0)).await;
    let gain = account(&fx, "4900", AccountClassification::Gain, None, dec!(0)).await;
    let expense = account(&fx, "6000", AccountClassification::Expense, None, dec!(0)).await;

    post(
        &fx,
        date(2025, 1, 10),
        vec![LineInput::debit(cash, dec!(3000)), LineInput::credit(revenue, dec!(3000))],
    )
    .await;
    post(
        &fx,
        date(2025, 1, 15),
        vec![LineInput::debit(cash, dec!(500)), LineInput::credit(gain, dec!(500))],
    )
    .await;
    post(
        &fx,
        date(2025, 1, 20),
        vec![LineInput::debit(expense, dec!(1200)), LineInput::credit(cash, dec!(1200))],
    )
    .await;

    let report = fx
        .reports
        .income_statement(fx.company, date(2025, 1, 1), date(2025, 1, 31), ReportOptions::default())
        .await;

    assert_eq!(report.revenue.total, dec!(3500));
    assert_eq!(report.expenses.total, dec!(1200));
    assert_eq!(report.net_income, dec!(2300));
    // Gain reports inside the revenue section.
    assert!(report.revenue.rows.iter().any(|r| r.code == "4900"));
}

#[tokio::test]
async fn test_cash_flow_sections_net_to_cash_change() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let cash = account(
        &fx,
        "1010",
        AccountClassification::Asset,
        Some(AccountSubtype::Bank),
        dec!(0),
    )
    .await;
    let revenue = account(
        &fx,
        "4000",
        AccountClassification::Revenue,
        Some(AccountSubtype::OperatingRevenue),
        dec!(0),
    )
    .await;
    let equipment = account(
        &fx,
        "1500",
        AccountClassification::Asset,
        Some(AccountSubtype::FixedAsset),
        dec!(0),
    )
    .await;
    let loan = account(
        &fx,
        "2500",
        AccountClassification::Liability,
        Some(AccountSubtype::LongTermDebt),
        dec!(0),
    )
    .await;

    // Operating inflow, investing outflow, financing inflow.
    post(
        &fx,
        date(2025, 1, 5),
        vec![LineInput::debit(cash, dec!(4000)), LineInput::credit(revenue, dec!(4000))],
    )
    .await;
    post(
        &fx,
        date(2025, 1, 10),
        vec![LineInput::debit(equipment, dec!(2500)), LineInput::credit(cash, dec!(2500))],
    )
    .await;
    post(
        &fx,
        date(2025, 1, 15),
        vec![LineInput::debit(cash, dec!(1000)), LineInput::credit(loan, dec!(1000))],
    )
    .await;

    let report = fx
        .reports
        .cash_flow(fx.company, date(2025, 1, 1), date(2025, 1, 31))
        .await;

    assert_eq!(report.operating.total, dec!(4000));
    assert_eq!(report.investing.total, dec!(-2500));
    assert_eq!(report.financing.total, dec!(1000));
    assert_eq!(report.net_change, dec!(2500));
    assert_eq!(report.opening_cash, dec!(0));
    assert_eq!(report.closing_cash, dec!(2500));
}

#[tokio::test]
async fn test_cash_flow_ignores_cash_transfers() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let cash = account(
        &fx,
        "1010",
        AccountClassification::Asset,
        Some(AccountSubtype::Cash),
        dec!(0),
    )
    .await;
    let bank = account(
        &fx,
        "1020",
        AccountClassification::Asset,
        Some(AccountSubtype::Bank),
        dec!(0),
    )
    .await;

    post(
        &fx,
        date(2025, 1, 10),
        vec![LineInput::debit(bank, dec!(700)), LineInput::credit(cash, dec!(700))],
    )
    .await;

    let report = fx
        .reports
        .cash_flow(fx.company, date(2025, 1, 1), date(2025, 1, 31))
        .await;

    // A transfer between cash positions moves nothing in or out.
    assert_eq!(report.net_change, dec!(0));
    assert!(report.operating.rows.is_empty());
    assert!(report.investing.rows.is_empty());
    assert!(report.financing.rows.is_empty());
}

#[tokio::test]
async fn test_reports_are_reproducible() {
    let fx = fixture();
    fx.periods
        .open_period(fx.company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let cash = account(&fx, "1010", AccountClassification::Asset, None, dec!(0)).await;
    let revenue = account(&fx, "4000", AccountClassification::Revenue, None, dec!(0)).await;
    post(
        &fx,
        date(2025, 1, 15),
        vec![LineInput::debit(cash, dec!(123.45)), LineInput::credit(revenue, dec!(123.45))],
    )
    .await;

    let first = fx
        .reports
        .trial_balance(fx.company, date(2025, 1, 31), ReportOptions::default())
        .await;
    let second = fx
        .reports
        .trial_balance(fx.company, date(2025, 1, 31), ReportOptions::default())
        .await;

    let a = serde_json::to_string(&first).unwrap();
    let b = serde_json::to_string(&second).unwrap();
    assert_eq!(a, b);
}
