//! Recurring scheduler and allocation flows through the assembled ledger.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::Ledger;
use tally_core::accounts::{AccountClassification, CreateAccountInput};
use tally_core::allocation::{
    AllocationDestination, AllocationMethod, CreateRuleInput as CreateAllocationRuleInput,
};
use tally_core::recurring::{CreateTemplateInput, EndRule, Frequency, TemplateLine};
use tally_shared::types::{AccountId, CompanyId, CurrencyCode, UserId};
use tally_shared::{FixedClock, LedgerConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn make_account(
    ledger: &Ledger,
    company: CompanyId,
    code: &str,
    classification: AccountClassification,
) -> AccountId {
    ledger
        .accounts()
        .create_account(CreateAccountInput {
            company_id: company,
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

/// A monthly template anchored on the 31st emits on Feb 28 (last-day
/// rollover) and advances to Mar 31 with two occurrences counted.
#[tokio::test]
async fn test_month_end_template_wake_late_february() {
    // Scheduler wakes at 2025-02-28 23:59.
    let wake = date(2025, 2, 28).and_hms_opt(23, 59, 0).unwrap().and_utc();
    let ledger = Ledger::with_clock(LedgerConfig::default(), Arc::new(FixedClock::new(wake)));
    let company = CompanyId::new();
    let user = UserId::new();

    ledger
        .periods()
        .open_period(company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    ledger
        .periods()
        .open_period(company, date(2025, 2, 1), date(2025, 2, 28), "February 2025")
        .await
        .unwrap();
    let expense = make_account(&ledger, company, "6300", AccountClassification::Expense).await;
    let cash = make_account(&ledger, company, "1010", AccountClassification::Asset).await;

    let template = ledger
        .recurring()
        .create_template(CreateTemplateInput {
            company_id: company,
            name: "Hosting".to_string(),
            frequency: Frequency::Monthly,
            interval: 1,
            start_date: date(2025, 1, 31),
            end_rule: EndRule::Never,
            lines: vec![
                TemplateLine {
                    account_id: expense,
                    description: Some("Hosting fee".to_string()),
                    debit: dec!(100),
                    credit: dec!(0),
                },
                TemplateLine {
                    account_id: cash,
                    description: None,
                    debit: dec!(0),
                    credit: dec!(100),
                },
            ],
            currency: None,
            created_by: user,
        })
        .await
        .unwrap();

    let outcome = ledger.recurring().run_once(template.id).await.unwrap();

    // January 31 and the clamped February 28 occurrence both posted.
    assert_eq!(outcome.posted.len(), 2);
    assert_eq!(outcome.posted[1].entry_date, date(2025, 2, 28));
    assert_eq!(outcome.template.next_run_date, date(2025, 3, 31));
    assert_eq!(outcome.template.occurrence_count, 2);

    // Generated entries went through the normal numbering path.
    assert!(outcome.posted[0].entry_number.starts_with("JE-202501-"));
    assert!(outcome.posted[1].entry_number.starts_with("JE-202502-"));
}

/// Running the scheduler twice at the same wake time produces exactly one
/// posted entry per due occurrence.
#[tokio::test]
async fn test_scheduler_idempotent_per_wake() {
    let ledger = Ledger::with_clock(
        LedgerConfig::default(),
        Arc::new(FixedClock::at_date(date(2025, 1, 31))),
    );
    let company = CompanyId::new();
    let user = UserId::new();

    ledger
        .periods()
        .open_period(company, date(2025, 1, 1), date(2025, 1, 31), "January 2025")
        .await
        .unwrap();
    let expense = make_account(&ledger, company, "6300", AccountClassification::Expense).await;
    let cash = make_account(&ledger, company, "1010", AccountClassification::Asset).await;

    ledger
        .recurring()
        .create_template(CreateTemplateInput {
            company_id: company,
            name: "Rent".to_string(),
            frequency: Frequency::Monthly,
            interval: 1,
            start_date: date(2025, 1, 31),
            end_rule: EndRule::Never,
            lines: vec![
                TemplateLine {
                    account_id: expense,
                    description: None,
                    debit: dec!(1500),
                    credit: dec!(0),
                },
                TemplateLine {
                    account_id: cash,
                    description: None,
                    debit: dec!(0),
                    credit: dec!(1500),
                },
            ],
            currency: None,
            created_by: user,
        })
        .await
        .unwrap();

    let first = ledger.recurring().run_due(company).await;
    let posted_first: usize = first
        .iter()
        .map(|(_, r)| r.as_ref().map(|o| o.posted.len()).unwrap_or(0))
        .sum();
    assert_eq!(posted_first, 1);

    let second = ledger.recurring().run_due(company).await;
    let posted_second: usize = second
        .iter()
        .map(|(_, r)| r.as_ref().map(|o| o.posted.len()).unwrap_or(0))
        .sum();
    assert_eq!(posted_second, 0);

    // Exactly one posted entry exists for the occurrence.
    let entries = ledger
        .journal()
        .search(
            company,
            tally_core::journal::EntryFilter {
                status: Some(tally_core::journal::EntryStatus::Posted),
                ..Default::default()
            },
            tally_shared::types::PageRequest::default(),
        )
        .await;
    assert_eq!(entries.meta.total, 1);
}

/// Allocation conservation: the "Dept Split" rule absorbs the rounding
/// residual on the last destination.
#[tokio::test]
async fn test_dept_split_allocation() {
    let ledger = Ledger::with_clock(
        LedgerConfig::default(),
        Arc::new(FixedClock::at_date(date(2025, 1, 1))),
    );
    let company = CompanyId::new();

    let dept_a = AccountId::new();
    let dept_b = AccountId::new();
    let rule = ledger
        .allocations()
        .create_rule(CreateAllocationRuleInput {
            company_id: company,
            name: "Dept Split".to_string(),
            method: AllocationMethod::Percentage,
            destinations: vec![
                AllocationDestination {
                    account_id: dept_a,
                    percentage: Some(dec!(60)),
                    fixed_amount: None,
                    sequence: 1,
                    is_active: true,
                },
                AllocationDestination {
                    account_id: dept_b,
                    percentage: Some(dec!(40)),
                    fixed_amount: None,
                    sequence: 2,
                    is_active: true,
                },
            ],
        })
        .await
        .unwrap();

    let slices = ledger.allocations().apply(rule.id, dec!(1000.005)).await.unwrap();
    assert_eq!(slices[0].account_id, dept_a);
    assert_eq!(slices[0].amount, dec!(600.00));
    assert_eq!(slices[1].account_id, dept_b);

    let total: Decimal = slices.iter().map(|s| s.amount).sum();
    assert_eq!(total, dec!(1000.005));
}
