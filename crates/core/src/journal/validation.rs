//! Structural validation for journal entries.
//!
//! Pure functions with no store access: account lookups are supplied as a
//! closure so the rules stay testable in isolation. Validation runs before
//! any mutation; state checks happen later inside the posting engine's
//! locked region.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tally_shared::types::{AccountId, CurrencyCode};

use super::error::JournalError;
use super::types::{JournalLine, LineInput};

/// Account facts needed for line validation.
#[derive(Debug, Clone)]
pub struct LineAccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Whether the account is active.
    pub is_active: bool,
}

/// Lines that passed structural validation, with their totals.
#[derive(Debug, Clone)]
pub struct ValidatedLines {
    /// Numbered lines ready for persistence.
    pub lines: Vec<JournalLine>,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

/// Validates and numbers an entry's lines.
///
/// Enforces, in order: at least two lines; per line a single positive
/// side, a positive exchange rate, an existing active account; no account
/// referenced twice; and debits equal to credits within `epsilon`.
pub fn validate_lines<A>(
    inputs: &[LineInput],
    base_currency: &CurrencyCode,
    epsilon: Decimal,
    account_lookup: A,
) -> Result<ValidatedLines, JournalError>
where
    A: Fn(AccountId) -> Result<LineAccountInfo, JournalError>,
{
    if inputs.len() < 2 {
        return Err(JournalError::InsufficientLines);
    }

    let mut seen_accounts: HashSet<AccountId> = HashSet::with_capacity(inputs.len());
    let mut lines = Vec::with_capacity(inputs.len());
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for (index, input) in inputs.iter().enumerate() {
        let line_number = index + 1;

        if input.debit < Decimal::ZERO || input.credit < Decimal::ZERO {
            return Err(JournalError::NegativeAmount { line: line_number });
        }
        let debit_set = input.debit > Decimal::ZERO;
        let credit_set = input.credit > Decimal::ZERO;
        if debit_set == credit_set {
            return Err(JournalError::InvalidLineAmounts { line: line_number });
        }

        let exchange_rate = input.exchange_rate.unwrap_or(Decimal::ONE);
        if exchange_rate <= Decimal::ZERO {
            return Err(JournalError::InvalidExchangeRate);
        }

        let account = account_lookup(input.account_id)?;
        if !account.is_active {
            return Err(JournalError::AccountInactive(input.account_id));
        }
        if !seen_accounts.insert(input.account_id) {
            return Err(JournalError::DuplicateAccount(input.account_id));
        }

        total_debit += input.debit;
        total_credit += input.credit;

        lines.push(JournalLine {
            line_number: u32::try_from(line_number).unwrap_or(u32::MAX),
            account_id: input.account_id,
            description: input.description.clone(),
            reference: input.reference.clone(),
            tracking_category_id: input.tracking_category_id,
            debit: input.debit,
            credit: input.credit,
            currency: input.currency.clone().unwrap_or_else(|| base_currency.clone()),
            exchange_rate,
        });
    }

    if (total_debit - total_credit).abs() > epsilon {
        return Err(JournalError::Unbalanced {
            debit: total_debit,
            credit: total_credit,
        });
    }

    Ok(ValidatedLines {
        lines,
        total_debit,
        total_credit,
    })
}
