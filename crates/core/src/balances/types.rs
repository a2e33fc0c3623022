//! Ledger balance types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, PeriodId};

use crate::accounts::types::NormalSide;

/// Per-account, per-period balance snapshot.
///
/// Derived state maintained exclusively by the posting engine; fully
/// reconstructible from posted lines plus opening balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerBalance {
    /// The account.
    pub account_id: AccountId,
    /// The period.
    pub period_id: PeriodId,
    /// Balance carried in from the previous period (or the account's stated
    /// opening balance when no prior period exists).
    pub opening_balance: Decimal,
    /// Total debits posted in the period.
    pub period_debit: Decimal,
    /// Total credits posted in the period.
    pub period_credit: Decimal,
    /// Balance carried out: opening plus the signed net of the period.
    pub closing_balance: Decimal,
}

impl LedgerBalance {
    /// Creates a fresh row seeded with the given opening balance.
    #[must_use]
    pub fn opening(account_id: AccountId, period_id: PeriodId, opening_balance: Decimal) -> Self {
        Self {
            account_id,
            period_id,
            opening_balance,
            period_debit: Decimal::ZERO,
            period_credit: Decimal::ZERO,
            closing_balance: opening_balance,
        }
    }

    /// Applies a (debit, credit) pair and recomputes the closing balance.
    pub fn apply(&mut self, debit: Decimal, credit: Decimal, side: NormalSide) {
        self.period_debit += debit;
        self.period_credit += credit;
        self.recompute(side);
    }

    /// Recomputes `closing_balance` from the stored components.
    pub fn recompute(&mut self, side: NormalSide) {
        self.closing_balance =
            self.opening_balance + side.signed_delta(self.period_debit, self.period_credit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_opening_row_closes_at_opening() {
        let row = LedgerBalance::opening(AccountId::new(), PeriodId::new(), dec!(250));
        assert_eq!(row.closing_balance, dec!(250));
        assert_eq!(row.period_debit, Decimal::ZERO);
        assert_eq!(row.period_credit, Decimal::ZERO);
    }

    #[test]
    fn test_apply_debit_normal() {
        let mut row = LedgerBalance::opening(AccountId::new(), PeriodId::new(), dec!(100));
        row.apply(dec!(1000), dec!(0), NormalSide::Debit);
        assert_eq!(row.closing_balance, dec!(1100));
        row.apply(dec!(0), dec!(300), NormalSide::Debit);
        assert_eq!(row.closing_balance, dec!(800));
    }

    #[test]
    fn test_apply_credit_normal() {
        let mut row = LedgerBalance::opening(AccountId::new(), PeriodId::new(), dec!(0));
        row.apply(dec!(0), dec!(1000), NormalSide::Credit);
        assert_eq!(row.closing_balance, dec!(1000));
        row.apply(dec!(400), dec!(0), NormalSide::Credit);
        assert_eq!(row.closing_balance, dec!(600));
    }

    #[test]
    fn test_apply_accumulates_totals() {
        let mut row = LedgerBalance::opening(AccountId::new(), PeriodId::new(), dec!(0));
        row.apply(dec!(100), dec!(0), NormalSide::Debit);
        row.apply(dec!(50), dec!(20), NormalSide::Debit);
        assert_eq!(row.period_debit, dec!(150));
        assert_eq!(row.period_credit, dec!(20));
        assert_eq!(row.closing_balance, dec!(130));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn cents() -> impl Strategy<Value = Decimal> {
            (0i64..10_000_000).prop_map(|c| Decimal::new(c, 2))
        }

        fn side() -> impl Strategy<Value = NormalSide> {
            prop_oneof![Just(NormalSide::Debit), Just(NormalSide::Credit)]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Every row satisfies closing = opening + signed net,
            /// regardless of how the activity was split into applications.
            #[test]
            fn prop_closing_is_opening_plus_signed_net(
                opening in cents(),
                activity in proptest::collection::vec((cents(), cents()), 0..8),
                side in side(),
            ) {
                let mut row = LedgerBalance::opening(AccountId::new(), PeriodId::new(), opening);
                for (debit, credit) in &activity {
                    row.apply(*debit, *credit, side);
                }
                prop_assert_eq!(
                    row.closing_balance,
                    row.opening_balance + side.signed_delta(row.period_debit, row.period_credit)
                );
            }

            /// Chaining rows so each opening is the previous closing keeps
            /// the whole chain continuous: the final closing equals the
            /// first opening plus the signed net of all activity.
            #[test]
            fn prop_chained_rows_stay_continuous(
                opening in cents(),
                periods in proptest::collection::vec((cents(), cents()), 1..6),
                side in side(),
            ) {
                let account_id = AccountId::new();
                let mut carry = opening;
                let mut net = Decimal::ZERO;
                for (debit, credit) in &periods {
                    let mut row = LedgerBalance::opening(account_id, PeriodId::new(), carry);
                    row.apply(*debit, *credit, side);
                    prop_assert_eq!(row.opening_balance, carry);
                    carry = row.closing_balance;
                    net += side.signed_delta(*debit, *credit);
                }
                prop_assert_eq!(carry, opening + net);
            }
        }
    }
}
