//! Ledger aggregates
//!
//! Totals derived from a snapshot. They are recomputed from the transactions
//! every time they are asked for and never stored alongside them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amount::round_money;
use super::transaction::Transaction;

/// Balance, income and expense of a set of transactions.
///
/// `expense` is reported as a positive magnitude, so
/// `total == income - expense` holds exactly. Sums saturate at the bounds of
/// `Decimal` instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Aggregates {
    pub total: Decimal,
    pub income: Decimal,
    pub expense: Decimal,
}

impl Aggregates {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let (income, spent) = transactions.into_iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, spent), transaction| {
                let value = transaction.amount().value();
                if value.is_sign_positive() {
                    (income.saturating_add(value), spent)
                } else {
                    (income, spent.saturating_add(value))
                }
            },
        );

        Self {
            total: income.saturating_add(spent),
            income,
            expense: spent.abs(),
        }
    }

    /// Same aggregates rounded to two decimals for display
    pub fn rounded(&self) -> Self {
        Self {
            total: round_money(self.total),
            income: round_money(self.income),
            expense: round_money(self.expense),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.total < Decimal::ZERO
    }
}
