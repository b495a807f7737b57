//! Monthly income and expenses

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Transaction, TransactionKind};

/// Totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    /// 1 to 12
    pub month: u32,
    /// Short label such as `Jan`; the year is appended when buckets span years
    pub label: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

impl MonthBucket {
    pub fn has_data(&self) -> bool {
        self.income > Decimal::ZERO || self.expenses > Decimal::ZERO
    }
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Bucket transactions by the calendar year and month of their date,
/// oldest month first
pub fn monthly_totals(transactions: &[Transaction]) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<(i32, u32), (Decimal, Decimal)> = BTreeMap::new();

    for tx in transactions {
        let key = (tx.date.year(), tx.date.month());
        let (income, expenses) = buckets.entry(key).or_default();
        match tx.kind {
            TransactionKind::Income => *income += tx.amount,
            TransactionKind::Expense => *expenses += tx.amount,
        }
    }

    let spans_years = buckets
        .keys()
        .next()
        .zip(buckets.keys().next_back())
        .map_or(false, |(first, last)| first.0 != last.0);

    buckets
        .into_iter()
        .map(|((year, month), (income, expenses))| {
            let short = MONTHS[(month - 1) as usize];
            MonthBucket {
                year,
                month,
                label: if spans_years {
                    format!("{} {}", short, year)
                } else {
                    short.to_string()
                },
                income,
                expenses,
            }
        })
        .collect()
}
