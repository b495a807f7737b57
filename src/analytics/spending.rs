//! Spending by category

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::model::{Category, Transaction};

/// One pie slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: Decimal,
    /// Share of the total, 0 to 100
    pub percent: f64,
}

/// Expense breakdown by category name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingBreakdown {
    pub slices: Vec<CategorySlice>,
    pub total: Decimal,
}

impl SpendingBreakdown {
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Group expense amounts by category name, in first-seen order
///
/// Transactions whose category is missing are grouped under `"Unknown"`.
/// Categories sharing a name share a slice.
pub fn spending_by_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> SpendingBreakdown {
    let names: HashMap<Uuid, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut slices: Vec<CategorySlice> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tx in transactions.iter().filter(|t| t.is_expense()) {
        let name = names.get(&tx.category_id).copied().unwrap_or("Unknown");
        match index.get(name) {
            Some(&i) => slices[i].value += tx.amount,
            None => {
                index.insert(name, slices.len());
                slices.push(CategorySlice {
                    name: name.to_string(),
                    value: tx.amount,
                    percent: 0.0,
                });
            }
        }
    }

    let total: Decimal = slices.iter().map(|s| s.value).sum();
    if !total.is_zero() {
        for slice in &mut slices {
            slice.percent = (slice.value / total * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0);
        }
    }

    SpendingBreakdown { slices, total }
}
