//! Transaction list

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::analytics::format_money;
use crate::model::{Account, Category, Transaction, TransactionKind};

/// Type tab on the transaction list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTab {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeTab {
    pub fn admits(&self, kind: TransactionKind) -> bool {
        match self {
            TypeTab::All => true,
            TypeTab::Income => kind == TransactionKind::Income,
            TypeTab::Expense => kind == TransactionKind::Expense,
        }
    }
}

impl fmt::Display for TypeTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTab::All => write!(f, "all"),
            TypeTab::Income => write!(f, "income"),
            TypeTab::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for TypeTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(TypeTab::All),
            other => other.parse::<TransactionKind>().map(|kind| match kind {
                TransactionKind::Income => TypeTab::Income,
                TransactionKind::Expense => TypeTab::Expense,
            }),
        }
    }
}

/// Tab and search box state
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionFilter {
    #[serde(default, rename = "type")]
    pub tab: TypeTab,
    /// Case-insensitive substring of the description
    #[serde(default)]
    pub search: String,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.tab.admits(tx.kind)
            && tx
                .description
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }
}

/// A transaction joined with its category and account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: String,
    pub category_icon: String,
    pub account_name: String,
    /// e.g. `May 3`
    pub display_date: String,
    /// e.g. `+₱1,000.00`
    pub display_amount: String,
}

/// Lookup tables for joining transactions to names
pub struct RowContext<'a> {
    categories: HashMap<Uuid, &'a Category>,
    accounts: HashMap<Uuid, &'a Account>,
    currency: &'a str,
}

impl<'a> RowContext<'a> {
    pub fn new(categories: &'a [Category], accounts: &'a [Account], currency: &'a str) -> Self {
        Self {
            categories: categories.iter().map(|c| (c.id, c)).collect(),
            accounts: accounts.iter().map(|a| (a.id, a)).collect(),
            currency,
        }
    }

    pub fn row(&self, tx: &Transaction) -> TransactionRow {
        let category = self.categories.get(&tx.category_id);
        TransactionRow {
            category_name: category.map_or_else(String::new, |c| c.name.clone()),
            category_icon: category
                .map(|c| c.icon.clone())
                .filter(|icon| !icon.is_empty())
                .unwrap_or_else(|| "DollarSign".to_string()),
            account_name: self
                .accounts
                .get(&tx.account_id)
                .map_or_else(String::new, |a| a.name.clone()),
            display_date: tx.date.format("%b %-d").to_string(),
            display_amount: format!("{}{}", tx.kind.sign(), format_money(tx.amount, self.currency)),
            transaction: tx.clone(),
        }
    }
}

/// The transactions page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionsView {
    pub filter_type: TypeTab,
    pub search: String,
    pub rows: Vec<TransactionRow>,
    /// Over all transactions, regardless of the filter
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub loading: bool,
}

/// Filter, sort newest first by date, and join
pub fn build(
    transactions: &[Transaction],
    categories: &[Category],
    accounts: &[Account],
    filter: &TransactionFilter,
    currency: &str,
    loading: bool,
) -> TransactionsView {
    let context = RowContext::new(categories, accounts, currency);

    let mut selected: Vec<&Transaction> = transactions.iter().filter(|t| filter.matches(t)).collect();
    selected.sort_by(|a, b| b.date.cmp(&a.date));

    TransactionsView {
        filter_type: filter.tab,
        search: filter.search.clone(),
        rows: selected.into_iter().map(|t| context.row(t)).collect(),
        total_income: transactions
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum(),
        total_expenses: transactions
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum(),
        loading,
    }
}
