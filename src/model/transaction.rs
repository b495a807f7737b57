//! Transactions
//!
//! Amounts are always a positive magnitude; the sign is implied by the
//! kind.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::dates;

/// Income or expense (also used for category types)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// Sign prefix used when displaying amounts
    pub fn sign(&self) -> &'static str {
        match self {
            TransactionKind::Income => "+",
            TransactionKind::Expense => "-",
        }
    }
}

impl Default for TransactionKind {
    fn default() -> Self {
        TransactionKind::Expense
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" | "expenses" => Ok(TransactionKind::Expense),
            other => Err(format!(
                "Invalid transaction type: {}. Use income or expense",
                other
            )),
        }
    }
}

/// A transaction row as stored by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Positive magnitude
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    /// When the transaction occurred
    #[serde(with = "dates::flexible_datetime")]
    pub date: DateTime<Utc>,
    #[serde(with = "dates::flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "dates::flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Amount with the sign implied by the kind
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Insert/update payload for a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDraft {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(with = "dates::flexible_datetime")]
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert!(matches!("Income".parse(), Ok(TransactionKind::Income)));
        assert!(matches!("expenses".parse(), Ok(TransactionKind::Expense)));
        assert!("transfer".parse::<TransactionKind>().is_err());
        assert_eq!(TransactionKind::default(), TransactionKind::Expense);
    }

    #[test]
    fn test_signed_amount() {
        let json = r#"{
            "id": "7d3c1a2b-9e10-4c47-9a54-6f1c1d5e3b1a",
            "user_id": "0b4a3e4c-2f55-4d3b-8c4e-3a1f1e2d5c6b",
            "account_id": "6f1c1d5e-3b1a-4c47-9a54-7d3c1a2b9e10",
            "category_id": "3a1f1e2d-5c6b-4d3b-8c4e-0b4a3e4c2f55",
            "type": "expense",
            "amount": 250.5,
            "description": null,
            "date": "2024-06-02T12:00:00Z",
            "created_at": "2024-06-02T12:00:01Z",
            "updated_at": "2024-06-02T12:00:01Z"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert!(tx.is_expense());
        assert_eq!(tx.signed_amount(), "-250.5".parse::<Decimal>().unwrap());
        assert!(tx.description.is_none());
    }
}
