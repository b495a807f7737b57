//! Accounts
//!
//! A named balance-holding entity. For credit cards the balance is the
//! outstanding debt, not the available credit.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::dates;

/// Kind of account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Physical cash
    Cash,
    /// Bank account
    Bank,
    /// Digital wallet
    Wallet,
    /// Credit card (balance is debt)
    Credit,
}

impl AccountType {
    /// Get all account types for iteration
    pub fn all() -> &'static [AccountType] {
        &[
            AccountType::Bank,
            AccountType::Cash,
            AccountType::Wallet,
            AccountType::Credit,
        ]
    }

    /// Icon tag stored alongside the account
    pub fn icon(&self) -> &'static str {
        match self {
            AccountType::Bank => "Building2",
            AccountType::Cash => "Wallet",
            AccountType::Wallet => "Smartphone",
            AccountType::Credit => "CreditCard",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Bank => "Bank Account",
            AccountType::Cash => "Cash",
            AccountType::Wallet => "Digital Wallet",
            AccountType::Credit => "Credit Card",
        }
    }

    pub fn is_credit(&self) -> bool {
        matches!(self, AccountType::Credit)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Cash => write!(f, "cash"),
            AccountType::Bank => write!(f, "bank"),
            AccountType::Wallet => write!(f, "wallet"),
            AccountType::Credit => write!(f, "credit"),
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(AccountType::Cash),
            "bank" => Ok(AccountType::Bank),
            "wallet" => Ok(AccountType::Wallet),
            "credit" => Ok(AccountType::Credit),
            other => Err(format!(
                "Invalid account type: {}. Use cash, bank, wallet, or credit",
                other
            )),
        }
    }
}

/// An account row as stored by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    /// Signed balance; debt for credit cards
    pub balance: Decimal,
    #[serde(default)]
    pub credit_limit: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, with = "dates::optional_date")]
    pub statement_date: Option<NaiveDate>,
    #[serde(default, with = "dates::optional_date")]
    pub payment_due_date: Option<NaiveDate>,
    #[serde(with = "dates::flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "dates::flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn default_currency() -> String {
    "PHP".to_string()
}

fn default_active() -> bool {
    true
}

impl Account {
    pub fn is_credit(&self) -> bool {
        self.kind.is_credit()
    }

    /// Share of the credit limit in use, as a percentage (0 without a limit)
    pub fn credit_usage_percent(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;

        match self.credit_limit {
            Some(limit) if self.is_credit() && !limit.is_zero() => {
                (self.balance / limit * Decimal::ONE_HUNDRED)
                    .to_f64()
                    .unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    /// Remaining credit (`limit - balance`); a missing limit counts as zero
    pub fn available_credit(&self) -> Decimal {
        self.credit_limit.unwrap_or(Decimal::ZERO) - self.balance
    }
}

/// Insert/update payload for an account
///
/// Produced by a validated account form; never built from raw input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountDraft {
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub currency: String,
    pub icon: String,
    pub is_active: bool,
    #[serde(with = "dates::optional_date")]
    pub statement_date: Option<NaiveDate>,
    #[serde(with = "dates::optional_date")]
    pub payment_due_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(balance: i64, limit: Option<i64>) -> Account {
        Account {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Visa".to_string(),
            kind: AccountType::Credit,
            balance: Decimal::from(balance),
            credit_limit: limit.map(Decimal::from),
            currency: "PHP".to_string(),
            icon: "CreditCard".to_string(),
            is_active: true,
            statement_date: None,
            payment_due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_icon_for_type() {
        assert_eq!(AccountType::Bank.icon(), "Building2");
        assert_eq!(AccountType::Cash.icon(), "Wallet");
        assert_eq!(AccountType::Wallet.icon(), "Smartphone");
        assert_eq!(AccountType::Credit.icon(), "CreditCard");
    }

    #[test]
    fn test_parse_account_type() {
        assert!(matches!("BANK".parse(), Ok(AccountType::Bank)));
        assert!("savings".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_credit_usage() {
        assert_eq!(card(4000, Some(10000)).credit_usage_percent(), 40.0);
        assert_eq!(card(4000, None).credit_usage_percent(), 0.0);
        assert_eq!(card(4000, Some(0)).credit_usage_percent(), 0.0);
        assert_eq!(card(4000, Some(10000)).available_credit(), Decimal::from(6000));
    }

    #[test]
    fn test_deserialize_backend_row() {
        let json = r#"{
            "id": "6f1c1d5e-3b1a-4c47-9a54-7d3c1a2b9e10",
            "user_id": "0b4a3e4c-2f55-4d3b-8c4e-3a1f1e2d5c6b",
            "name": "BPI Savings",
            "type": "bank",
            "balance": 15250.75,
            "credit_limit": null,
            "currency": "PHP",
            "icon": "Building2",
            "is_active": true,
            "statement_date": null,
            "payment_due_date": "2024-05-20T00:00:00+00:00",
            "created_at": "2024-05-01T08:00:00+00:00",
            "updated_at": "2024-05-01T08:00:00.000000+00:00"
        }"#;

        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.kind, AccountType::Bank);
        assert_eq!(account.balance, "15250.75".parse::<Decimal>().unwrap());
        assert_eq!(
            account.payment_due_date,
            NaiveDate::from_ymd_opt(2024, 5, 20)
        );
    }

    #[test]
    fn test_draft_serializes_type_field() {
        let draft = AccountDraft {
            user_id: Uuid::nil(),
            name: "Cash".to_string(),
            kind: AccountType::Cash,
            balance: Decimal::from(500),
            credit_limit: None,
            currency: "PHP".to_string(),
            icon: "Wallet".to_string(),
            is_active: true,
            statement_date: None,
            payment_due_date: None,
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["type"], "cash");
        assert!(json["statement_date"].is_null());
    }
}
