//! Add/edit account form

use serde::Deserialize;

use super::input::{lenient_string, parse_amount, sanitize_number_input};
use super::{non_blank, FormError, FormResult};
use crate::model::account::default_currency;
use crate::model::{dates, Account, AccountDraft, AccountType};
use crate::session::Session;

const CREDIT_FIELDS_REQUIRED: &str =
    "Credit cards require limit, statement date, and payment due date.";

/// Raw account input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub name: String,
    /// `cash`, `bank`, `wallet` or `credit`
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub balance: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub credit_limit: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub statement_date: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub payment_due_date: String,
    #[serde(skip)]
    pub(crate) editing: Option<Account>,
}

impl AccountForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled from an existing account
    pub fn edit(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            kind: account.kind.to_string(),
            balance: sanitize_number_input(&account.balance.to_string()),
            credit_limit: account
                .credit_limit
                .map(|l| sanitize_number_input(&l.to_string()))
                .unwrap_or_default(),
            statement_date: format_date(account.statement_date),
            payment_due_date: format_date(account.payment_due_date),
            editing: Some(account.clone()),
        }
    }

    /// Attach the account being edited to a form built from raw input
    pub fn editing_account(mut self, account: &Account) -> Self {
        self.editing = Some(account.clone());
        self
    }

    pub fn editing(&self) -> Option<&Account> {
        self.editing.as_ref()
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Change the account type; leaving credit clears the credit-only fields
    pub fn set_kind(&mut self, kind: AccountType) {
        self.kind = kind.to_string();
        if !kind.is_credit() {
            self.clear_credit_fields();
        }
    }

    fn clear_credit_fields(&mut self) {
        self.credit_limit.clear();
        self.statement_date.clear();
        self.payment_due_date.clear();
    }

    /// Check the input and build the payload to write
    pub fn validate(&self, session: Option<&Session>) -> FormResult<AccountDraft> {
        let name = non_blank(&self.name);
        let kind = non_blank(&self.kind);
        let balance = non_blank(&self.balance);

        let (Some(name), Some(kind), Some(balance), Some(session)) = (name, kind, balance, session)
        else {
            return Err(FormError::required_fields());
        };

        let kind: AccountType = kind.parse().map_err(FormError::InvalidSelection)?;

        let limit = non_blank(&self.credit_limit);
        let statement = non_blank(&self.statement_date);
        let due = non_blank(&self.payment_due_date);

        if kind.is_credit() && (limit.is_none() || statement.is_none() || due.is_none()) {
            return Err(FormError::MissingInformation(
                CREDIT_FIELDS_REQUIRED.to_string(),
            ));
        }

        let invalid_amount =
            || FormError::InvalidAmount("Please enter valid numbers for balance and limit.".to_string());
        let balance = parse_amount(balance).ok_or_else(invalid_amount)?;

        let (credit_limit, statement_date, payment_due_date) = if kind.is_credit() {
            let limit = limit.and_then(parse_amount).ok_or_else(invalid_amount)?;
            (
                Some(limit),
                statement.map(parse_form_date).transpose()?,
                due.map(parse_form_date).transpose()?,
            )
        } else {
            (None, None, None)
        };

        Ok(AccountDraft {
            user_id: session.user_id,
            name: name.to_string(),
            kind,
            balance,
            credit_limit,
            currency: default_currency(),
            icon: kind.icon().to_string(),
            is_active: self.editing.as_ref().map_or(true, |a| a.is_active),
            statement_date,
            payment_due_date,
        })
    }
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_form_date(raw: &str) -> FormResult<chrono::NaiveDate> {
    dates::parse_date(raw)
        .ok_or_else(|| FormError::InvalidDate("Please enter dates as YYYY-MM-DD.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn session() -> Session {
        Session::new(Uuid::new_v4())
    }

    fn form(name: &str, kind: &str, balance: &str) -> AccountForm {
        AccountForm {
            name: name.to_string(),
            kind: kind.to_string(),
            balance: balance.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_required_fields() {
        let session = session();
        for form in [
            form("", "bank", "100"),
            form("BPI", "", "100"),
            form("BPI", "bank", ""),
        ] {
            let err = form.validate(Some(&session)).unwrap_err();
            assert_eq!(err.title(), "Missing Information");
            assert_eq!(err.to_string(), "Please fill in all required fields");
        }

        let err = form("BPI", "bank", "100").validate(None).unwrap_err();
        assert_eq!(err, FormError::required_fields());
    }

    #[test]
    fn test_credit_requires_limit_and_dates() {
        let mut card = form("Visa", "credit", "2500");
        card.credit_limit = "50000".to_string();
        card.statement_date = "2024-06-05".to_string();

        let err = card.validate(Some(&session())).unwrap_err();
        assert_eq!(err.to_string(), CREDIT_FIELDS_REQUIRED);

        card.payment_due_date = "2024-06-25".to_string();
        let draft = card.validate(Some(&session())).unwrap();
        assert_eq!(draft.credit_limit, Some(Decimal::from(50000)));
        assert_eq!(draft.icon, "CreditCard");
        assert_eq!(draft.payment_due_date, NaiveDate::from_ymd_opt(2024, 6, 25));
    }

    #[test]
    fn test_invalid_amount() {
        let err = form("Cash", "cash", "abc").validate(Some(&session())).unwrap_err();
        assert_eq!(err.title(), "Invalid Amount");
    }

    #[test]
    fn test_non_credit_drops_credit_fields() {
        let mut bank = form("BDO", "bank", "1,000.50");
        bank.credit_limit = "9999".to_string();
        bank.statement_date = "2024-06-05".to_string();

        let draft = bank.validate(Some(&session())).unwrap();
        assert_eq!(draft.balance, Decimal::new(100050, 2));
        assert!(draft.credit_limit.is_none());
        assert!(draft.statement_date.is_none());
        assert_eq!(draft.currency, "PHP");
        assert_eq!(draft.icon, "Building2");
        assert!(draft.is_active);
    }

    #[test]
    fn test_set_kind_clears_credit_fields() {
        let mut card = form("Visa", "credit", "100");
        card.credit_limit = "1000".to_string();
        card.set_kind(AccountType::Wallet);
        assert!(card.credit_limit.is_empty());
        assert_eq!(card.kind, "wallet");
    }

    #[test]
    fn test_edit_preserves_is_active() {
        let session = session();
        let account = Account {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            name: "Old".to_string(),
            kind: AccountType::Cash,
            balance: Decimal::from(20),
            credit_limit: None,
            currency: "PHP".to_string(),
            icon: "Wallet".to_string(),
            is_active: false,
            statement_date: None,
            payment_due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut edit = AccountForm::edit(&account);
        assert_eq!(edit.balance, "20");
        edit.name = "Renamed".to_string();

        let draft = edit.validate(Some(&session)).unwrap();
        assert!(!draft.is_active);
        assert_eq!(draft.name, "Renamed");
    }

    #[test]
    fn test_deserialize_numeric_balance() {
        let form: AccountForm =
            serde_json::from_str(r#"{"name": "GCash", "type": "wallet", "balance": 350}"#).unwrap();
        assert_eq!(form.balance, "350");
        assert!(!form.is_edit());
    }
}
