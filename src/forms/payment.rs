//! Pay credit card form
//!
//! Collects a source account and an amount for paying down a card.
//! Submitting yields a [`PaymentIntent`]; no balances are moved.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::input::{parse_amount, sanitize_number_input};
use super::{FormError, FormResult};
use crate::model::Account;

/// A validated request to pay a card from an account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntent {
    pub card_id: Uuid,
    pub from_account_id: Uuid,
    pub amount: Decimal,
}

/// Pay Now dialog state
#[derive(Debug, Clone)]
pub struct PayNowForm {
    card: Account,
    sources: Vec<Account>,
    selected: Option<Uuid>,
    amount: String,
}

impl PayNowForm {
    /// Open the form for `card`, paying from any of the non-credit `accounts`
    pub fn new(card: &Account, accounts: &[Account]) -> Self {
        Self {
            card: card.clone(),
            sources: accounts.iter().filter(|a| !a.is_credit()).cloned().collect(),
            selected: None,
            amount: full_balance(card),
        }
    }

    pub fn card(&self) -> &Account {
        &self.card
    }

    /// Accounts that can be paid from
    pub fn sources(&self) -> &[Account] {
        &self.sources
    }

    pub fn select(&mut self, account_id: Uuid) {
        self.selected = Some(account_id);
    }

    pub fn selected(&self) -> Option<&Account> {
        self.selected
            .and_then(|id| self.sources.iter().find(|a| a.id == id))
    }

    pub fn set_amount(&mut self, raw: &str) {
        self.amount = sanitize_number_input(raw);
    }

    pub fn amount_input(&self) -> &str {
        &self.amount
    }

    /// Preset: the whole card balance
    pub fn pay_full(&mut self) {
        self.amount = full_balance(&self.card);
    }

    /// Preset: half the card balance
    pub fn pay_half(&mut self) {
        let half = (self.card.balance * Decimal::new(5, 1)).round_dp(2);
        self.amount = sanitize_number_input(&format!("{:.2}", half));
    }

    /// Amount as a number, zero when unparseable
    pub fn numeric_amount(&self) -> Decimal {
        parse_amount(&self.amount).unwrap_or(Decimal::ZERO)
    }

    /// An account is chosen, the amount is positive and covered by the
    /// account's balance
    pub fn can_pay(&self) -> bool {
        let amount = self.numeric_amount();
        amount > Decimal::ZERO && self.selected().is_some_and(|a| amount <= a.balance)
    }

    pub fn submit(&self) -> FormResult<PaymentIntent> {
        let chosen = self.selected.ok_or_else(|| {
            FormError::MissingInformation("Please select an account to pay from".to_string())
        })?;
        let source = self.selected().ok_or_else(|| {
            FormError::InvalidSelection(format!("Account {} cannot be paid from", chosen))
        })?;

        if !self.can_pay() {
            return Err(FormError::InvalidAmount(
                "Amount must be greater than zero and within the account balance.".to_string(),
            ));
        }

        Ok(PaymentIntent {
            card_id: self.card.id,
            from_account_id: source.id,
            amount: self.numeric_amount(),
        })
    }
}

fn full_balance(card: &Account) -> String {
    sanitize_number_input(&format!("{:.2}", card.balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountType;
    use chrono::Utc;

    fn account(name: &str, kind: AccountType, balance: i64) -> Account {
        Account {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            kind,
            balance: Decimal::from(balance),
            credit_limit: kind.is_credit().then(|| Decimal::from(20000)),
            currency: "PHP".to_string(),
            icon: kind.icon().to_string(),
            is_active: true,
            statement_date: None,
            payment_due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_defaults_and_presets() {
        let card = account("Visa", AccountType::Credit, 3001);
        let mut form = PayNowForm::new(&card, &[]);
        assert_eq!(form.amount_input(), "3001.00");

        form.pay_half();
        assert_eq!(form.numeric_amount(), Decimal::new(150050, 2));

        form.pay_full();
        assert_eq!(form.numeric_amount(), Decimal::from(3001));
    }

    #[test]
    fn test_sources_exclude_credit_accounts() {
        let card = account("Visa", AccountType::Credit, 100);
        let other_card = account("MC", AccountType::Credit, 100);
        let bank = account("BPI", AccountType::Bank, 500);
        let form = PayNowForm::new(&card, &[other_card, bank.clone()]);

        assert_eq!(form.sources().len(), 1);
        assert_eq!(form.sources()[0].id, bank.id);
    }

    #[test]
    fn test_can_pay() {
        let card = account("Visa", AccountType::Credit, 1000);
        let bank = account("BPI", AccountType::Bank, 500);
        let mut form = PayNowForm::new(&card, &[bank.clone()]);

        assert!(!form.can_pay());

        form.select(bank.id);
        assert!(!form.can_pay(), "1000 exceeds the 500 balance");

        form.set_amount("450");
        assert!(form.can_pay());

        form.set_amount("0");
        assert!(!form.can_pay());
    }

    #[test]
    fn test_submit() {
        let card = account("Visa", AccountType::Credit, 1000);
        let bank = account("BPI", AccountType::Bank, 5000);
        let mut form = PayNowForm::new(&card, &[bank.clone()]);

        assert_eq!(form.submit().unwrap_err().title(), "Missing Information");

        form.select(bank.id);
        let intent = form.submit().unwrap();
        assert_eq!(intent.card_id, card.id);
        assert_eq!(intent.amount, Decimal::from(1000));
    }

    #[test]
    fn test_rejects_source_outside_non_credit_accounts() {
        let card = account("Visa", AccountType::Credit, 1000);
        let other_card = account("MC", AccountType::Credit, 50000);
        let bank = account("BPI", AccountType::Bank, 10);
        let mut form = PayNowForm::new(&card, &[card.clone(), other_card.clone(), bank]);

        for id in [card.id, other_card.id, Uuid::new_v4()] {
            form.select(id);
            assert!(!form.can_pay());
            assert_eq!(form.submit().unwrap_err().title(), "Invalid Selection");
        }
    }
}
