//! Credit card pages

use rust_decimal::Decimal;
use serde::Serialize;

use crate::analytics::{card_portfolio, card_stats, format_long_date, CardPortfolio, CardStats};
use crate::model::{Account, Transaction};

/// The cards page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardsView {
    pub portfolio: CardPortfolio,
    /// Non-credit accounts a card can be paid from
    pub pay_from: Vec<Account>,
    pub loading: bool,
}

pub fn build(accounts: &[Account], transactions: &[Transaction], loading: bool) -> CardsView {
    CardsView {
        portfolio: card_portfolio(accounts, transactions),
        pay_from: accounts.iter().filter(|a| !a.is_credit()).cloned().collect(),
        loading,
    }
}

/// The card details dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDetails {
    pub stats: CardStats,
    /// `Month D, YYYY` or `Not provided`
    pub statement_date: String,
    pub payment_due_date: String,
    pub balance: Decimal,
    pub credit_limit: Option<Decimal>,
    pub available: Decimal,
}

/// Details for a credit card; `None` for a non-credit account
pub fn details(card: &Account, transactions: &[Transaction]) -> Option<CardDetails> {
    if !card.is_credit() {
        return None;
    }

    Some(CardDetails {
        stats: card_stats(card, transactions),
        statement_date: format_long_date(card.statement_date),
        payment_due_date: format_long_date(card.payment_due_date),
        balance: card.balance,
        credit_limit: card.credit_limit,
        available: card.available_credit(),
    })
}
