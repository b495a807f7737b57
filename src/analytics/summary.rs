//! Dashboard totals, credit card statistics and profile statistics

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Account, Profile, Transaction};

/// Usage above this share of the limit flags a card as near its limit
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// Number of recent transactions shown on the dashboard
pub const DASHBOARD_RECENT: usize = 5;

/// Number of recent transactions shown per card
pub const CARD_RECENT: usize = 3;

/// Headline figures for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    /// Sum of non-credit account balances
    pub total_balance: Decimal,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
}

pub fn totals(accounts: &[Account], transactions: &[Transaction]) -> Totals {
    Totals {
        total_balance: accounts
            .iter()
            .filter(|a| !a.is_credit())
            .map(|a| a.balance)
            .sum(),
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
    }
}

/// The first `n` transactions of an already newest-first list
pub fn recent(transactions: &[Transaction], n: usize) -> Vec<Transaction> {
    transactions.iter().take(n).cloned().collect()
}

/// Statistics for one credit card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardStats {
    pub card: Account,
    /// `•••• ` followed by the first four characters of the id
    pub masked_number: String,
    pub usage_percent: f64,
    pub near_limit: bool,
    /// `limit - balance`
    pub remaining: Decimal,
    /// Sum of expenses charged to the card
    pub spent: Decimal,
    pub recent: Vec<Transaction>,
}

/// Statistics across all credit cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardPortfolio {
    pub cards: Vec<CardStats>,
    pub total_debt: Decimal,
    pub total_limit: Decimal,
    pub total_available: Decimal,
    pub near_limit_count: usize,
}

pub fn card_stats(card: &Account, transactions: &[Transaction]) -> CardStats {
    let on_card: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.account_id == card.id)
        .collect();

    let mut recent: Vec<Transaction> = on_card.iter().map(|t| (*t).clone()).collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(CARD_RECENT);

    let usage_percent = card.credit_usage_percent();

    CardStats {
        masked_number: mask_id(card.id),
        usage_percent,
        near_limit: usage_percent > NEAR_LIMIT_PERCENT,
        remaining: card.available_credit(),
        spent: on_card
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum(),
        recent,
        card: card.clone(),
    }
}

/// Per-card and aggregate statistics for every credit account
pub fn card_portfolio(accounts: &[Account], transactions: &[Transaction]) -> CardPortfolio {
    let cards: Vec<CardStats> = accounts
        .iter()
        .filter(|a| a.is_credit())
        .map(|card| card_stats(card, transactions))
        .collect();

    CardPortfolio {
        total_debt: cards.iter().map(|c| c.card.balance).sum(),
        total_limit: cards
            .iter()
            .map(|c| c.card.credit_limit.unwrap_or(Decimal::ZERO))
            .sum(),
        total_available: cards.iter().map(|c| c.remaining).sum(),
        near_limit_count: cards.iter().filter(|c| c.near_limit).count(),
        cards,
    }
}

fn mask_id(id: Uuid) -> String {
    let id = id.to_string();
    format!("•••• {}", &id[..4])
}

/// Summary shown on the profile page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStats {
    pub initials: String,
    pub full_name: String,
    pub email: Option<String>,
    pub account_count: usize,
    pub transaction_count: usize,
}

pub fn profile_stats(
    profile: Option<&Profile>,
    accounts: &[Account],
    transactions: &[Transaction],
) -> ProfileStats {
    ProfileStats {
        initials: profile.map_or_else(|| "U".to_string(), Profile::initials),
        full_name: profile.map_or_else(|| "User".to_string(), Profile::full_name),
        email: profile.map(|p| p.email.clone()),
        account_count: accounts.len(),
        transaction_count: transactions.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountType, TransactionKind};
    use chrono::{Duration, TimeZone, Utc};

    fn account(kind: AccountType, balance: i64, limit: Option<i64>) -> Account {
        Account {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: kind.label().to_string(),
            kind,
            balance: Decimal::from(balance),
            credit_limit: limit.map(Decimal::from),
            currency: "PHP".to_string(),
            icon: kind.icon().to_string(),
            is_active: true,
            statement_date: None,
            payment_due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tx(account_id: Uuid, kind: TransactionKind, amount: i64, day: u32) -> Transaction {
        let date = Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap();
        Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            account_id,
            category_id: Uuid::nil(),
            kind,
            amount: Decimal::from(amount),
            description: None,
            date,
            created_at: date,
            updated_at: date + Duration::seconds(1),
        }
    }

    #[test]
    fn test_totals_exclude_credit_balances() {
        let bank = account(AccountType::Bank, 1000, None);
        let card = account(AccountType::Credit, 700, Some(1000));
        let transactions = vec![
            tx(bank.id, TransactionKind::Income, 300, 1),
            tx(bank.id, TransactionKind::Expense, 120, 2),
            tx(card.id, TransactionKind::Expense, 80, 3),
        ];

        let t = totals(&[bank, card], &transactions);
        assert_eq!(t.total_balance, Decimal::from(1000));
        assert_eq!(t.total_income, Decimal::from(300));
        assert_eq!(t.total_expenses, Decimal::from(200));
    }

    #[test]
    fn test_card_stats() {
        let card = account(AccountType::Credit, 8500, Some(10000));
        let transactions: Vec<Transaction> = (1..=5)
            .map(|d| tx(card.id, TransactionKind::Expense, 100, d))
            .chain(std::iter::once(tx(card.id, TransactionKind::Income, 50, 6)))
            .collect();

        let stats = card_stats(&card, &transactions);
        assert_eq!(stats.usage_percent, 85.0);
        assert!(stats.near_limit);
        assert_eq!(stats.remaining, Decimal::from(1500));
        assert_eq!(stats.spent, Decimal::from(500));
        assert_eq!(stats.recent.len(), 3);
        assert!(stats.recent[0].is_income());
        assert!(stats.masked_number.starts_with("•••• "));
    }

    #[test]
    fn test_portfolio() {
        let near = account(AccountType::Credit, 900, Some(1000));
        let fine = account(AccountType::Credit, 100, Some(1000));
        let no_limit = account(AccountType::Credit, 50, None);
        let cash = account(AccountType::Cash, 5000, None);

        let portfolio = card_portfolio(&[near, fine, no_limit, cash], &[]);
        assert_eq!(portfolio.cards.len(), 3);
        assert_eq!(portfolio.total_debt, Decimal::from(1050));
        assert_eq!(portfolio.total_limit, Decimal::from(2000));
        assert_eq!(portfolio.total_available, Decimal::from(950));
        assert_eq!(portfolio.near_limit_count, 1);
    }

    #[test]
    fn test_profile_stats_without_profile() {
        let stats = profile_stats(None, &[], &[]);
        assert_eq!(stats.initials, "U");
        assert_eq!(stats.full_name, "User");
        assert_eq!(stats.account_count, 0);
    }
}
