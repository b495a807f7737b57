//! Dashboard and accounts pages

use rust_decimal::Decimal;
use serde::Serialize;

use super::transactions::{RowContext, TransactionRow};
use crate::analytics::{
    format_money, monthly_totals, recent, spending_by_category, summary::DASHBOARD_RECENT, totals,
    MonthBucket, SpendingBreakdown, Totals,
};
use crate::model::{Account, AccountType, Category, Transaction};

/// The dashboard page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub totals: Totals,
    /// `total_balance` formatted for display
    pub balance_display: String,
    pub accounts: Vec<Account>,
    pub spending: SpendingBreakdown,
    pub monthly: Vec<MonthBucket>,
    pub recent: Vec<TransactionRow>,
    pub loading: bool,
}

pub fn build(
    accounts: &[Account],
    transactions: &[Transaction],
    categories: &[Category],
    currency: &str,
    loading: bool,
) -> DashboardView {
    let totals = totals(accounts, transactions);
    let context = RowContext::new(categories, accounts, currency);

    DashboardView {
        balance_display: format_money(totals.total_balance, currency),
        totals,
        accounts: accounts.to_vec(),
        spending: spending_by_category(transactions, categories),
        monthly: monthly_totals(transactions),
        recent: recent(transactions, DASHBOARD_RECENT)
            .iter()
            .map(|t| context.row(t))
            .collect(),
        loading,
    }
}

/// The accounts page, grouped the way it is laid out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountsView {
    /// Cash and bank accounts
    pub cash_and_bank: Vec<Account>,
    pub wallets: Vec<Account>,
    pub credit_cards: Vec<Account>,
    pub total_balance: Decimal,
    pub loading: bool,
}

pub fn accounts(accounts: &[Account], loading: bool) -> AccountsView {
    let of = |kinds: &[AccountType]| -> Vec<Account> {
        accounts
            .iter()
            .filter(|a| kinds.contains(&a.kind))
            .cloned()
            .collect()
    };

    AccountsView {
        cash_and_bank: of(&[AccountType::Cash, AccountType::Bank]),
        wallets: of(&[AccountType::Wallet]),
        credit_cards: of(&[AccountType::Credit]),
        total_balance: totals(accounts, &[]).total_balance,
        loading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionKind;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn account(kind: AccountType, balance: i64) -> Account {
        Account {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: kind.label().to_string(),
            kind,
            balance: Decimal::from(balance),
            credit_limit: None,
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
    fn test_dashboard_recent_limited_to_five() {
        let bank = account(AccountType::Bank, 12000);
        let now = Utc::now();
        let transactions: Vec<Transaction> = (0..8)
            .map(|i| Transaction {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                account_id: bank.id,
                category_id: Uuid::nil(),
                kind: TransactionKind::Expense,
                amount: Decimal::from(100),
                description: None,
                date: now - Duration::days(i),
                created_at: now,
                updated_at: now,
            })
            .collect();

        let view = build(&[bank], &transactions, &[], "PHP", false);
        assert_eq!(view.recent.len(), 5);
        assert_eq!(view.recent[0].account_name, "Bank Account");
        assert_eq!(view.balance_display, "₱12,000.00");
        assert_eq!(view.spending.total, Decimal::from(800));
    }

    #[test]
    fn test_accounts_grouping() {
        let view = accounts(
            &[
                account(AccountType::Cash, 100),
                account(AccountType::Bank, 200),
                account(AccountType::Wallet, 300),
                account(AccountType::Credit, 5000),
            ],
            false,
        );
        assert_eq!(view.cash_and_bank.len(), 2);
        assert_eq!(view.wallets.len(), 1);
        assert_eq!(view.credit_cards.len(), 1);
        assert_eq!(view.total_balance, Decimal::from(600));
    }
}
