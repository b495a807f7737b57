//! Views
//!
//! Page models assembled from live snapshots. A [`Workspace`] mounts the
//! live collections for one session and exposes each page plus the
//! write operations, refreshing the affected collection after every
//! successful write.

pub mod cards;
pub mod dashboard;
pub mod profile;
pub mod transactions;

pub use cards::{CardDetails, CardsView};
pub use dashboard::{AccountsView, DashboardView};
pub use profile::ProfileView;
pub use transactions::{TransactionFilter, TransactionRow, TransactionsView, TypeTab};

use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::actions::{ActionResult, Actions, PendingWrite, Submitted};
use crate::backend::Backend;
use crate::forms::{AccountForm, PayNowForm, PaymentIntent, ProfileForm, TransactionForm};
use crate::live::{LiveCollection, LiveProfile};
use crate::model::{Account, Category, Profile, Table, Transaction, TransactionKind};
use crate::notify::Notifier;
use crate::session::Session;

/// Live state and actions for one session
pub struct Workspace {
    accounts: LiveCollection<Account>,
    transactions: LiveCollection<Transaction>,
    categories: LiveCollection<Category>,
    profile: LiveProfile,
    actions: Actions,
    currency: String,
}

impl Workspace {
    /// Mount every live collection for `session`
    pub async fn mount(
        backend: Arc<dyn Backend>,
        session: Option<Session>,
        notifier: Arc<dyn Notifier>,
        currency: impl Into<String>,
    ) -> Self {
        let accounts = LiveCollection::accounts(Arc::clone(&backend), session.as_ref()).await;
        let transactions =
            LiveCollection::transactions(Arc::clone(&backend), session.as_ref()).await;
        let categories =
            LiveCollection::categories(Arc::clone(&backend), session.as_ref(), None).await;
        let profile = LiveProfile::mount(Arc::clone(&backend), session.as_ref()).await;

        tracing::info!(
            backend = %backend.name(),
            user_id = ?session.as_ref().map(|s| s.user_id),
            "Workspace mounted"
        );

        Self {
            accounts,
            transactions,
            categories,
            profile,
            actions: Actions::new(backend, session, notifier),
            currency: currency.into(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.actions.session()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn accounts(&self) -> &LiveCollection<Account> {
        &self.accounts
    }

    pub fn transactions(&self) -> &LiveCollection<Transaction> {
        &self.transactions
    }

    pub fn categories(&self) -> &LiveCollection<Category> {
        &self.categories
    }

    pub fn profile(&self) -> &LiveProfile {
        &self.profile
    }

    /// Re-fetch the collection backing `table`
    pub async fn refresh(&self, table: Table) {
        match table {
            Table::Accounts => self.accounts.refetch().await,
            Table::Transactions => self.transactions.refetch().await,
            Table::Categories => self.categories.refetch().await,
            Table::Profiles => self.profile.refetch().await,
        }
    }

    async fn loading(&self) -> bool {
        self.accounts.snapshot().await.loading
            || self.transactions.snapshot().await.loading
            || self.categories.snapshot().await.loading
    }

    pub async fn dashboard(&self) -> DashboardView {
        dashboard::build(
            &self.accounts.items().await,
            &self.transactions.items().await,
            &self.categories.items().await,
            &self.currency,
            self.loading().await,
        )
    }

    pub async fn accounts_view(&self) -> AccountsView {
        let snapshot = self.accounts.snapshot().await;
        dashboard::accounts(&snapshot.items, snapshot.loading)
    }

    pub async fn transactions_view(&self, filter: &TransactionFilter) -> TransactionsView {
        transactions::build(
            &self.transactions.items().await,
            &self.categories.items().await,
            &self.accounts.items().await,
            filter,
            &self.currency,
            self.loading().await,
        )
    }

    /// Categories, optionally of one type
    pub async fn categories_of(&self, kind: Option<TransactionKind>) -> Vec<Category> {
        self.categories
            .items()
            .await
            .into_iter()
            .filter(|c| kind.map_or(true, |k| c.kind == k))
            .collect()
    }

    pub async fn cards_view(&self) -> CardsView {
        cards::build(
            &self.accounts.items().await,
            &self.transactions.items().await,
            self.loading().await,
        )
    }

    pub async fn card_details(&self, id: Uuid) -> Option<CardDetails> {
        let card = self.find_account(id).await?;
        cards::details(&card, &self.transactions.items().await)
    }

    pub async fn profile_view(&self) -> ProfileView {
        let snapshot = self.profile.snapshot().await;
        profile::build(
            snapshot.items.into_iter().next(),
            &self.accounts.items().await,
            &self.transactions.items().await,
            snapshot.loading,
        )
    }

    pub async fn find_account(&self, id: Uuid) -> Option<Account> {
        self.accounts
            .items()
            .await
            .into_iter()
            .find(|a| a.id == id)
    }

    pub async fn find_transaction(&self, id: Uuid) -> Option<Transaction> {
        self.transactions
            .items()
            .await
            .into_iter()
            .find(|t| t.id == id)
    }

    /// Create immediately, or return the pending edit
    pub async fn save_account(&self, form: &AccountForm) -> ActionResult<Submitted<Account>> {
        let submitted = self.actions.save_account(form).await?;
        if matches!(submitted, Submitted::Done(_)) {
            self.accounts.refetch().await;
        }
        Ok(submitted)
    }

    pub fn delete_account(&self, account: &Account) -> PendingWrite {
        self.actions.delete_account(account)
    }

    /// Create immediately, or return the pending edit
    pub async fn save_transaction(
        &self,
        form: &TransactionForm,
    ) -> ActionResult<Submitted<Transaction>> {
        let submitted = self.actions.save_transaction(form).await?;
        if matches!(submitted, Submitted::Done(_)) {
            self.transactions.refetch().await;
        }
        Ok(submitted)
    }

    pub fn delete_transaction(&self, transaction: &Transaction) -> PendingWrite {
        self.actions.delete_transaction(transaction)
    }

    /// Confirm a pending write and refresh its collection
    pub async fn confirm(&self, pending: PendingWrite) -> ActionResult<Option<Value>> {
        let table = pending.table();
        let row = pending.confirm().await?;
        self.refresh(table).await;
        Ok(row)
    }

    pub async fn update_profile(&self, form: &ProfileForm) -> ActionResult<Profile> {
        let profile = self.actions.update_profile(form).await?;
        self.profile.refetch().await;
        Ok(profile)
    }

    /// Open the Pay Now form for a card
    pub async fn pay_now_form(&self, card: &Account) -> PayNowForm {
        PayNowForm::new(card, &self.accounts.items().await)
    }

    pub fn pay_card(&self, form: &PayNowForm) -> ActionResult<PaymentIntent> {
        self.actions.pay_card(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::notify::CollectingNotifier;
    use rust_decimal::Decimal;

    async fn workspace() -> (Workspace, Arc<CollectingNotifier>) {
        let session = Session::new(Uuid::new_v4());
        let store = MemoryBackend::seeded().await;
        store
            .ensure_profile(session.user_id, "demo@example.com")
            .await
            .unwrap();
        let notifier = Arc::new(CollectingNotifier::new());
        let workspace = Workspace::mount(
            Arc::new(store.as_user(session.user_id)),
            Some(session),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            "PHP",
        )
        .await;
        (workspace, notifier)
    }

    #[tokio::test]
    async fn test_end_to_end_dashboard() {
        let (ws, _notifier) = workspace().await;

        let Submitted::Done(bank) = ws
            .save_account(&AccountForm {
                name: "BPI".to_string(),
                kind: "bank".to_string(),
                balance: "10,000".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
        else {
            panic!("create should not need confirmation");
        };

        let groceries = ws
            .categories_of(Some(TransactionKind::Expense))
            .await
            .into_iter()
            .find(|c| c.name == "Groceries")
            .unwrap();

        let form = TransactionForm {
            amount: "1500".to_string(),
            category_id: groceries.id.to_string(),
            account_id: bank.id.to_string(),
            description: "Weekly groceries".to_string(),
            ..TransactionForm::new(Some(TransactionKind::Expense))
        };
        assert!(matches!(
            ws.save_transaction(&form).await.unwrap(),
            Submitted::Done(_)
        ));

        let dashboard = ws.dashboard().await;
        assert_eq!(dashboard.totals.total_balance, Decimal::from(10000));
        assert_eq!(dashboard.totals.total_expenses, Decimal::from(1500));
        assert_eq!(dashboard.spending.slices[0].name, "Groceries");
        assert_eq!(dashboard.recent[0].category_name, "Groceries");
        assert_eq!(dashboard.recent[0].account_name, "BPI");
    }

    #[tokio::test]
    async fn test_confirm_refreshes_collection() {
        let (ws, notifier) = workspace().await;
        let Submitted::Done(cash) = ws
            .save_account(&AccountForm {
                name: "Cash".to_string(),
                kind: "cash".to_string(),
                balance: "200".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
        else {
            panic!("expected insert");
        };

        let pending = ws.delete_account(&cash);
        assert_eq!(ws.accounts_view().await.cash_and_bank.len(), 1);

        ws.confirm(pending).await.unwrap();
        assert!(ws.accounts_view().await.cash_and_bank.is_empty());
        assert_eq!(notifier.last().unwrap().title, "Account Deleted");
    }

    #[tokio::test]
    async fn test_profile_view() {
        let (ws, _) = workspace().await;
        let view = ws.profile_view().await;
        assert_eq!(view.profile.unwrap().email, "demo@example.com");
        assert_eq!(view.stats.initials, "U");

        let updated = ws
            .update_profile(&ProfileForm {
                first_name: "Carlo".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.initials(), "C");
        assert_eq!(ws.profile_view().await.stats.full_name, "Carlo");
    }
}
