//! Write Actions
//!
//! The only path by which this client changes backend rows. Each action
//! validates its form first; creates then go straight to the backend,
//! while edits and deletes come back as a [`PendingWrite`] that does
//! nothing until confirmed.
//!
//! Every outcome is reported through the [`Notifier`]: an informational
//! notice on success, a destructive one carrying the raw message on
//! failure. Failed actions leave the caller's form untouched.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::backend::{to_row, Backend, BackendError};
use crate::forms::{AccountForm, FormError, PayNowForm, PaymentIntent, ProfileForm, TransactionForm};
use crate::model::{Account, Profile, Table, Transaction};
use crate::notify::{Notice, Notifier};
use crate::session::Session;

/// Errors raised by write actions
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Invalid(#[from] FormError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ActionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::Invalid(_))
    }
}

/// Result type alias for actions
pub type ActionResult<T> = Result<T, ActionError>;

/// Prompt shown before a gated write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
enum WriteOp {
    Update { id: Uuid, patch: Value },
    Delete { id: Uuid },
}

/// A write waiting for explicit confirmation
///
/// Dropping or cancelling it issues no backend call.
#[must_use = "a pending write does nothing until confirmed"]
pub struct PendingWrite {
    table: Table,
    op: WriteOp,
    confirmation: Confirmation,
    success: Notice,
    failure_fallback: String,
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
}

impl PendingWrite {
    pub fn confirmation(&self) -> &Confirmation {
        &self.confirmation
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Id of the row this write targets
    pub fn row_id(&self) -> Uuid {
        match &self.op {
            WriteOp::Update { id, .. } | WriteOp::Delete { id } => *id,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self.op, WriteOp::Delete { .. })
    }

    /// Issue the write; returns the updated row for updates
    pub async fn confirm(self) -> ActionResult<Option<Value>> {
        let result = match self.op {
            WriteOp::Update { id, patch } => self
                .backend
                .update(self.table, id, patch)
                .await
                .map(Some),
            WriteOp::Delete { id } => self.backend.delete(self.table, id).await.map(|_| None),
        };

        match result {
            Ok(row) => {
                self.notifier.notify(self.success);
                Ok(row)
            }
            Err(e) => {
                tracing::warn!(table = %self.table, error = %e, "Confirmed write failed");
                self.notifier
                    .notify(Notice::error("Error", raw_message(&e, &self.failure_fallback)));
                Err(e.into())
            }
        }
    }

    /// Abandon the write
    pub fn cancel(self) {
        tracing::debug!(table = %self.table, row_id = %self.row_id(), "Write cancelled");
    }
}

impl std::fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("table", &self.table)
            .field("op", &self.op)
            .field("confirmation", &self.confirmation)
            .finish()
    }
}

/// Outcome of submitting a form
#[derive(Debug)]
pub enum Submitted<T> {
    /// Written immediately
    Done(T),
    /// Waiting for confirmation
    NeedsConfirmation(PendingWrite),
}

/// Write entry point for one session
#[derive(Clone)]
pub struct Actions {
    backend: Arc<dyn Backend>,
    session: Option<Session>,
    notifier: Arc<dyn Notifier>,
}

impl Actions {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Option<Session>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            session,
            notifier,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn reject(&self, err: FormError) -> ActionError {
        tracing::debug!(reason = %err, "Form rejected");
        self.notifier.notify(err.notice());
        ActionError::Invalid(err)
    }

    fn fail(&self, err: BackendError, fallback: &str) -> ActionError {
        tracing::warn!(error = %err, "{}", fallback);
        self.notifier
            .notify(Notice::error("Error", raw_message(&err, fallback)));
        ActionError::Backend(err)
    }

    fn pending(
        &self,
        table: Table,
        op: WriteOp,
        confirmation: Confirmation,
        success: Notice,
        failure_fallback: &str,
    ) -> PendingWrite {
        PendingWrite {
            table,
            op,
            confirmation,
            success,
            failure_fallback: failure_fallback.to_string(),
            backend: Arc::clone(&self.backend),
            notifier: Arc::clone(&self.notifier),
        }
    }

    /// Create or edit an account depending on the form
    pub async fn save_account(&self, form: &AccountForm) -> ActionResult<Submitted<Account>> {
        let draft = form
            .validate(self.session.as_ref())
            .map_err(|e| self.reject(e))?;

        if let Some(existing) = form.editing() {
            let patch = to_row(&draft)?;
            return Ok(Submitted::NeedsConfirmation(self.pending(
                Table::Accounts,
                WriteOp::Update {
                    id: existing.id,
                    patch,
                },
                Confirmation {
                    title: "Save changes?".to_string(),
                    description: format!("This will update the details for {}.", draft.name),
                },
                Notice::info("Account Updated", format!("{} updated successfully", draft.name)),
                "Failed to update account",
            )));
        }

        let row = self
            .backend
            .insert(Table::Accounts, to_row(&draft)?)
            .await
            .map_err(|e| self.fail(e, "Failed to add account"))?;
        let account: Account = serde_json::from_value(row).map_err(BackendError::from)?;

        tracing::info!(account_id = %account.id, kind = %account.kind, "Account added");
        self.notifier.notify(Notice::info(
            "Account Added",
            format!("{} added successfully", account.name),
        ));
        Ok(Submitted::Done(account))
    }

    /// Gate deleting an account behind confirmation
    pub fn delete_account(&self, account: &Account) -> PendingWrite {
        self.pending(
            Table::Accounts,
            WriteOp::Delete { id: account.id },
            Confirmation {
                title: "Delete account?".to_string(),
                description: "This will permanently remove the account and its balance. This action cannot be undone.".to_string(),
            },
            Notice::info("Account Deleted", "Account has been removed successfully"),
            "Failed to delete account",
        )
    }

    /// Create or edit a transaction depending on the form
    pub async fn save_transaction(
        &self,
        form: &TransactionForm,
    ) -> ActionResult<Submitted<Transaction>> {
        let draft = form
            .validate(self.session.as_ref())
            .map_err(|e| self.reject(e))?;
        let label = draft.kind.label();

        if let Some(existing) = form.editing() {
            let patch = to_row(&draft)?;
            return Ok(Submitted::NeedsConfirmation(self.pending(
                Table::Transactions,
                WriteOp::Update {
                    id: existing.id,
                    patch,
                },
                Confirmation {
                    title: "Save changes?".to_string(),
                    description: format!(
                        "This will update the {} entry.",
                        label.to_lowercase()
                    ),
                },
                Notice::info("Transaction Updated", format!("{} updated successfully", label)),
                "Failed to update transaction",
            )));
        }

        let row = self
            .backend
            .insert(Table::Transactions, to_row(&draft)?)
            .await
            .map_err(|e| self.fail(e, "Failed to add transaction"))?;
        let transaction: Transaction = serde_json::from_value(row).map_err(BackendError::from)?;

        tracing::info!(
            transaction_id = %transaction.id,
            kind = %transaction.kind,
            "Transaction added"
        );
        self.notifier.notify(Notice::info(
            "Transaction Added",
            format!("{} added successfully", label),
        ));
        Ok(Submitted::Done(transaction))
    }

    /// Gate deleting a transaction behind confirmation
    pub fn delete_transaction(&self, transaction: &Transaction) -> PendingWrite {
        self.pending(
            Table::Transactions,
            WriteOp::Delete { id: transaction.id },
            Confirmation {
                title: "Delete transaction?".to_string(),
                description: "This will permanently remove the transaction. This action cannot be undone.".to_string(),
            },
            Notice::info("Transaction Deleted", "Transaction has been removed successfully"),
            "Failed to delete transaction",
        )
    }

    /// Write the profile form directly
    pub async fn update_profile(&self, form: &ProfileForm) -> ActionResult<Profile> {
        let Some(session) = &self.session else {
            return Err(self.fail(
                BackendError::PermissionDenied("No user logged in".to_string()),
                "Could not update profile",
            ));
        };

        let result = self
            .backend
            .update(Table::Profiles, session.user_id, to_row(&form.to_patch())?)
            .await;

        match result {
            Ok(row) => {
                let profile: Profile = serde_json::from_value(row).map_err(BackendError::from)?;
                self.notifier.notify(Notice::info(
                    "Profile Updated",
                    "Your profile has been updated successfully",
                ));
                Ok(profile)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile update failed");
                self.notifier.notify(Notice::error(
                    "Update Failed",
                    raw_message(&e, "Could not update profile"),
                ));
                Err(e.into())
            }
        }
    }

    /// Validate a card payment; no balances are moved
    pub fn pay_card(&self, form: &PayNowForm) -> ActionResult<PaymentIntent> {
        let intent = form.submit().map_err(|e| self.reject(e))?;

        tracing::info!(
            card_id = %intent.card_id,
            from_account_id = %intent.from_account_id,
            amount = %intent.amount,
            "Card payment requested"
        );
        Ok(intent)
    }
}

fn raw_message(err: &BackendError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Query};
    use crate::model::AccountType;
    use crate::notify::CollectingNotifier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails every write
    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Backend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        async fn select(&self, _: Table, _: &Query) -> crate::backend::BackendResult<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn insert(&self, _: Table, _: Value) -> crate::backend::BackendResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Api {
                status: 500,
                message: "insert exploded".to_string(),
            })
        }

        async fn update(&self, _: Table, _: Uuid, _: Value) -> crate::backend::BackendResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Unavailable)
        }

        async fn delete(&self, _: Table, _: Uuid) -> crate::backend::BackendResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn subscribe(
            &self,
            _: crate::backend::ChannelSpec,
        ) -> crate::backend::BackendResult<crate::backend::Subscription> {
            Err(BackendError::Unavailable)
        }
    }

    fn setup() -> (Actions, Arc<CollectingNotifier>, MemoryBackend) {
        let session = Session::new(Uuid::new_v4());
        let store = MemoryBackend::new().as_user(session.user_id);
        let notifier = Arc::new(CollectingNotifier::new());
        let actions = Actions::new(
            Arc::new(store.clone()),
            Some(session),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );
        (actions, notifier, store)
    }

    fn cash_form(name: &str) -> AccountForm {
        AccountForm {
            name: name.to_string(),
            kind: "cash".to_string(),
            balance: "500".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_backend() {
        let backend = Arc::new(CountingBackend::default());
        let notifier = Arc::new(CollectingNotifier::new());
        let actions = Actions::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            Some(Session::new(Uuid::new_v4())),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let err = actions.save_account(&AccountForm::new()).await.unwrap_err();
        assert!(err.is_validation());

        let err = actions
            .save_transaction(&TransactionForm::new(None))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        let notices = notifier.take();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.title == "Missing Information"));
    }

    #[tokio::test]
    async fn test_create_account_notifies() {
        let (actions, notifier, store) = setup();

        let Submitted::Done(account) = actions.save_account(&cash_form("Wallet")).await.unwrap()
        else {
            panic!("create should not need confirmation");
        };
        assert_eq!(account.kind, AccountType::Cash);
        assert_eq!(account.icon, "Wallet");

        let notice = notifier.last().unwrap();
        assert_eq!(notice.title, "Account Added");
        assert_eq!(notice.description, "Wallet added successfully");

        let rows = store.select(Table::Accounts, &Query::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_requires_confirmation() {
        let (actions, notifier, store) = setup();
        let Submitted::Done(account) = actions.save_account(&cash_form("Cash")).await.unwrap()
        else {
            panic!("expected insert");
        };

        let mut form = AccountForm::edit(&account);
        form.name = "Pocket Cash".to_string();

        let Submitted::NeedsConfirmation(pending) = actions.save_account(&form).await.unwrap()
        else {
            panic!("edit must be confirmed");
        };
        assert_eq!(pending.confirmation().title, "Save changes?");

        // Nothing written yet
        let rows = store.select(Table::Accounts, &Query::new()).await.unwrap();
        assert_eq!(rows[0]["name"], "Cash");

        let updated = pending.confirm().await.unwrap().unwrap();
        assert_eq!(updated["name"], "Pocket Cash");
        assert_eq!(notifier.last().unwrap().title, "Account Updated");
    }

    #[tokio::test]
    async fn test_cancelled_edit_issues_no_call() {
        let backend = Arc::new(CountingBackend::default());
        let session = Session::new(Uuid::new_v4());
        let actions = Actions::new(
            Arc::clone(&backend) as Arc<dyn Backend>,
            Some(session.clone()),
            Arc::new(CollectingNotifier::new()),
        );

        let tx = Transaction {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            account_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            kind: crate::model::TransactionKind::Expense,
            amount: rust_decimal::Decimal::from(10),
            description: None,
            date: chrono::Utc::now(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let submitted = actions
            .save_transaction(&TransactionForm::edit(&tx))
            .await
            .unwrap();
        match submitted {
            Submitted::NeedsConfirmation(pending) => pending.cancel(),
            Submitted::Done(_) => panic!("edit must be confirmed"),
        }
        actions.delete_transaction(&tx).cancel();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_posts_raw_message() {
        let backend: Arc<dyn Backend> = Arc::new(CountingBackend::default());
        let notifier = Arc::new(CollectingNotifier::new());
        let actions = Actions::new(
            backend,
            Some(Session::new(Uuid::new_v4())),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let err = actions.save_account(&cash_form("Cash")).await.unwrap_err();
        assert!(!err.is_validation());

        let notice = notifier.last().unwrap();
        assert_eq!(notice.title, "Error");
        assert_eq!(notice.description, "insert exploded");
        assert!(notice.is_destructive());
    }

    #[tokio::test]
    async fn test_delete_account_after_confirm() {
        let (actions, notifier, store) = setup();
        let Submitted::Done(account) = actions.save_account(&cash_form("Temp")).await.unwrap()
        else {
            panic!("expected insert");
        };

        let pending = actions.delete_account(&account);
        assert_eq!(pending.confirmation().title, "Delete account?");
        assert!(pending.is_delete());
        assert!(pending.confirm().await.unwrap().is_none());

        assert!(store
            .select(Table::Accounts, &Query::new())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(notifier.last().unwrap().title, "Account Deleted");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (actions, notifier, store) = setup();
        let me = actions.session().unwrap().user_id;
        store.ensure_profile(me, "me@example.com").await.unwrap();

        let form = ProfileForm {
            first_name: "Lea".to_string(),
            last_name: "Santos".to_string(),
            ..Default::default()
        };
        let profile = actions.update_profile(&form).await.unwrap();
        assert_eq!(profile.full_name(), "Lea Santos");
        assert_eq!(notifier.last().unwrap().title, "Profile Updated");
    }
}
