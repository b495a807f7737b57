//! Live Collections
//!
//! Read-through caches over backend tables. A collection opens exactly
//! one change channel when mounted, fetches once, then re-fetches the
//! whole collection on every event it receives. Dropping the collection
//! stops its listener, which closes the channel.
//!
//! ```text
//! mount ─► subscribe ─► fetch
//!              │
//!           listener ─► event ─► refetch
//! ```

mod profile;

pub use profile::LiveProfile;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::backend::{select_as, Backend, ChannelSpec, Query};
use crate::model::{Account, Category, Table, Transaction, TransactionKind};
use crate::session::Session;

/// Point-in-time contents of a live collection
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub loading: bool,
    /// Message of the most recent failed fetch, cleared on success
    pub error: Option<String>,
    /// Number of completed fetches
    pub version: u64,
}

impl<T> Snapshot<T> {
    fn loading() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
            error: None,
            version: 0,
        }
    }

    fn idle() -> Self {
        Self {
            loading: false,
            ..Self::loading()
        }
    }
}

struct Loader<T> {
    backend: Arc<dyn Backend>,
    table: Table,
    query: Query,
    state: Arc<RwLock<Snapshot<T>>>,
    version_tx: watch::Sender<u64>,
    /// Serializes fetches so a slow response never overwrites a newer one
    fetch_lock: Mutex<()>,
}

impl<T> Loader<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self) {
        let _guard = self.fetch_lock.lock().await;
        self.state.write().await.loading = true;

        let result = select_as::<T>(self.backend.as_ref(), self.table, &self.query).await;

        let version = {
            let mut state = self.state.write().await;
            match result {
                Ok(items) => {
                    tracing::debug!(table = %self.table, rows = items.len(), "Collection refreshed");
                    state.items = items;
                    state.error = None;
                }
                Err(e) => {
                    tracing::warn!(table = %self.table, error = %e, "Collection fetch failed");
                    state.error = Some(e.to_string());
                }
            }
            state.loading = false;
            state.version += 1;
            state.version
        };

        self.version_tx.send_replace(version);
    }
}

/// A cached, self-refreshing view of one backend query
pub struct LiveCollection<T> {
    state: Arc<RwLock<Snapshot<T>>>,
    loader: Option<Arc<Loader<T>>>,
    listener: Option<JoinHandle<()>>,
    version_rx: watch::Receiver<u64>,
}

impl<T> LiveCollection<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Mount a collection: listen on one channel, then fetch
    ///
    /// The channel opens before the first fetch so a write landing in
    /// between still triggers a refetch. If the channel cannot be opened
    /// the collection keeps its first fetch and records the error.
    pub async fn mount(
        backend: Arc<dyn Backend>,
        table: Table,
        query: Query,
        channel: ChannelSpec,
    ) -> Self {
        let state = Arc::new(RwLock::new(Snapshot::loading()));
        let (version_tx, version_rx) = watch::channel(0);

        let loader = Arc::new(Loader {
            backend: Arc::clone(&backend),
            table,
            query,
            state: Arc::clone(&state),
            version_tx,
            fetch_lock: Mutex::new(()),
        });

        let mut subscribe_error = None;
        let listener = match backend.subscribe(channel).await {
            Ok(mut subscription) => {
                let loader = Arc::clone(&loader);
                Some(tokio::spawn(async move {
                    while let Some(event) = subscription.recv().await {
                        tracing::debug!(
                            channel = %subscription.spec().name,
                            kind = %event.kind,
                            row_id = %event.row_id,
                            "Change received"
                        );
                        loader.fetch().await;
                    }
                }))
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Subscribe failed");
                subscribe_error = Some(e.to_string());
                None
            }
        };

        loader.fetch().await;
        if subscribe_error.is_some() {
            state.write().await.error = subscribe_error;
        }

        Self {
            state,
            loader: Some(loader),
            listener,
            version_rx,
        }
    }

    /// A collection with no session: always empty, never loading
    pub fn empty() -> Self {
        let (_, version_rx) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(Snapshot::idle())),
            loader: None,
            listener: None,
            version_rx,
        }
    }

    /// Re-fetch the whole collection now
    pub async fn refetch(&self) {
        if let Some(loader) = &self.loader {
            loader.fetch().await;
        }
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Snapshot<T> {
        self.state.read().await.clone()
    }

    /// Current items
    pub async fn items(&self) -> Vec<T> {
        self.state.read().await.items.clone()
    }

    /// Receiver that changes after every completed fetch
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.version_rx.clone()
    }

    /// Whether a listener is attached
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl<T> Drop for LiveCollection<T> {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl LiveCollection<Account> {
    /// Active accounts of the session user, newest first
    pub async fn accounts(backend: Arc<dyn Backend>, session: Option<&Session>) -> Self {
        let Some(session) = session else {
            return Self::empty();
        };
        let me = session.user_id.to_string();

        let query = Query::new()
            .eq("user_id", me.clone())
            .eq("is_active", true)
            .order_desc("created_at");
        let channel =
            ChannelSpec::table("accounts_changes", Table::Accounts).filtered("user_id", me);

        Self::mount(backend, Table::Accounts, query, channel).await
    }
}

impl LiveCollection<Transaction> {
    /// Transactions of the session user, most recent first
    pub async fn transactions(backend: Arc<dyn Backend>, session: Option<&Session>) -> Self {
        let Some(session) = session else {
            return Self::empty();
        };
        let me = session.user_id.to_string();

        let query = Query::new()
            .eq("user_id", me.clone())
            .order_desc("date")
            .order_desc("created_at");
        let channel = ChannelSpec::table("transactions_changes", Table::Transactions)
            .filtered("user_id", me);

        Self::mount(backend, Table::Transactions, query, channel).await
    }
}

impl LiveCollection<Category> {
    /// System categories plus the session user's own, by name
    pub async fn categories(
        backend: Arc<dyn Backend>,
        session: Option<&Session>,
        kind: Option<TransactionKind>,
    ) -> Self {
        let Some(session) = session else {
            return Self::empty();
        };

        let mut query = Query::new()
            .or_eq("is_system", true)
            .or_eq("user_id", session.user_id.to_string())
            .order_asc("name");
        if let Some(kind) = kind {
            query = query.eq("type", kind.to_string());
        }
        let channel = ChannelSpec::table("categories_changes", Table::Categories);

        Self::mount(backend, Table::Categories, query, channel).await
    }
}
