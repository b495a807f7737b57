//! Per-connection table subscriptions
//!
//! Each subscribed table holds one backend subscription and one forwarding
//! task that turns change events into [`ServerMessage::Changed`]. Dropping
//! the watch aborts the tasks, which releases the backend channels.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::messages::ServerMessage;
use crate::backend::{Backend, BackendError, BackendResult, ChannelSpec};
use crate::model::Table;

pub struct TableWatch {
    connection_id: String,
    backend: Arc<dyn Backend>,
    user_id: Option<Uuid>,
    outbox: mpsc::UnboundedSender<ServerMessage>,
    tasks: HashMap<Table, JoinHandle<()>>,
}

impl TableWatch {
    pub fn new(
        connection_id: impl Into<String>,
        backend: Arc<dyn Backend>,
        user_id: Option<Uuid>,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            backend,
            user_id,
            outbox,
            tasks: HashMap::new(),
        }
    }

    /// Start forwarding changes for `tables`; returns the full watched set
    ///
    /// Either every requested table is watched or none is: channels are
    /// resolved and opened before any forwarding task starts.
    pub async fn subscribe(&mut self, tables: &[Table]) -> BackendResult<Vec<Table>> {
        let mut specs = Vec::new();
        for &table in tables {
            if !self.tasks.contains_key(&table) && !specs.iter().any(|(t, _)| *t == table) {
                specs.push((table, self.channel(table)?));
            }
        }

        let mut opened = Vec::with_capacity(specs.len());
        for (table, spec) in specs {
            opened.push((table, self.backend.subscribe(spec).await?));
        }

        for (table, mut subscription) in opened {
            let outbox = self.outbox.clone();
            let task = tokio::spawn(async move {
                while let Some(event) = subscription.recv().await {
                    if outbox.send(ServerMessage::from(&event)).is_err() {
                        break;
                    }
                }
            });

            tracing::debug!(connection_id = %self.connection_id, table = %table, "Watching table");
            self.tasks.insert(table, task);
        }
        Ok(self.tables())
    }

    /// Stop forwarding changes for `tables`; returns those that were watched
    pub fn unsubscribe(&mut self, tables: &[Table]) -> Vec<Table> {
        tables
            .iter()
            .filter_map(|table| {
                self.tasks.remove(table).map(|task| {
                    task.abort();
                    *table
                })
            })
            .collect()
    }

    /// Watched tables, in display order
    pub fn tables(&self) -> Vec<Table> {
        Table::all()
            .iter()
            .copied()
            .filter(|t| self.tasks.contains_key(t))
            .collect()
    }

    fn channel(&self, table: Table) -> BackendResult<ChannelSpec> {
        let spec = ChannelSpec::table(format!("ws_{}_{}", self.connection_id, table), table);
        if table == Table::Categories {
            return Ok(spec);
        }

        let user_id = self
            .user_id
            .ok_or_else(|| BackendError::PermissionDenied("No user logged in".to_string()))?;
        Ok(spec.filtered(table.owner_column(), user_id.to_string()))
    }
}

impl Drop for TableWatch {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_forwards_own_changes_only() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let store = MemoryBackend::seeded().await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut watch = TableWatch::new("c1", Arc::new(store.as_user(me)), Some(me), tx);
        let watched = watch.subscribe(&[Table::Accounts]).await.unwrap();
        assert_eq!(watched, vec![Table::Accounts]);

        store
            .as_user(other)
            .insert(
                Table::Accounts,
                json!({"user_id": other.to_string(), "name": "Theirs", "type": "cash"}),
            )
            .await
            .unwrap();
        let mine = store
            .as_user(me)
            .insert(
                Table::Accounts,
                json!({"user_id": me.to_string(), "name": "Mine", "type": "cash"}),
            )
            .await
            .unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match msg {
            ServerMessage::Changed { table, id, .. } => {
                assert_eq!(table, Table::Accounts);
                assert_eq!(id.to_string(), mine["id"].as_str().unwrap());
            }
            other => panic!("Expected Changed, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_and_drop_release_channels() {
        let me = Uuid::new_v4();
        let store = MemoryBackend::seeded().await;
        let hub = store.hub().clone();
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut watch = TableWatch::new("c2", Arc::new(store.as_user(me)), Some(me), tx);
        watch
            .subscribe(&[Table::Accounts, Table::Transactions])
            .await
            .unwrap();

        let removed = watch.unsubscribe(&[Table::Accounts, Table::Profiles]);
        assert_eq!(removed, vec![Table::Accounts]);
        assert_eq!(watch.tables(), vec![Table::Transactions]);

        drop(watch);
        tokio::time::timeout(Duration::from_secs(2), async {
            while hub.channel_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_user_tables_need_session() {
        let store = MemoryBackend::seeded().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut watch = TableWatch::new("c3", Arc::new(store.signed_out()), None, tx);

        assert!(watch.subscribe(&[Table::Categories]).await.is_ok());
        assert!(watch.subscribe(&[Table::Accounts]).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_subscribe_watches_nothing() {
        let store = MemoryBackend::seeded().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut watch = TableWatch::new("c4", Arc::new(store.signed_out()), None, tx);

        let err = watch
            .subscribe(&[Table::Categories, Table::Accounts])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No user logged in"));
        assert!(watch.tables().is_empty());
        assert_eq!(store.hub().channel_count(), 0);
    }
}
