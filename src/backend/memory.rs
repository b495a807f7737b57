//! In-process backend
//!
//! Holds every table as a list of JSON rows and applies the same
//! visibility rules the hosted store enforces with row-level security:
//!
//! - accounts, transactions: `user_id` must be the session user
//! - categories: system rows, or `user_id` is the session user
//! - profiles: `id` must be the session user
//!
//! Several [`MemoryBackend`] handles may share one store (see
//! [`MemoryBackend::as_user`]), which is how cross-user isolation is
//! exercised in tests. With a snapshot path configured the store is
//! written back to a JSON file after every successful write.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Backend, BackendError, BackendResult, ChangeEvent, ChangeHub, ChangeKind, ChannelSpec, Order,
    Query, Subscription,
};
use crate::model::account::default_currency;
use crate::model::{CategoryDraft, Table};

type Rows = HashMap<Table, Vec<Value>>;

/// Backend kept entirely in memory
#[derive(Clone)]
pub struct MemoryBackend {
    rows: Arc<RwLock<Rows>>,
    hub: ChangeHub,
    user: Option<Uuid>,
    snapshot: Option<PathBuf>,
}

impl MemoryBackend {
    /// Empty store with no signed-in user
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            hub: ChangeHub::default(),
            user: None,
            snapshot: None,
        }
    }

    /// Store seeded with the default system categories
    pub async fn seeded() -> Self {
        let backend = Self::new();
        backend.seed_categories().await;
        backend
    }

    /// Load a store from a JSON snapshot, seeding categories when the
    /// file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> BackendResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut backend = Self::new();

        if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let loaded: Rows = serde_json::from_str(&content)?;
            *backend.rows.write().await = loaded;
            tracing::info!(path = %path.display(), "Loaded local snapshot");
        } else {
            backend.seed_categories().await;
            tracing::info!(path = %path.display(), "Starting new local snapshot");
        }

        backend.snapshot = Some(path);
        Ok(backend)
    }

    /// Handle on the same store acting as `user`
    pub fn as_user(&self, user: Uuid) -> Self {
        Self {
            user: Some(user),
            ..self.clone()
        }
    }

    /// Handle on the same store with no signed-in user
    pub fn signed_out(&self) -> Self {
        Self {
            user: None,
            ..self.clone()
        }
    }

    pub fn user(&self) -> Option<Uuid> {
        self.user
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    /// Create the profile row the auth service would create on sign-up
    pub async fn ensure_profile(&self, id: Uuid, email: &str) -> BackendResult<()> {
        let mut rows = self.rows.write().await;
        let profiles = rows.entry(Table::Profiles).or_default();
        if profiles.iter().any(|row| row_id(row) == Some(id)) {
            return Ok(());
        }

        let now = Utc::now().to_rfc3339();
        profiles.push(serde_json::json!({
            "id": id,
            "email": email,
            "first_name": null,
            "last_name": null,
            "phone": null,
            "address": null,
            "avatar_url": null,
            "created_at": now,
            "updated_at": now,
        }));
        drop(rows);

        self.persist().await
    }

    async fn seed_categories(&self) {
        let mut rows = self.rows.write().await;
        let categories = rows.entry(Table::Categories).or_default();
        if categories.iter().any(|row| row["is_system"] == Value::Bool(true)) {
            return;
        }

        let now = Utc::now().to_rfc3339();
        for draft in CategoryDraft::defaults() {
            if let Ok(Value::Object(mut map)) = serde_json::to_value(&draft) {
                map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
                map.insert("created_at".to_string(), Value::String(now.clone()));
                categories.push(Value::Object(map));
            }
        }
    }

    /// Whether the session user may see `row`
    fn visible(&self, table: Table, row: &Value) -> bool {
        let Some(user) = self.user else {
            return false;
        };
        let owned = row
            .get(table.owner_column())
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            == Some(user);

        match table {
            Table::Categories => owned || row["is_system"] == Value::Bool(true),
            _ => owned,
        }
    }

    /// Whether the session user may write `row` as its new content
    fn writable(&self, table: Table, row: &Value) -> bool {
        let Some(user) = self.user else {
            return false;
        };
        let owner = row
            .get(table.owner_column())
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());

        match table {
            Table::Categories => owner == Some(user) && row["is_system"] != Value::Bool(true),
            _ => owner == Some(user),
        }
    }

    fn require_user(&self) -> BackendResult<Uuid> {
        self.user
            .ok_or_else(|| BackendError::PermissionDenied("not signed in".to_string()))
    }

    async fn persist(&self) -> BackendResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let content = {
            let rows = self.rows.read().await;
            serde_json::to_string_pretty(&*rows)?
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn select(&self, table: Table, query: &Query) -> BackendResult<Vec<Value>> {
        let rows = self.rows.read().await;
        let mut selected: Vec<Value> = rows
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| self.visible(table, row) && query.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(rows);

        if !query.order.is_empty() {
            selected.sort_by(|a, b| compare_rows(a, b, &query.order));
        }
        if let Some(limit) = query.limit {
            selected.truncate(limit);
        }

        Ok(selected)
    }

    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value> {
        self.require_user()?;
        let Value::Object(mut map) = row else {
            return Err(BackendError::Decode(format!(
                "{} row must be a JSON object",
                table
            )));
        };

        let now = Value::String(Utc::now().to_rfc3339());
        let id = match map.get("id").and_then(Value::as_str) {
            Some(id) => Uuid::parse_str(id).map_err(|e| BackendError::Decode(e.to_string()))?,
            None => Uuid::new_v4(),
        };
        map.insert("id".to_string(), Value::String(id.to_string()));
        map.entry("created_at").or_insert_with(|| now.clone());
        if table != Table::Categories {
            map.entry("updated_at").or_insert_with(|| now.clone());
        }
        apply_column_defaults(table, &mut map);

        let row = Value::Object(map);
        if !self.writable(table, &row) {
            return Err(row_level_security(table));
        }

        {
            let mut rows = self.rows.write().await;
            let table_rows = rows.entry(table).or_default();
            if table_rows.iter().any(|existing| row_id(existing) == Some(id)) {
                return Err(BackendError::Api {
                    status: 409,
                    message: format!(
                        "duplicate key value violates unique constraint \"{}_pkey\"",
                        table
                    ),
                });
            }
            table_rows.push(row.clone());
        }

        self.persist().await?;
        self.hub
            .publish(&ChangeEvent::new(table, ChangeKind::Insert, id, row.clone()));
        Ok(row)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> BackendResult<Value> {
        self.require_user()?;
        let Value::Object(patch) = patch else {
            return Err(BackendError::Decode(format!(
                "{} patch must be a JSON object",
                table
            )));
        };

        let updated = {
            let mut rows = self.rows.write().await;
            let table_rows = rows.entry(table).or_default();
            let position = table_rows
                .iter()
                .position(|row| row_id(row) == Some(id) && self.visible(table, row))
                .ok_or_else(|| BackendError::NotFound(format!("{} row {}", table, id)))?;

            let mut merged = table_rows[position].clone();
            if let Value::Object(map) = &mut merged {
                for (key, value) in patch {
                    if key != "id" {
                        map.insert(key, value);
                    }
                }
                if table != Table::Categories {
                    map.insert(
                        "updated_at".to_string(),
                        Value::String(Utc::now().to_rfc3339()),
                    );
                }
            }

            if !self.writable(table, &merged) {
                return Err(row_level_security(table));
            }
            table_rows[position] = merged.clone();
            merged
        };

        self.persist().await?;
        self.hub.publish(&ChangeEvent::new(
            table,
            ChangeKind::Update,
            id,
            updated.clone(),
        ));
        Ok(updated)
    }

    async fn delete(&self, table: Table, id: Uuid) -> BackendResult<()> {
        self.require_user()?;

        let removed = {
            let mut rows = self.rows.write().await;
            let table_rows = rows.entry(table).or_default();
            let position = table_rows
                .iter()
                .position(|row| row_id(row) == Some(id) && self.writable(table, row));
            position.map(|p| table_rows.remove(p))
        };

        // Deleting a row that is missing or not ours matches nothing and succeeds.
        let Some(removed) = removed else {
            return Ok(());
        };

        self.persist().await?;
        self.hub
            .publish(&ChangeEvent::new(table, ChangeKind::Delete, id, removed));
        Ok(())
    }

    async fn subscribe(&self, spec: ChannelSpec) -> BackendResult<Subscription> {
        Ok(self.hub.open(spec)?)
    }
}

fn row_id(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn row_level_security(table: Table) -> BackendError {
    BackendError::PermissionDenied(format!(
        "new row violates row-level security policy for table \"{}\"",
        table
    ))
}

/// Column defaults the hosted schema would fill in
fn apply_column_defaults(table: Table, map: &mut Map<String, Value>) {
    match table {
        Table::Accounts => {
            map.entry("currency")
                .or_insert_with(|| Value::String(default_currency()));
            map.entry("is_active").or_insert(Value::Bool(true));
            map.entry("balance").or_insert(Value::from(0));
        }
        Table::Categories => {
            map.entry("is_system").or_insert(Value::Bool(false));
        }
        Table::Transactions => {
            map.entry("date")
                .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        }
        Table::Profiles => {}
    }
}

fn compare_rows(a: &Value, b: &Value, order: &[Order]) -> Ordering {
    for key in order {
        let ordering = compare_values(
            a.get(&key.column).unwrap_or(&Value::Null),
            b.get(&key.column).unwrap_or(&Value::Null),
        );
        let ordering = if key.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (
                crate::model::dates::parse_datetime(x),
                crate::model::dates::parse_datetime(y),
            ) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x.to_lowercase().cmp(&y.to_lowercase()),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
