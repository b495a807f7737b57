//! Backend Collaborator
//!
//! Persistence, row-level security and change notification belong to a
//! hosted backend. This module defines the seam the rest of the crate
//! talks to and ships two implementations:
//!
//! - **RestBackend**: PostgREST-dialect HTTP client for the hosted store
//! - **MemoryBackend**: in-process store with the same row visibility
//!   rules, optionally snapshotted to a JSON file (local mode and tests)
//!
//! Both route change events through a [`ChangeHub`], which hands out one
//! [`Subscription`] per opened channel.
//!
//! ## Protocol
//!
//! ```text
//! select(table, query)       → rows matching eq/any-of filters, ordered
//! insert(table, row)         → inserted row
//! update(table, id, patch)   → updated row
//! delete(table, id)          → ()
//! subscribe(channel spec)    → stream of ChangeEvent for table (+ filter)
//! ```
//!
//! There is no client-side retry, backoff or cancellation: a failed call
//! is reported once and left to the user.

mod events;
mod hub;
mod memory;
mod rest;

pub use events::{ChangeEvent, ChangeKind, ChannelSpec};
pub use hub::{ChangeHub, HubConfig, HubError, Subscription};
pub use memory::MemoryBackend;
pub use rest::{RestBackend, RestConfig};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::model::Table;

/// Column equality test
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Whether a row satisfies this filter
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column).unwrap_or(&Value::Null) == &self.value
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Row selection: all `filters` must hold, and at least one of `any_of`
/// when it is non-empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub any_of: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an equality filter
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Builder: add an alternative to the any-of group
    pub fn or_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.any_of.push(Filter::eq(column, value));
        self
    }

    /// Builder: sort ascending by column
    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending: true,
        });
        self
    }

    /// Builder: sort descending by column
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending: false,
        });
        self
    }

    /// Builder: cap the number of rows
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a row satisfies every filter and the any-of group
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
            && (self.any_of.is_empty() || self.any_of.iter().any(|f| f.matches(row)))
    }
}

/// The hosted backend as seen by one signed-in session
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Select rows
    async fn select(&self, table: Table, query: &Query) -> BackendResult<Vec<Value>>;

    /// Insert a row and return it as stored
    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value>;

    /// Update the row with the given id and return it as stored
    async fn update(&self, table: Table, id: Uuid, patch: Value) -> BackendResult<Value>;

    /// Delete the row with the given id
    async fn delete(&self, table: Table, id: Uuid) -> BackendResult<()>;

    /// Open a change-subscription channel
    async fn subscribe(&self, spec: ChannelSpec) -> BackendResult<Subscription>;
}

/// Select rows and decode them
pub async fn select_as<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: Table,
    query: &Query,
) -> BackendResult<Vec<T>> {
    backend
        .select(table, query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

/// Select exactly one row and decode it
pub async fn select_one<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: Table,
    query: &Query,
) -> BackendResult<T> {
    let mut rows = backend.select(table, query).await?;
    match rows.len() {
        1 => Ok(serde_json::from_value(rows.remove(0))?),
        0 => Err(BackendError::NotFound(format!("no {} row matched", table))),
        n => Err(BackendError::Api {
            status: 406,
            message: format!("expected a single {} row, found {}", table, n),
        }),
    }
}

/// Serialize a payload into a row value
pub fn to_row<T: Serialize>(payload: &T) -> BackendResult<Value> {
    Ok(serde_json::to_value(payload)?)
}

/// Errors reported by the backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel error: {0}")]
    Channel(#[from] HubError),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_matches_filters_and_any_of() {
        let me = "u-1";
        let query = Query::new()
            .eq("type", "expense")
            .or_eq("is_system", true)
            .or_eq("user_id", me);

        assert!(query.matches(&json!({"type": "expense", "is_system": true, "user_id": null})));
        assert!(query.matches(&json!({"type": "expense", "is_system": false, "user_id": "u-1"})));
        assert!(!query.matches(&json!({"type": "expense", "is_system": false, "user_id": "u-2"})));
        assert!(!query.matches(&json!({"type": "income", "is_system": true})));
    }

    #[test]
    fn test_missing_column_matches_null_only() {
        assert!(Filter::eq("user_id", Value::Null).matches(&json!({})));
        assert!(!Filter::eq("user_id", "x").matches(&json!({})));
    }

    #[test]
    fn test_error_display_is_raw_message() {
        let err = BackendError::Api {
            status: 409,
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
    }
}
