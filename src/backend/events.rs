//! Change notifications

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::Filter;
use crate::model::Table;

/// What happened to a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "INSERT"),
            ChangeKind::Update => write!(f, "UPDATE"),
            ChangeKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A row-level change on a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub row_id: Uuid,
    /// New row for inserts and updates, old row for deletes
    pub record: Value,
}

impl ChangeEvent {
    pub fn new(table: Table, kind: ChangeKind, row_id: Uuid, record: Value) -> Self {
        Self {
            table,
            kind,
            row_id,
            record,
        }
    }
}

/// What a subscription channel listens to
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    /// Channel name, for logs only
    pub name: String,
    pub table: Table,
    /// Optional `column = value` row filter
    pub filter: Option<Filter>,
}

impl ChannelSpec {
    /// All changes on a table
    pub fn table(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
            filter: None,
        }
    }

    /// Builder: only changes whose record has `column = value`
    pub fn filtered(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(Filter::eq(column, value));
        self
    }

    /// Whether this channel should receive the event
    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        event.table == self.table
            && self
                .filter
                .as_ref()
                .map_or(true, |filter| filter.matches(&event.record))
    }
}
