//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! clients and the finance server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{ChangeEvent, ChangeKind};
use crate::model::Table;

/// Subscribes to every table
pub const ALL_TABLES: &str = "*";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to change notifications for tables
    Subscribe {
        /// Table names, or `*` for all of them
        tables: Vec<String>,
    },
    /// Unsubscribe from tables
    Unsubscribe { tables: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
    /// Subscription confirmed
    Subscribed { tables: Vec<Table> },
    /// Unsubscription confirmed
    Unsubscribed { tables: Vec<Table> },
    /// A row changed; refetch the table
    Changed {
        table: Table,
        event: ChangeKind,
        id: Uuid,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
}

impl From<&ChangeEvent> for ServerMessage {
    fn from(event: &ChangeEvent) -> Self {
        ServerMessage::Changed {
            table: event.table,
            event: event.kind,
            id: event.row_id,
        }
    }
}

/// Resolve table names, expanding `*`
pub fn parse_tables(names: &[String]) -> Result<Vec<Table>, String> {
    let mut tables = Vec::new();
    for name in names {
        let resolved: Vec<Table> = if name.trim() == ALL_TABLES {
            Table::all().to_vec()
        } else {
            vec![name.parse()?]
        };
        for table in resolved {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "tables": ["accounts", "transactions"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { tables } => {
                assert_eq!(tables, vec!["accounts", "transactions"]);
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_changed_message() {
        let id = Uuid::new_v4();
        let event = ChangeEvent::new(Table::Accounts, ChangeKind::Delete, id, json!({}));
        let value = serde_json::to_value(ServerMessage::from(&event)).unwrap();
        assert_eq!(value["type"], "changed");
        assert_eq!(value["table"], "accounts");
        assert_eq!(value["event"], "DELETE");
        assert_eq!(value["id"], id.to_string());
    }

    #[test]
    fn test_parse_tables() {
        let all = parse_tables(&["*".to_string(), "accounts".to_string()]).unwrap();
        assert_eq!(all.len(), Table::all().len());

        let one = parse_tables(&["profiles".to_string()]).unwrap();
        assert_eq!(one, vec![Table::Profiles]);

        assert!(parse_tables(&["budgets".to_string()]).is_err());
    }
}
