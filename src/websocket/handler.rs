//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use uuid::Uuid;

use super::messages::{parse_tables, ClientMessage, ServerMessage};
use super::watch::TableWatch;
use crate::api::AppState;

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
/// It upgrades the HTTP connection to WebSocket and starts message handling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            None
        }
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let permit: OwnedSemaphorePermit = match Arc::clone(&state.ws_slots).try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            tracing::warn!(
                max_connections = state.config.max_connections,
                "Rejecting WebSocket connection: limit reached"
            );
            let error_msg = ServerMessage::Error {
                message: format!(
                    "Maximum connections ({}) reached",
                    state.config.max_connections
                ),
            };
            if let Some(msg) = encode(&error_msg) {
                let _ = sender.send(msg).await;
            }
            return;
        }
    };

    let connection_id = Uuid::new_v4().to_string();

    // Channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut watch = TableWatch::new(
        connection_id.clone(),
        Arc::clone(&state.backend),
        state.workspace.session().map(|s| s.user_id),
        tx.clone(),
    );

    let connected_msg = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    let sent = match encode(&connected_msg) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };
    if !sent {
        tracing::error!(connection_id = %connection_id, "Failed to send connected message");
        return;
    }
    tracing::info!(connection_id = %connection_id, "WebSocket connected");

    let conn_id_for_send = connection_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Some(frame) = encode(&msg) else {
                continue;
            };
            if sender.send(frame).await.is_err() {
                tracing::debug!(
                    connection_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let conn_id_for_recv = connection_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&mut watch, &tx, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    drop(permit);
    tracing::info!(connection_id = %connection_id, "WebSocket disconnected");
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    watch: &mut TableWatch,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    connection_id: &str,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    let response = handle_client_message(watch, client_msg).await;
                    let _ = tx.send(response);
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Keep the connection open
                    let _ = tx.send(ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    });
                }
            }
            true
        }
        Message::Binary(_) => {
            let _ = tx.send(ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            });
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Handle a parsed client message, producing the reply
async fn handle_client_message(watch: &mut TableWatch, message: ClientMessage) -> ServerMessage {
    match message {
        ClientMessage::Subscribe { tables } => {
            let tables = match parse_tables(&tables) {
                Ok(tables) => tables,
                Err(message) => return ServerMessage::Error { message },
            };
            match watch.subscribe(&tables).await {
                Ok(tables) => ServerMessage::Subscribed { tables },
                Err(e) => {
                    tracing::warn!(error = %e, "Subscribe error");
                    ServerMessage::Error {
                        message: e.to_string(),
                    }
                }
            }
        }
        ClientMessage::Unsubscribe { tables } => match parse_tables(&tables) {
            Ok(tables) => ServerMessage::Unsubscribed {
                tables: watch.unsubscribe(&tables),
            },
            Err(message) => ServerMessage::Error { message },
        },
        ClientMessage::Ping => ServerMessage::Pong,
    }
}
