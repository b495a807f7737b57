//! WebSocket Change Notifications
//!
//! Pushes table change notifications to connected clients so they know
//! when to refetch.
//!
//! ## Architecture
//!
//! - **TableWatch**: One backend subscription per watched table
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/api/v1/ws` and subscribe to tables:
//! `accounts`, `transactions`, `categories`, `profiles`, or `*` for all.
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8085/api/v1/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', tables: ['accounts']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'changed') refetch(msg.table);
//! };
//! ```

mod handler;
mod messages;
mod watch;

pub use handler::websocket_handler;
pub use messages::{parse_tables, ClientMessage, ServerMessage, ALL_TABLES};
pub use watch::TableWatch;
