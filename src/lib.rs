//! # Finance Tracker
//!
//! Personal finance tracking over a hosted backend: accounts, credit
//! cards, categorized income and expense transactions, and the analytics
//! derived from them.
//!
//! ## Features
//!
//! - **Live collections**: Reads that refetch whenever the backend reports a change
//! - **Validated forms**: Nothing reaches the backend without passing validation
//! - **Confirmation-gated writes**: Edits and deletes wait for an explicit confirm
//! - **Analytics**: Totals, spending by category, monthly trends, card utilization
//! - **API**: REST and WebSocket surface for one signed-in session
//!
//! ## Modules
//!
//! - [`backend`]: Backend seam, REST client and in-process store
//! - [`live`]: Self-refreshing collections
//! - [`forms`]: Raw input and validation
//! - [`actions`]: Writes and their notices
//! - [`analytics`]: Pure reductions over loaded rows
//! - [`views`]: Page models and the [`Workspace`]
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use finance_tracker::backend::MemoryBackend;
//! use finance_tracker::notify::TracingNotifier;
//! use finance_tracker::{Session, Workspace};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::new(Uuid::new_v4());
//!     let store = MemoryBackend::seeded().await;
//!
//!     let workspace = Workspace::mount(
//!         Arc::new(store.as_user(session.user_id)),
//!         Some(session),
//!         Arc::new(TracingNotifier),
//!         "PHP",
//!     )
//!     .await;
//!
//!     let dashboard = workspace.dashboard().await;
//!     println!("Total balance: {}", dashboard.balance_display);
//! }
//! ```

pub mod actions;
pub mod analytics;
pub mod api;
pub mod backend;
pub mod config;
pub mod forms;
pub mod live;
pub mod model;
pub mod notify;
pub mod session;
pub mod views;
pub mod websocket;

// Re-export top-level types for convenience
pub use model::{
    Account, AccountType, Category, Profile, Table, Transaction, TransactionKind,
};

pub use session::Session;

pub use backend::{
    Backend, BackendError, BackendResult, ChangeEvent, ChangeHub, ChangeKind, MemoryBackend,
    Query, RestBackend, RestConfig,
};

pub use live::{LiveCollection, LiveProfile, Snapshot};

pub use forms::{AccountForm, FormError, PayNowForm, PaymentIntent, ProfileForm, TransactionForm};

pub use actions::{ActionError, ActionResult, Actions, Confirmation, PendingWrite, Submitted};

pub use notify::{Notice, Notifier, TracingNotifier};

pub use views::{TransactionFilter, TypeTab, Workspace};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{websocket_handler, ClientMessage, ServerMessage};

pub use config::{BackendKind, Config, ConfigError};
