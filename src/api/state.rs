//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::backend::Backend;
use crate::config::ApiConfig;
use crate::views::Workspace;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Live collections and actions for the configured session
    pub workspace: Arc<Workspace>,
    /// Backend the workspace reads from, used directly by WebSocket clients
    pub backend: Arc<dyn Backend>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// One permit per open WebSocket connection
    pub ws_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(workspace: Workspace, backend: Arc<dyn Backend>, config: ApiConfig) -> Self {
        Self {
            workspace: Arc::new(workspace),
            backend,
            ws_slots: Arc::new(Semaphore::new(config.max_connections)),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub fn ws_connection_count(&self) -> usize {
        self.config
            .max_connections
            .saturating_sub(self.ws_slots.available_permits())
    }
}
