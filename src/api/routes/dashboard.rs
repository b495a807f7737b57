//! Dashboard Routes
//!
//! - GET /api/v1/dashboard - Totals, charts and recent transactions

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::views::DashboardView;

/// GET /api/v1/dashboard
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(state.workspace.dashboard().await)
}
