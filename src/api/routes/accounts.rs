//! Account Routes
//!
//! - GET /api/v1/accounts - Active accounts grouped by type
//! - POST /api/v1/accounts - Add an account
//! - GET /api/v1/accounts/:id - Get one account
//! - PUT /api/v1/accounts/:id?confirm=true - Edit an account
//! - DELETE /api/v1/accounts/:id?confirm=true - Delete an account

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{confirm_or_prompt, updated_row};
use crate::actions::Submitted;
use crate::api::dto::{ConfirmParams, DeletedResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::forms::AccountForm;
use crate::model::Account;
use crate::views::AccountsView;

/// GET /api/v1/accounts
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> Json<AccountsView> {
    Json(state.workspace.accounts_view().await)
}

/// GET /api/v1/accounts/:id
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Account>> {
    Ok(Json(find(&state, id).await?))
}

/// POST /api/v1/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(form): Json<AccountForm>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    match state.workspace.save_account(&form).await? {
        Submitted::Done(account) => Ok((StatusCode::CREATED, Json(account))),
        Submitted::NeedsConfirmation(pending) => {
            pending.cancel();
            Err(ApiError::Internal("New account was treated as an edit".to_string()))
        }
    }
}

/// PUT /api/v1/accounts/:id
///
/// Validates first; without `?confirm=true` answers 428 with the prompt.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
    Json(form): Json<AccountForm>,
) -> ApiResult<Json<Account>> {
    let existing = find(&state, id).await?;
    let form = form.editing_account(&existing);

    match state.workspace.save_account(&form).await? {
        Submitted::NeedsConfirmation(pending) => {
            let row = confirm_or_prompt(&state, pending, params.confirm).await?;
            tracing::info!(account_id = %id, "Account updated via API");
            Ok(Json(updated_row(row)?))
        }
        Submitted::Done(account) => Ok(Json(account)),
    }
}

/// DELETE /api/v1/accounts/:id
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> ApiResult<Json<DeletedResponse>> {
    let existing = find(&state, id).await?;
    let pending = state.workspace.delete_account(&existing);

    confirm_or_prompt(&state, pending, params.confirm).await?;
    tracing::info!(account_id = %id, "Account deleted via API");
    Ok(Json(DeletedResponse::new(id)))
}

async fn find(state: &AppState, id: Uuid) -> ApiResult<Account> {
    state
        .workspace
        .find_account(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Account {} not found", id)))
}
