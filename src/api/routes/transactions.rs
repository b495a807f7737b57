//! Transaction Routes
//!
//! - GET /api/v1/transactions?type=&search= - Filtered list with totals
//! - POST /api/v1/transactions - Add a transaction
//! - GET /api/v1/transactions/:id - Get one transaction
//! - PUT /api/v1/transactions/:id?confirm=true - Edit a transaction
//! - DELETE /api/v1/transactions/:id?confirm=true - Delete a transaction

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
use crate::forms::TransactionForm;
use crate::model::Transaction;
use crate::views::{TransactionFilter, TransactionsView};

/// GET /api/v1/transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TransactionFilter>,
) -> Json<TransactionsView> {
    Json(state.workspace.transactions_view(&filter).await)
}

/// GET /api/v1/transactions/:id
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(find(&state, id).await?))
}

/// POST /api/v1/transactions
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(form): Json<TransactionForm>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    match state.workspace.save_transaction(&form).await? {
        Submitted::Done(transaction) => Ok((StatusCode::CREATED, Json(transaction))),
        Submitted::NeedsConfirmation(pending) => {
            pending.cancel();
            Err(ApiError::Internal(
                "New transaction was treated as an edit".to_string(),
            ))
        }
    }
}

/// PUT /api/v1/transactions/:id
///
/// The type of an existing transaction is kept; `type` in the body is ignored.
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
    Json(form): Json<TransactionForm>,
) -> ApiResult<Json<Transaction>> {
    let existing = find(&state, id).await?;
    let form = form.editing_transaction(&existing);

    match state.workspace.save_transaction(&form).await? {
        Submitted::NeedsConfirmation(pending) => {
            let row = confirm_or_prompt(&state, pending, params.confirm).await?;
            tracing::info!(transaction_id = %id, "Transaction updated via API");
            Ok(Json(updated_row(row)?))
        }
        Submitted::Done(transaction) => Ok(Json(transaction)),
    }
}

/// DELETE /api/v1/transactions/:id
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmParams>,
) -> ApiResult<Json<DeletedResponse>> {
    let existing = find(&state, id).await?;
    let pending = state.workspace.delete_transaction(&existing);

    confirm_or_prompt(&state, pending, params.confirm).await?;
    tracing::info!(transaction_id = %id, "Transaction deleted via API");
    Ok(Json(DeletedResponse::new(id)))
}

async fn find(state: &AppState, id: Uuid) -> ApiResult<Transaction> {
    state
        .workspace
        .find_transaction(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Transaction {} not found", id)))
}
