//! Credit Card Routes
//!
//! - GET /api/v1/cards - Card portfolio and accounts to pay from
//! - GET /api/v1/cards/:id - Card details
//! - POST /api/v1/cards/:id/pay - Validate a payment (no money moves)

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::dto::PayRequest;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::forms::PaymentIntent;
use crate::model::Account;
use crate::views::{CardDetails, CardsView};

/// GET /api/v1/cards
pub async fn list_cards(State(state): State<Arc<AppState>>) -> Json<CardsView> {
    Json(state.workspace.cards_view().await)
}

/// GET /api/v1/cards/:id
pub async fn get_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CardDetails>> {
    state
        .workspace
        .card_details(id)
        .await
        .map(Json)
        .ok_or_else(|| card_not_found(id))
}

/// POST /api/v1/cards/:id/pay
pub async fn pay_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PayRequest>,
) -> ApiResult<Json<PaymentIntent>> {
    let card = state
        .workspace
        .find_account(id)
        .await
        .filter(Account::is_credit)
        .ok_or_else(|| card_not_found(id))?;

    let mut form = state.workspace.pay_now_form(&card).await;
    form.select(req.from_account_id);
    if !req.amount.trim().is_empty() {
        form.set_amount(&req.amount);
    }

    Ok(Json(state.workspace.pay_card(&form)?))
}

fn card_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Credit card {} not found", id))
}
