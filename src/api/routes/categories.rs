//! Category Routes
//!
//! - GET /api/v1/categories?type= - System and user categories by name

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CategoryListResponse, CategoryParams};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::model::TransactionKind;

/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoryParams>,
) -> ApiResult<Json<CategoryListResponse>> {
    let kind = params
        .kind
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .map(str::parse::<TransactionKind>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let categories = state.workspace.categories_of(kind).await;

    Ok(Json(CategoryListResponse {
        total: categories.len(),
        categories,
    }))
}
