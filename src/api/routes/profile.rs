//! Profile Routes
//!
//! - GET /api/v1/profile - Profile and account statistics
//! - PUT /api/v1/profile - Update name, phone and address

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::forms::ProfileForm;
use crate::model::Profile;
use crate::views::ProfileView;

/// GET /api/v1/profile
pub async fn get_profile(State(state): State<Arc<AppState>>) -> Json<ProfileView> {
    Json(state.workspace.profile_view().await)
}

/// PUT /api/v1/profile
///
/// Applied directly, without a confirmation step.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ProfileForm>,
) -> ApiResult<Json<Profile>> {
    Ok(Json(state.workspace.update_profile(&form).await?))
}
