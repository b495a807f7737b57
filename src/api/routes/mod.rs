//! API Routes
//!
//! Route handlers organized by page.

pub mod accounts;
pub mod cards;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod profile;
pub mod transactions;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::actions::PendingWrite;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::backend::BackendError;

/// Issue a gated write, or answer with its prompt when unconfirmed
pub(crate) async fn confirm_or_prompt(
    state: &AppState,
    pending: PendingWrite,
    confirmed: bool,
) -> ApiResult<Option<Value>> {
    if !confirmed {
        let confirmation = pending.confirmation().clone();
        pending.cancel();
        return Err(ApiError::ConfirmationRequired(confirmation));
    }

    Ok(state.workspace.confirm(pending).await?)
}

/// Decode the row returned by a confirmed update
pub(crate) fn updated_row<T: DeserializeOwned>(row: Option<Value>) -> ApiResult<T> {
    let row = row.ok_or_else(|| ApiError::Internal("Update returned no row".to_string()))?;
    Ok(serde_json::from_value(row).map_err(BackendError::from)?)
}
