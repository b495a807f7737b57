//! Data Transfer Objects
//!
//! Request and response types for the API endpoints that are not
//! already covered by the form and view types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::input::lenient_string;
use crate::model::Category;

/// `?confirm=true` on edits and deletes
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub confirm: bool,
}

/// `?type=` on the category list
#[derive(Debug, Default, Deserialize)]
pub struct CategoryParams {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Body of `POST /cards/:id/pay`
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub from_account_id: Uuid,
    /// Blank means the full card balance
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: String,
}

/// Category list response
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
    pub total: usize,
}

/// Delete acknowledgement
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub status: String,
    pub id: Uuid,
}

impl DeletedResponse {
    pub fn new(id: Uuid) -> Self {
        Self {
            status: "deleted".to_string(),
            id,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded
    pub status: String,
    /// Backend status: ok or the raw error
    pub backend: String,
    /// Backend implementation name
    pub backend_kind: String,
    pub signed_in: bool,
    pub uptime_seconds: u64,
    pub ws_connections: usize,
    pub version: String,
}
