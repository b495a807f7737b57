//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::actions::{ActionError, Confirmation};
use crate::backend::BackendError;
use crate::forms::FormError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Form validation failed; nothing was written
    #[error("{0}")]
    Validation(#[from] FormError),

    /// Malformed request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Edit or delete submitted without `?confirm=true`
    #[error("{}", .0.description)]
    ConfirmationRequired(Confirmation),

    /// Backend call failed; carries the raw message
    #[error("{0}")]
    Backend(BackendError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Backend(other),
        }
    }
}

impl From<ActionError> for ApiError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Invalid(e) => ApiError::Validation(e),
            ActionError::Backend(e) => e.into(),
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    /// Notice title, for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    /// Prompt to show before retrying with `?confirm=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::ConfirmationRequired(_) => {
                (StatusCode::PRECONDITION_REQUIRED, "CONFIRMATION_REQUIRED")
            }
            ApiError::Backend(BackendError::Unavailable) => {
                (StatusCode::BAD_GATEWAY, "BACKEND_UNAVAILABLE")
            }
            ApiError::Backend(BackendError::Timeout) => {
                (StatusCode::GATEWAY_TIMEOUT, "BACKEND_TIMEOUT")
            }
            ApiError::Backend(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let (title, confirmation) = match &self {
            ApiError::Validation(e) => (Some(e.title().to_string()), None),
            ApiError::ConfirmationRequired(c) => (Some(c.title.clone()), Some(c.clone())),
            _ => (None, None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                title,
                message: self.to_string(),
                confirmation,
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let validation = ApiError::from(FormError::required_fields());
        assert_eq!(validation.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_string(), "Please fill in all required fields");

        let missing = ApiError::from(BackendError::NotFound("accounts row".to_string()));
        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);

        let upstream = ApiError::from(BackendError::Api {
            status: 400,
            message: "duplicate key".to_string(),
        });
        assert_eq!(upstream.status_and_code().0, StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.to_string(), "duplicate key");

        let confirm = ApiError::ConfirmationRequired(Confirmation {
            title: "Delete account?".to_string(),
            description: "This cannot be undone.".to_string(),
        });
        assert_eq!(confirm.status_and_code().0, StatusCode::PRECONDITION_REQUIRED);
    }
}
