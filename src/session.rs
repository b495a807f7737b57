//! Signed-in user
//!
//! Authentication itself belongs to the hosted auth service; this client
//! only carries the resulting identity and access token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current user's identity and credentials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// User id (also the profile id)
    pub user_id: Uuid,
    /// Email, if known
    #[serde(default)]
    pub email: Option<String>,
    /// Bearer token issued by the auth service
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
            access_token: None,
        }
    }

    /// Builder: set email
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Builder: set access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}
