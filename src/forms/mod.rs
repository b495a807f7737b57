//! Form Validation
//!
//! Every write passes through a form first. Forms hold raw user input as
//! strings, and `validate` either produces a backend payload or a
//! [`FormError`] that maps to a destructive notice. A form that fails
//! validation never reaches the backend.

pub mod account;
pub mod input;
pub mod payment;
pub mod profile;
pub mod transaction;

pub use account::AccountForm;
pub use input::{format_number_input, parse_amount, sanitize_number_input};
pub use payment::{PayNowForm, PaymentIntent};
pub use profile::ProfileForm;
pub use transaction::TransactionForm;

use thiserror::Error;

use crate::notify::Notice;

/// Reasons a form cannot be submitted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0}")]
    MissingInformation(String),

    #[error("{0}")]
    InvalidAmount(String),

    #[error("{0}")]
    InvalidDate(String),

    #[error("{0}")]
    InvalidSelection(String),
}

impl FormError {
    pub(crate) fn required_fields() -> Self {
        FormError::MissingInformation("Please fill in all required fields".to_string())
    }

    /// Notice title for this error
    pub fn title(&self) -> &'static str {
        match self {
            FormError::MissingInformation(_) => "Missing Information",
            FormError::InvalidAmount(_) => "Invalid Amount",
            FormError::InvalidDate(_) => "Invalid Date",
            FormError::InvalidSelection(_) => "Invalid Selection",
        }
    }

    pub fn notice(&self) -> Notice {
        Notice::error(self.title(), self.to_string())
    }
}

impl From<FormError> for Notice {
    fn from(err: FormError) -> Self {
        err.notice()
    }
}

/// Result type alias for form validation
pub type FormResult<T> = Result<T, FormError>;

/// Treat blank input as absent
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
