//! Add/edit transaction form

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::input::{lenient_string, parse_amount, sanitize_number_input};
use super::{non_blank, FormError, FormResult};
use crate::model::{Transaction, TransactionDraft, TransactionKind};
use crate::session::Session;

/// Raw transaction input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionForm {
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub description: String,
    /// Requested type for a new transaction
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionKind>,
    #[serde(skip)]
    pub(crate) editing: Option<Transaction>,
}

impl TransactionForm {
    /// Empty form for a new transaction of the given type
    pub fn new(kind: Option<TransactionKind>) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// A form pre-filled from an existing transaction
    pub fn edit(transaction: &Transaction) -> Self {
        Self {
            amount: sanitize_number_input(&transaction.amount.to_string()),
            category_id: transaction.category_id.to_string(),
            account_id: transaction.account_id.to_string(),
            description: transaction.description.clone().unwrap_or_default(),
            kind: None,
            editing: Some(transaction.clone()),
        }
    }

    /// Attach the transaction being edited to a form built from raw input
    pub fn editing_transaction(mut self, transaction: &Transaction) -> Self {
        self.editing = Some(transaction.clone());
        self
    }

    pub fn editing(&self) -> Option<&Transaction> {
        self.editing.as_ref()
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    /// Effective type: the edited record's, else the requested one, else expense
    pub fn kind(&self) -> TransactionKind {
        self.editing
            .as_ref()
            .map(|t| t.kind)
            .or(self.kind)
            .unwrap_or_default()
    }

    /// Check the input and build the payload to write
    pub fn validate(&self, session: Option<&Session>) -> FormResult<TransactionDraft> {
        let amount = non_blank(&self.amount);
        let category = non_blank(&self.category_id);
        let account = non_blank(&self.account_id);

        let (Some(amount), Some(category), Some(account), Some(session)) =
            (amount, category, account, session)
        else {
            return Err(FormError::required_fields());
        };

        let amount = parse_amount(amount).ok_or_else(|| {
            FormError::InvalidAmount("Please enter a valid number for the amount.".to_string())
        })?;
        let category_id = parse_reference(category, "category")?;
        let account_id = parse_reference(account, "account")?;

        Ok(TransactionDraft {
            user_id: session.user_id,
            account_id,
            category_id,
            kind: self.kind(),
            amount,
            description: non_blank(&self.description).map(str::to_string),
            date: self.editing.as_ref().map_or_else(Utc::now, |t| t.date),
        })
    }
}

fn parse_reference(raw: &str, what: &str) -> FormResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| FormError::InvalidSelection(format!("Unknown {}: {}", what, raw)))
}
