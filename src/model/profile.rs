//! Profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dates;

/// A profile row; `id` is the user id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(with = "dates::flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "dates::flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Uppercased first letters of first and last name, `"U"` when both are blank
    pub fn initials(&self) -> String {
        let first = first_char(self.first_name.as_deref());
        let last = first_char(self.last_name.as_deref());
        let initials: String = first.into_iter().chain(last).collect::<String>().to_uppercase();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }

    /// First and last name joined, `"User"` when both are blank
    pub fn full_name(&self) -> String {
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            "User".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

fn first_char(s: Option<&str>) -> Option<char> {
    s.and_then(|s| s.trim().chars().next())
}

/// Partial update of the editable profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
