//! Finance Tracker Data Model
//!
//! Typed mirrors of the rows owned by the hosted backend:
//!
//! - **account**: Balance-holding entities (cash, bank, wallet, credit card)
//! - **category**: Labels applied to transactions, system-provided or user-defined
//! - **transaction**: Dated income or expense records
//! - **profile**: Per-user personal details
//!
//! This crate holds no authoritative copy of any of these. Rows are read
//! from the backend, cached, and thrown away wholesale on every change
//! notification.

pub mod account;
pub mod category;
pub mod profile;
pub mod transaction;

pub use account::{Account, AccountDraft, AccountType};
pub use category::{Category, CategoryDraft};
pub use profile::{Profile, ProfilePatch};
pub use transaction::{Transaction, TransactionDraft, TransactionKind};

use std::fmt;

/// Backend tables this client reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Accounts,
    Categories,
    Transactions,
    Profiles,
}

impl Table {
    /// All tables, in display order
    pub fn all() -> &'static [Table] {
        &[
            Table::Accounts,
            Table::Categories,
            Table::Transactions,
            Table::Profiles,
        ]
    }

    /// Table name as used in REST paths and change topics
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Accounts => "accounts",
            Table::Categories => "categories",
            Table::Transactions => "transactions",
            Table::Profiles => "profiles",
        }
    }

    /// Column holding the owning user id, if rows are user-scoped
    pub fn owner_column(&self) -> &'static str {
        match self {
            Table::Profiles => "id",
            _ => "user_id",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accounts" => Ok(Table::Accounts),
            "categories" => Ok(Table::Categories),
            "transactions" => Ok(Table::Transactions),
            "profiles" => Ok(Table::Profiles),
            other => Err(format!("unknown table: {}", other)),
        }
    }
}

/// Lenient (de)serializers for date columns.
///
/// Date columns arrive either as `YYYY-MM-DD` or as full RFC 3339
/// timestamps depending on the column type on the backend.
pub(crate) mod dates {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse_date(s: &str) -> Option<NaiveDate> {
        let head = s.split('T').next().unwrap_or(s);
        NaiveDate::parse_from_str(head.trim(), "%Y-%m-%d").ok()
    }

    pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        parse_date(s)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub mod optional_date {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => parse_date(s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
            }
        }
    }

    pub mod flexible_datetime {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &DateTime<Utc>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&value.to_rfc3339())
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<DateTime<Utc>, D::Error> {
            let raw = String::deserialize(deserializer)?;
            parse_datetime(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
        }
    }
}
