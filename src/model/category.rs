//! Categories
//!
//! A category with no owning user is system-provided and visible to
//! everyone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dates;
use super::transaction::TransactionKind;

/// A category row as stored by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    /// `None` for system-provided categories
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(with = "dates::flexible_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Whether `user` may see this category
    pub fn visible_to(&self, user: Uuid) -> bool {
        self.is_system || self.user_id == Some(user)
    }
}

/// Insert payload for a category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDraft {
    pub user_id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub icon: String,
    pub color: String,
    pub is_system: bool,
}

impl CategoryDraft {
    /// A shared category visible to every user
    pub fn system(name: &str, kind: TransactionKind, icon: &str, color: &str) -> Self {
        Self {
            user_id: None,
            name: name.to_string(),
            kind,
            icon: icon.to_string(),
            color: color.to_string(),
            is_system: true,
        }
    }

    /// Default system categories
    pub fn defaults() -> Vec<CategoryDraft> {
        use TransactionKind::{Expense, Income};

        vec![
            Self::system("Salary", Income, "Briefcase", "#22c55e"),
            Self::system("Freelance", Income, "DollarSign", "#10b981"),
            Self::system("Investments", Income, "TrendingUp", "#14b8a6"),
            Self::system("Groceries", Expense, "ShoppingCart", "#f97316"),
            Self::system("Rent", Expense, "Home", "#ef4444"),
            Self::system("Utilities", Expense, "Zap", "#eab308"),
            Self::system("Entertainment", Expense, "Tv", "#8b5cf6"),
            Self::system("Transport", Expense, "Car", "#3b82f6"),
            Self::system("Shopping", Expense, "ShoppingBag", "#ec4899"),
            Self::system("Dining", Expense, "UtensilsCrossed", "#f43f5e"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        let me = Uuid::new_v4();
        let mut category = Category {
            id: Uuid::new_v4(),
            user_id: None,
            name: "Rent".to_string(),
            kind: TransactionKind::Expense,
            icon: "Home".to_string(),
            color: "#ef4444".to_string(),
            is_system: true,
            created_at: Utc::now(),
        };
        assert!(category.visible_to(me));

        category.is_system = false;
        category.user_id = Some(Uuid::new_v4());
        assert!(!category.visible_to(me));

        category.user_id = Some(me);
        assert!(category.visible_to(me));
    }

    #[test]
    fn test_defaults_cover_both_kinds() {
        let defaults = CategoryDraft::defaults();
        assert!(defaults.iter().any(|c| c.kind == TransactionKind::Income));
        assert!(defaults.iter().any(|c| c.kind == TransactionKind::Expense));
        assert!(defaults.iter().all(|c| c.is_system && c.user_id.is_none()));
    }
}
