//! Category model
//!
//! Categories form a user-owned forest: a root category carries no parent, a
//! sub-category points at its parent. Top-level totals are classified by the
//! kind of the root ancestor.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, UserId};

/// Direction of money flowing through a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
    Savings,
}

impl CategoryKind {
    pub fn all() -> &'static [Self] {
        &[Self::Income, Self::Expense, Self::Savings]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Savings => "savings",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A category as fetched from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    /// Owner of the category
    pub user_id: UserId,

    pub name: String,

    /// Income, expense or savings
    #[serde(rename = "type")]
    pub kind: CategoryKind,

    /// Parent category, `None` for a root category
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

impl Category {
    /// Create a new root category
    pub fn new(user_id: UserId, name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: CategoryId::new(),
            user_id,
            name: name.into(),
            kind,
            parent_id: None,
        }
    }

    /// Create a sub-category under `parent`, inheriting its kind
    pub fn child_of(parent: &Category, name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            user_id: parent.user_id,
            name: name.into(),
            kind: parent.kind,
            parent_id: Some(parent.id),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_inherits_owner_and_kind() {
        let user = UserId::new();
        let food = Category::new(user, "Food", CategoryKind::Expense);
        let groceries = Category::child_of(&food, "Groceries");

        assert!(food.is_root());
        assert!(!groceries.is_root());
        assert_eq!(groceries.parent_id, Some(food.id));
        assert_eq!(groceries.kind, CategoryKind::Expense);
        assert_eq!(groceries.user_id, user);
    }

    #[test]
    fn test_deserialize_store_record() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "user_id": "6fa459ea-ee8a-3ca4-894e-db77e160355e",
            "name": "Salary",
            "type": "income",
            "parent_id": null
        }"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.kind, CategoryKind::Income);
        assert!(category.is_root());
    }
}
