//! Budget model
//!
//! A budget is a monthly target for one category. The store is expected to
//! hold at most one row per `(user, category, year, month)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, CategoryId, UserId};
use super::money::Money;
use super::period::MonthKey;

/// Budget cadence; only monthly budgets exist today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriodKind {
    #[default]
    Monthly,
}

/// Identity of a budget row for a single user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetKey {
    pub category_id: CategoryId,
    pub month: MonthKey,
}

impl fmt::Display for BudgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.category_id.short(), self.month)
    }
}

/// A monthly budget target for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,

    pub user_id: UserId,

    /// Normally a root category
    pub category_id: CategoryId,

    pub year: i32,

    /// Month number, 1-12
    pub month: u32,

    /// Target amount
    pub amount: Money,

    #[serde(default)]
    pub period: BudgetPeriodKind,
}

impl Budget {
    /// Create a new monthly budget
    pub fn new(user_id: UserId, category_id: CategoryId, month: MonthKey, amount: Money) -> Self {
        Self {
            id: BudgetId::new(),
            user_id,
            category_id,
            year: month.year,
            month: month.month,
            amount,
            period: BudgetPeriodKind::Monthly,
        }
    }

    /// The month this budget applies to
    pub fn month_key(&self) -> Result<MonthKey, BudgetValidationError> {
        MonthKey::new(self.year, self.month)
            .map_err(|_| BudgetValidationError::InvalidMonth(self.month))
    }

    pub fn key(&self) -> Result<BudgetKey, BudgetValidationError> {
        Ok(BudgetKey {
            category_id: self.category_id,
            month: self.month_key()?,
        })
    }

    pub fn is_for(&self, month: MonthKey) -> bool {
        self.year == month.year && self.month == month.month
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        self.month_key()?;
        if self.amount.is_negative() {
            return Err(BudgetValidationError::NegativeBudget);
        }
        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02} budgeted: {}", self.year, self.month, self.amount)
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NegativeBudget,
    InvalidMonth(u32),
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeBudget => write!(f, "Budget amount cannot be negative"),
            Self::InvalidMonth(m) => write!(f, "Budget month must be between 1 and 12, got {}", m),
        }
    }
}

impl std::error::Error for BudgetValidationError {}
