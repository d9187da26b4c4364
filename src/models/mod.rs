//! Core data models for Sikai
//!
//! Flat records as the store hands them over: categories, transactions and
//! monthly budgets, plus the money and month types they are built from.

pub mod budget;
pub mod category;
pub mod ids;
pub mod money;
pub mod period;
pub mod transaction;

pub use budget::{Budget, BudgetKey, BudgetPeriodKind, BudgetValidationError};
pub use category::{Category, CategoryKind};
pub use ids::{BudgetId, CategoryId, TransactionId, UserId};
pub use money::{Money, MoneyParseError};
pub use period::{MonthKey, PeriodParseError};
pub use transaction::{Transaction, TransactionValidationError};
