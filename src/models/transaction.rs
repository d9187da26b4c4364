//! Transaction model
//!
//! Amounts are non-negative; the direction of a transaction is implied by the
//! kind of the category it is filed under.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, TransactionId, UserId};
use super::money::Money;

/// A recorded income, expense or savings movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub user_id: UserId,

    /// Amount (never negative)
    pub amount: Money,

    pub date: NaiveDate,

    #[serde(default)]
    pub note: String,

    /// Category reference; may point at a root or a sub-category, or at a
    /// category that has since been deleted
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new transaction filed under `category_id`
    pub fn new(
        user_id: UserId,
        category_id: Option<CategoryId>,
        date: NaiveDate,
        amount: Money,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            user_id,
            amount,
            date,
            note: String::new(),
            category_id,
        }
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if self.amount.is_negative() {
            return Err(TransactionValidationError::NegativeAmount(self.amount));
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.amount)?;
        if !self.note.is_empty() {
            write!(f, " ({})", self.note)?;
        }
        Ok(())
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NegativeAmount(Money),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeAmount(amount) => {
                write!(f, "Transaction amount cannot be negative: {}", amount)
            }
        }
    }
}

impl std::error::Error for TransactionValidationError {}
