//! Budget editing
//!
//! A month's budgets are edited as a draft on top of the last-loaded values.
//! Only entries that differ from the baseline are written back, each as an
//! update of the existing row or an insert of a new one.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{
    Budget, BudgetId, BudgetKey, BudgetValidationError, CategoryId, Money, MonthKey, UserId,
};

use super::reconcile::index_month;

/// How a budget value reaches storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BudgetWrite {
    /// A row already exists for the key; overwrite its amount
    Update { id: BudgetId, amount: Money },
    /// No row yet for the key
    Insert(Budget),
}

impl BudgetWrite {
    pub fn amount(&self) -> Money {
        match self {
            Self::Update { amount, .. } => *amount,
            Self::Insert(budget) => budget.amount,
        }
    }
}

/// Decide between update and insert for `key`
///
/// The most recently loaded row matching `(user, category, year, month)`
/// is the one updated, so repeated saves never create duplicates.
pub fn plan_upsert(
    existing: &[Budget],
    user_id: UserId,
    key: BudgetKey,
    amount: Money,
) -> BudgetWrite {
    let current = existing
        .iter()
        .rev()
        .find(|b| b.user_id == user_id && b.category_id == key.category_id && b.is_for(key.month));

    match current {
        Some(row) => BudgetWrite::Update { id: row.id, amount },
        None => BudgetWrite::Insert(Budget::new(user_id, key.category_id, key.month, amount)),
    }
}

/// A pending edit for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetChange {
    pub category_id: CategoryId,
    pub amount: Money,
    /// Value at the last load or save, if a row existed
    pub previous: Option<Money>,
}

/// Draft of one month's budget values with dirty tracking
#[derive(Debug, Clone)]
pub struct BudgetEditor {
    month: MonthKey,
    baseline: HashMap<CategoryId, Money>,
    draft: HashMap<CategoryId, Money>,
    edit_order: Vec<CategoryId>,
}

impl BudgetEditor {
    /// Load the month's values from stored budgets; later rows win
    pub fn load(month: MonthKey, budgets: &[Budget]) -> Self {
        let (index, _, _) = index_month(budgets, month);
        Self {
            month,
            baseline: index.into_iter().map(|(id, b)| (id, b.amount)).collect(),
            draft: HashMap::new(),
            edit_order: Vec::new(),
        }
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    /// Current value for a category, zero when none is set
    pub fn value(&self, category_id: CategoryId) -> Money {
        self.draft
            .get(&category_id)
            .or_else(|| self.baseline.get(&category_id))
            .copied()
            .unwrap_or_default()
    }

    /// Set a category's value; last write wins
    pub fn set(
        &mut self,
        category_id: CategoryId,
        amount: Money,
    ) -> Result<(), BudgetValidationError> {
        if amount.is_negative() {
            return Err(BudgetValidationError::NegativeBudget);
        }
        if self.draft.insert(category_id, amount).is_none() {
            self.edit_order.push(category_id);
        }
        Ok(())
    }

    /// Edits that differ from the baseline, in the order first edited
    ///
    /// A category with no stored row counts as zero, so setting it to zero
    /// is not a change.
    pub fn pending_changes(&self) -> Vec<BudgetChange> {
        self.edit_order
            .iter()
            .filter_map(|id| {
                let amount = *self.draft.get(id)?;
                let previous = self.baseline.get(id).copied();
                if amount == previous.unwrap_or_default() {
                    return None;
                }
                Some(BudgetChange {
                    category_id: *id,
                    amount,
                    previous,
                })
            })
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending_changes().is_empty()
    }

    /// Rebase the baseline onto the draft after a successful save
    pub fn mark_saved(&mut self) {
        for (id, amount) in self.draft.drain() {
            self.baseline.insert(id, amount);
        }
        self.edit_order.clear();
    }

    /// Drop all unsaved edits
    pub fn discard(&mut self) {
        self.draft.clear();
        self.edit_order.clear();
    }
}
