//! Structural anomalies found while aggregating
//!
//! None of these stop a computation. Totals always render; each anomaly says
//! how a record was reclassified so the caller can surface it.

use serde::Serialize;
use std::fmt;

use crate::models::{BudgetId, BudgetKey, CategoryId, TransactionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// A category names a parent that is not in the record set; it is
    /// treated as a root
    OrphanedParent {
        category_id: CategoryId,
        missing_parent: CategoryId,
    },

    /// A transaction names a category that is not in the record set; it is
    /// counted as an uncategorized expense
    OrphanedTransaction {
        transaction_id: TransactionId,
        missing_category: CategoryId,
    },

    /// The parent chain loops; the cycle is cut at `broken_at`, which
    /// becomes a root
    CycleDetected {
        members: Vec<CategoryId>,
        broken_at: CategoryId,
    },

    /// Two budget rows share a key; the later row wins
    DuplicateBudgetKey {
        key: BudgetKey,
        kept: BudgetId,
        discarded: BudgetId,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanedParent {
                category_id,
                missing_parent,
            } => write!(
                f,
                "category {} references missing parent {}; treated as root",
                category_id.short(),
                missing_parent.short()
            ),
            Self::OrphanedTransaction {
                transaction_id,
                missing_category,
            } => write!(
                f,
                "transaction {} references missing category {}; counted as uncategorized",
                transaction_id.short(),
                missing_category.short()
            ),
            Self::CycleDetected { members, broken_at } => write!(
                f,
                "category cycle of {} member(s) cut at {}",
                members.len(),
                broken_at.short()
            ),
            Self::DuplicateBudgetKey {
                key,
                kept,
                discarded,
            } => write!(
                f,
                "duplicate budget for {}: kept {}, ignored {}",
                key,
                kept.short(),
                discarded.short()
            ),
        }
    }
}
