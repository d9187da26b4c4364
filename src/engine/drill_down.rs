//! Drill-down projection
//!
//! Distribution of a root category across its direct sub-categories.
//! Transactions filed on the root itself, or deeper than one level, are not
//! part of the projection.

use crate::models::{CategoryId, Money, Transaction};

use super::category_tree::CategoryTree;
use super::rollup::{Rollup, Slice};

/// Projects a root's total onto its immediate children
pub struct DrillDownProjector;

impl DrillDownProjector {
    /// Sum transactions filed directly under a child of `root_id`, grouped by
    /// the child's name in first-seen order
    ///
    /// Empty when the root has no sub-categories.
    pub fn project(
        root_id: CategoryId,
        transactions: &[Transaction],
        tree: &CategoryTree,
    ) -> Vec<Slice> {
        if tree.children_of(root_id).next().is_none() {
            return Vec::new();
        }

        let mut slices = Vec::new();
        for txn in transactions {
            if let Some(child) = txn.category_id.and_then(|id| direct_child(tree, root_id, id)) {
                add_slice(&mut slices, child, txn.amount);
            }
        }

        tracing::debug!(root = %root_id.short(), slices = slices.len(), "drill-down projected");
        slices
    }

    /// Same projection from an existing rollup, without rescanning
    pub fn project_rollup(root_id: CategoryId, rollup: &Rollup, tree: &CategoryTree) -> Vec<Slice> {
        if tree.children_of(root_id).next().is_none() {
            return Vec::new();
        }

        let mut slices = Vec::new();
        for id in rollup.category_order() {
            if let Some(child) = direct_child(tree, root_id, *id) {
                add_slice(&mut slices, child, rollup.category_total(*id));
            }
        }
        slices
    }
}

fn direct_child(tree: &CategoryTree, root_id: CategoryId, id: CategoryId) -> Option<&str> {
    match tree.parent_of(id) {
        Some(parent) if parent.id == root_id => tree.get(id).map(|c| c.name.as_str()),
        _ => None,
    }
}

fn add_slice(slices: &mut Vec<Slice>, name: &str, amount: Money) {
    match slices.iter_mut().find(|s| s.name == name) {
        Some(slice) => slice.value += amount,
        None => slices.push(Slice {
            name: name.to_string(),
            value: amount,
        }),
    }
}
