//! Rollup aggregation
//!
//! One pass over the transactions produces totals by kind, by root category
//! and by exact category. Kind always comes from the root ancestor, so a
//! sub-category can never land outside its root's bucket.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{CategoryId, CategoryKind, Money, Transaction};

use super::anomaly::Anomaly;
use super::category_tree::CategoryTree;

/// Totals per category kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeTotals {
    pub income: Money,
    pub expense: Money,
    pub savings: Money,
}

impl TypeTotals {
    pub fn get(&self, kind: CategoryKind) -> Money {
        match kind {
            CategoryKind::Income => self.income,
            CategoryKind::Expense => self.expense,
            CategoryKind::Savings => self.savings,
        }
    }

    fn add(&mut self, kind: CategoryKind, amount: Money) {
        match kind {
            CategoryKind::Income => self.income += amount,
            CategoryKind::Expense => self.expense += amount,
            CategoryKind::Savings => self.savings += amount,
        }
    }

    /// Sum of every transaction regardless of kind
    pub fn total(&self) -> Money {
        self.income + self.expense + self.savings
    }

    /// Spendable balance; savings is a deduction distinct from expense
    pub fn balance(&self) -> Money {
        self.income - self.expense - self.savings
    }

    /// Share of `kind` against income plus expense, in percent, capped at 100
    pub fn share_percent(&self, kind: CategoryKind) -> f64 {
        self.get(kind)
            .percent_of(self.income + self.expense)
            .map(|p| p.min(100.0))
            .unwrap_or(0.0)
    }
}

/// One labelled value of a chart series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub name: String,
    pub value: Money,
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rollup {
    pub totals_by_type: TypeTotals,

    /// Sum per root category across all descendants
    pub totals_by_root: HashMap<CategoryId, Money>,

    /// Sum per exact category id; budgets reconcile against this
    pub totals_by_category: HashMap<CategoryId, Money>,

    /// Transactions whose category is missing, counted as expense
    pub uncategorized: Money,
    pub uncategorized_count: usize,

    pub transaction_count: usize,

    root_order: Vec<CategoryId>,
    category_order: Vec<CategoryId>,
    anomalies: Vec<Anomaly>,
}

fn accumulate(
    totals: &mut HashMap<CategoryId, Money>,
    order: &mut Vec<CategoryId>,
    id: CategoryId,
    amount: Money,
) {
    let entry = totals.entry(id).or_insert_with(|| {
        order.push(id);
        Money::zero()
    });
    *entry += amount;
}

/// Sums transaction amounts against a category tree
pub struct RollupAggregator;

impl RollupAggregator {
    /// Expects amounts already checked by [`crate::engine::Snapshot::validate`],
    /// which guarantees every total here fits in `Money`
    pub fn aggregate(transactions: &[Transaction], tree: &CategoryTree) -> Rollup {
        let mut rollup = Rollup::default();
        for txn in transactions {
            rollup.record(txn, tree);
        }

        tracing::debug!(
            transactions = rollup.transaction_count,
            roots = rollup.root_order.len(),
            uncategorized = rollup.uncategorized_count,
            "rollup aggregated"
        );
        rollup
    }
}

impl Rollup {
    fn record(&mut self, txn: &Transaction, tree: &CategoryTree) {
        self.transaction_count += 1;

        let category = txn.category_id.and_then(|id| tree.get(id));
        let root = category.and_then(|c| tree.root_of(c.id));

        match (category, root) {
            (Some(category), Some(root)) => {
                self.totals_by_type.add(root.kind, txn.amount);
                accumulate(
                    &mut self.totals_by_root,
                    &mut self.root_order,
                    root.id,
                    txn.amount,
                );
                accumulate(
                    &mut self.totals_by_category,
                    &mut self.category_order,
                    category.id,
                    txn.amount,
                );
            }
            _ => {
                if let Some(missing) = txn.category_id {
                    let anomaly = Anomaly::OrphanedTransaction {
                        transaction_id: txn.id,
                        missing_category: missing,
                    };
                    tracing::warn!(%anomaly, "transaction reclassified");
                    self.anomalies.push(anomaly);
                }
                self.totals_by_type.expense += txn.amount;
                self.uncategorized += txn.amount;
                self.uncategorized_count += 1;
            }
        }
    }

    /// Combine two rollups computed over disjoint transaction sets
    pub fn merge(mut self, other: Rollup) -> Rollup {
        self.totals_by_type.income += other.totals_by_type.income;
        self.totals_by_type.expense += other.totals_by_type.expense;
        self.totals_by_type.savings += other.totals_by_type.savings;

        for id in &other.root_order {
            let amount = other.totals_by_root.get(id).copied().unwrap_or_default();
            accumulate(&mut self.totals_by_root, &mut self.root_order, *id, amount);
        }
        for id in &other.category_order {
            let amount = other
                .totals_by_category
                .get(id)
                .copied()
                .unwrap_or_default();
            accumulate(
                &mut self.totals_by_category,
                &mut self.category_order,
                *id,
                amount,
            );
        }

        self.uncategorized += other.uncategorized;
        self.uncategorized_count += other.uncategorized_count;
        self.transaction_count += other.transaction_count;
        self.anomalies.extend(other.anomalies);
        self
    }

    pub fn balance(&self) -> Money {
        self.totals_by_type.balance()
    }

    pub fn root_total(&self, id: CategoryId) -> Money {
        self.totals_by_root.get(&id).copied().unwrap_or_default()
    }

    pub fn category_total(&self, id: CategoryId) -> Money {
        self.totals_by_category.get(&id).copied().unwrap_or_default()
    }

    /// Root categories in the order their first transaction was seen
    pub fn root_order(&self) -> &[CategoryId] {
        &self.root_order
    }

    /// Exact categories in the order their first transaction was seen
    pub fn category_order(&self) -> &[CategoryId] {
        &self.category_order
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Top-level chart series for one kind: one slice per root category,
    /// plus the uncategorized bucket for expenses
    pub fn pie_slices(
        &self,
        tree: &CategoryTree,
        kind: CategoryKind,
        uncategorized_label: &str,
    ) -> Vec<Slice> {
        let mut slices: Vec<Slice> = self
            .root_order
            .iter()
            .filter_map(|id| tree.get(*id))
            .filter(|root| root.kind == kind)
            .map(|root| Slice {
                name: root.name.clone(),
                value: self.root_total(root.id),
            })
            .collect();

        if kind == CategoryKind::Expense && !self.uncategorized.is_zero() {
            slices.push(Slice {
                name: uncategorized_label.to_string(),
                value: self.uncategorized,
            });
        }
        slices
    }
}
