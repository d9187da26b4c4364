//! Budget reconciliation
//!
//! Joins a month's budget rows against exact-category actuals. Budgets are
//! never rolled up from children: a budget on a root only sees transactions
//! filed directly on that root.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{Budget, BudgetId, Category, CategoryId, CategoryKind, Money, MonthKey};

use super::anomaly::Anomaly;

/// Percentage of the budget consumed, capped at 100
///
/// With no budget, any spend counts as fully consumed.
pub fn percent_used(budget: Money, actual: Money) -> f64 {
    if budget.is_positive() {
        actual
            .percent_of(budget)
            .map(|p| p.clamp(0.0, 100.0))
            .unwrap_or(0.0)
    } else if actual.is_positive() {
        100.0
    } else {
        0.0
    }
}

/// Over the budget, or spending with no budget at all
pub fn is_over_limit(budget: Money, actual: Money) -> bool {
    if budget.is_positive() {
        actual > budget
    } else {
        actual.is_positive()
    }
}

/// Budget versus actual for one category in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    pub category_id: CategoryId,

    /// Category name and kind, when the category is known
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,

    /// Row this line was reconciled against, if any
    pub budget_id: Option<BudgetId>,

    pub budget: Money,
    pub actual: Money,

    /// `budget - actual`; negative once over budget
    pub variance: Money,

    pub percent: f64,
    pub over_limit: bool,
}

impl BudgetLine {
    fn new(
        category_id: CategoryId,
        category: Option<&Category>,
        budget_row: Option<&Budget>,
        actual: Money,
    ) -> Self {
        let budget = budget_row.map(|b| b.amount).unwrap_or_default();
        Self {
            category_id,
            name: category.map(|c| c.name.clone()),
            kind: category.map(|c| c.kind),
            budget_id: budget_row.map(|b| b.id),
            budget,
            actual,
            variance: budget - actual,
            percent: percent_used(budget, actual),
            over_limit: is_over_limit(budget, actual),
        }
    }

    /// Spending recorded against a category with no budget set
    pub fn is_unbudgeted(&self) -> bool {
        self.budget.is_zero() && self.actual.is_positive()
    }
}

/// Reconciliation of one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub month: MonthKey,
    lines: Vec<BudgetLine>,
    anomalies: Vec<Anomaly>,
}

impl Reconciliation {
    pub fn lines(&self) -> &[BudgetLine] {
        &self.lines
    }

    pub fn get(&self, category_id: CategoryId) -> Option<&BudgetLine> {
        self.lines.iter().find(|l| l.category_id == category_id)
    }

    pub fn over_limit(&self) -> impl Iterator<Item = &BudgetLine> + '_ {
        self.lines.iter().filter(|l| l.over_limit)
    }

    /// Lines for categories of one kind
    pub fn lines_of_kind(&self, kind: CategoryKind) -> impl Iterator<Item = &BudgetLine> + '_ {
        self.lines.iter().filter(move |l| l.kind == Some(kind))
    }

    pub fn total_budget(&self) -> Money {
        self.lines.iter().map(|l| l.budget).sum()
    }

    pub fn total_actual(&self) -> Money {
        self.lines.iter().map(|l| l.actual).sum()
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }
}

/// One budget row per category for a month, later rows winning
pub(crate) fn index_month<'a>(
    budgets: &'a [Budget],
    month: MonthKey,
) -> (HashMap<CategoryId, &'a Budget>, Vec<CategoryId>, Vec<Anomaly>) {
    let mut index: HashMap<CategoryId, &Budget> = HashMap::new();
    let mut order = Vec::new();
    let mut anomalies = Vec::new();

    for budget in budgets.iter().filter(|b| b.is_for(month)) {
        match index.insert(budget.category_id, budget) {
            None => order.push(budget.category_id),
            Some(previous) => anomalies.push(Anomaly::DuplicateBudgetKey {
                key: crate::models::BudgetKey {
                    category_id: budget.category_id,
                    month,
                },
                kept: budget.id,
                discarded: previous.id,
            }),
        }
    }

    (index, order, anomalies)
}

/// Matches budget targets against actual spend
pub struct BudgetReconciler;

impl BudgetReconciler {
    /// Reconcile `month`'s budgets against exact-category actuals
    ///
    /// Lines follow `categories` order, then budgets or actuals whose
    /// category is unknown. Identical inputs give identical output.
    pub fn reconcile(
        budgets: &[Budget],
        actuals: &HashMap<CategoryId, Money>,
        categories: &[Category],
        month: MonthKey,
    ) -> Reconciliation {
        let (by_category, budget_order, anomalies) = index_month(budgets, month);
        for anomaly in &anomalies {
            tracing::warn!(%anomaly, "budget row ignored");
        }

        let mut lines = Vec::new();
        let mut seen: HashSet<CategoryId> = HashSet::new();

        let mut push = |id: CategoryId, category: Option<&Category>, lines: &mut Vec<BudgetLine>| {
            if !seen.insert(id) {
                return;
            }
            let budget_row = by_category.get(&id).copied();
            let actual = actuals.get(&id).copied();
            if budget_row.is_none() && actual.is_none() {
                return;
            }
            lines.push(BudgetLine::new(
                id,
                category,
                budget_row,
                actual.unwrap_or_default(),
            ));
        };

        for category in categories {
            push(category.id, Some(category), &mut lines);
        }
        for id in &budget_order {
            push(*id, None, &mut lines);
        }
        let mut unknown_actuals: Vec<CategoryId> = actuals.keys().copied().collect();
        unknown_actuals.sort_by_key(|id| *id.as_uuid());
        for id in unknown_actuals {
            push(id, None, &mut lines);
        }

        tracing::debug!(
            %month,
            lines = lines.len(),
            over_limit = lines.iter().filter(|l| l.over_limit).count(),
            "budgets reconciled"
        );

        Reconciliation {
            month,
            lines,
            anomalies,
        }
    }
}
