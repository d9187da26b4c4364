//! Invariants of the aggregation engine checked over generated record sets

use chrono::NaiveDate;
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashMap;

use sikai::engine::{BudgetReconciler, CategoryTree, Granularity, PeriodBucketer, RollupAggregator};
use sikai::models::{
    Budget, Category, CategoryId, CategoryKind, Money, MonthKey, Transaction, UserId,
};

// =============================================================================
// Generators
// =============================================================================

/// Where a generated category points its parent
#[derive(Debug, Clone)]
enum ParentLink {
    Root,
    /// An earlier category, so plain trees dominate
    Earlier(Index),
    /// Any category, itself included; produces cycles
    Anywhere(Index),
    /// An id that is not in the set
    Dangling,
}

/// Where a generated transaction or budget points its category
#[derive(Debug, Clone)]
enum CategoryRef {
    Missing,
    Dangling,
    Known(Index),
}

#[derive(Debug, Clone)]
struct Records {
    user: UserId,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
}

const MONTH: (i32, u32) = (2025, 6);

fn arb_kind() -> impl Strategy<Value = CategoryKind> {
    prop_oneof![
        Just(CategoryKind::Income),
        Just(CategoryKind::Expense),
        Just(CategoryKind::Savings),
    ]
}

fn arb_parent_link() -> impl Strategy<Value = ParentLink> {
    prop_oneof![
        3 => Just(ParentLink::Root),
        6 => any::<Index>().prop_map(ParentLink::Earlier),
        1 => any::<Index>().prop_map(ParentLink::Anywhere),
        1 => Just(ParentLink::Dangling),
    ]
}

fn arb_category_ref() -> impl Strategy<Value = CategoryRef> {
    prop_oneof![
        1 => Just(CategoryRef::Missing),
        1 => Just(CategoryRef::Dangling),
        8 => any::<Index>().prop_map(CategoryRef::Known),
    ]
}

/// (category, month, day, cents)
fn arb_transaction_spec() -> impl Strategy<Value = (CategoryRef, u32, u32, i64)> {
    (arb_category_ref(), 1u32..=12, 1u32..=28, 0i64..500_000)
}

/// (category, cents); repeated categories give duplicate budget keys
fn arb_budget_spec() -> impl Strategy<Value = (CategoryRef, i64)> {
    (arb_category_ref(), 0i64..300_000)
}

fn resolve(reference: &CategoryRef, ids: &[CategoryId]) -> Option<CategoryId> {
    match reference {
        CategoryRef::Missing => None,
        CategoryRef::Dangling => Some(CategoryId::new()),
        CategoryRef::Known(index) => Some(ids[index.index(ids.len())]),
    }
}

fn arb_records() -> impl Strategy<Value = Records> {
    (
        proptest::collection::vec((arb_kind(), arb_parent_link()), 1..16),
        proptest::collection::vec(arb_transaction_spec(), 0..120),
        proptest::collection::vec(arb_budget_spec(), 0..20),
    )
        .prop_map(|(category_specs, transaction_specs, budget_specs)| {
            let user = UserId::new();
            let mut categories: Vec<Category> = category_specs
                .iter()
                .enumerate()
                .map(|(i, (kind, _))| Category::new(user, format!("Category {}", i), *kind))
                .collect();
            let ids: Vec<CategoryId> = categories.iter().map(|c| c.id).collect();

            for (i, (_, link)) in category_specs.iter().enumerate() {
                categories[i].parent_id = match link {
                    ParentLink::Root => None,
                    ParentLink::Earlier(_) if i == 0 => None,
                    ParentLink::Earlier(index) => Some(ids[index.index(i)]),
                    ParentLink::Anywhere(index) => Some(ids[index.index(ids.len())]),
                    ParentLink::Dangling => Some(CategoryId::new()),
                };
            }

            let transactions = transaction_specs
                .iter()
                .map(|(reference, month, day, cents)| {
                    let date = NaiveDate::from_ymd_opt(MONTH.0, *month, *day)
                        .expect("days up to 28 exist in every month");
                    let amount = Money::from_cents(*cents);
                    Transaction::new(user, resolve(reference, &ids), date, amount)
                })
                .collect();

            let month = MonthKey::new(MONTH.0, MONTH.1).expect("valid month");
            let budgets = budget_specs
                .iter()
                .filter_map(|(reference, cents)| {
                    let category = resolve(reference, &ids)?;
                    Some(Budget::new(user, category, month, Money::from_cents(*cents)))
                })
                .collect();

            Records {
                user,
                categories,
                transactions,
                budgets,
            }
        })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every transaction lands in exactly one type total and exactly one of
    /// a root bucket or the uncategorized bucket
    #[test]
    fn prop_every_transaction_is_counted_exactly_once(records in arb_records()) {
        let tree = CategoryTree::build(&records.categories);
        let rollup = RollupAggregator::aggregate(&records.transactions, &tree);

        let expected: Money = records.transactions.iter().map(|t| t.amount).sum();
        prop_assert_eq!(rollup.totals_by_type.total(), expected);
        prop_assert_eq!(rollup.transaction_count, records.transactions.len());

        let by_root: Money = rollup.totals_by_root.values().copied().sum();
        prop_assert_eq!(by_root + rollup.uncategorized, expected);

        let by_category: Money = rollup.totals_by_category.values().copied().sum();
        prop_assert_eq!(by_category, by_root);
    }

    /// Aggregating two disjoint sets and merging equals aggregating the union
    #[test]
    fn prop_aggregation_is_additive_over_disjoint_sets(
        records in arb_records(),
        split in any::<Index>(),
    ) {
        let tree = CategoryTree::build(&records.categories);
        let at = split.index(records.transactions.len() + 1);
        let (left, right) = records.transactions.split_at(at);

        let merged = RollupAggregator::aggregate(left, &tree)
            .merge(RollupAggregator::aggregate(right, &tree));
        let whole = RollupAggregator::aggregate(&records.transactions, &tree);

        prop_assert_eq!(merged.totals_by_type, whole.totals_by_type);
        prop_assert_eq!(&merged.totals_by_root, &whole.totals_by_root);
        prop_assert_eq!(&merged.totals_by_category, &whole.totals_by_category);
        prop_assert_eq!(merged.uncategorized, whole.uncategorized);
    }

    /// Orphans and cycles still leave a forest where every lookup ends at a
    /// parentless root and looking up a root returns itself
    #[test]
    fn prop_root_lookup_is_idempotent(records in arb_records()) {
        let tree = CategoryTree::build(&records.categories);

        for category in &records.categories {
            let root = tree
                .root_of(category.id)
                .ok_or_else(|| TestCaseError::fail(format!("no root for {}", category.name)))?;

            prop_assert!(tree.parent_of(root.id).is_none());
            prop_assert_eq!(tree.root_of(root.id).map(|r| r.id), Some(root.id));
            prop_assert_eq!(tree.root_kind(category.id), Some(root.kind));
        }

        let children = tree.iter().filter(|c| tree.parent_of(c.id).is_some()).count();
        prop_assert_eq!(tree.roots().count() + children, tree.len());
    }

    /// Monthly buckets over a year add up to the rollup's type totals
    #[test]
    fn prop_flow_buckets_sum_to_totals(records in arb_records()) {
        let tree = CategoryTree::build(&records.categories);
        let rollup = RollupAggregator::aggregate(&records.transactions, &tree);
        let buckets = PeriodBucketer::default().bucket(
            &records.transactions,
            &tree,
            Granularity::MonthlyInYear,
        );

        let income: Money = buckets.iter().map(|b| b.income).sum();
        let expense: Money = buckets.iter().map(|b| b.expense).sum();
        let savings: Money = buckets.iter().map(|b| b.savings).sum();
        prop_assert_eq!(income, rollup.totals_by_type.income);
        prop_assert_eq!(expense, rollup.totals_by_type.expense);
        prop_assert_eq!(savings, rollup.totals_by_type.savings);
        prop_assert!(buckets.len() <= 12);
    }

    /// Same inputs give the same lines, and every line is self-consistent
    #[test]
    fn prop_reconciliation_is_deterministic_and_consistent(records in arb_records()) {
        let month = MonthKey::new(MONTH.0, MONTH.1).expect("valid month");
        let tree = CategoryTree::build(&records.categories);

        let in_month: Vec<Transaction> = records
            .transactions
            .iter()
            .filter(|t| month.contains(t.date))
            .cloned()
            .collect();
        let actuals: HashMap<CategoryId, Money> =
            RollupAggregator::aggregate(&in_month, &tree).totals_by_category;

        let first =
            BudgetReconciler::reconcile(&records.budgets, &actuals, &records.categories, month);
        let second =
            BudgetReconciler::reconcile(&records.budgets, &actuals, &records.categories, month);
        prop_assert_eq!(&first, &second);

        for line in first.lines() {
            prop_assert!((0.0..=100.0).contains(&line.percent));
            prop_assert_eq!(line.variance, line.budget - line.actual);
            let expected_over = if line.budget.is_positive() {
                line.actual > line.budget
            } else {
                line.actual.is_positive()
            };
            prop_assert_eq!(line.over_limit, expected_over);
        }

        for budget in &records.budgets {
            prop_assert_eq!(budget.user_id, records.user);
            prop_assert!(first.get(budget.category_id).is_some());
        }
    }
}
