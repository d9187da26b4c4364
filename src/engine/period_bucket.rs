//! Flow series bucketing
//!
//! Groups transactions into coarse time buckets for the income/expense/savings
//! bar chart. Buckets appear in the order their first transaction was seen;
//! empty buckets are not emitted.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{CategoryKind, Money, Transaction};

use super::category_tree::CategoryTree;

/// How transactions are grouped in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// `ceil(day / 7)`, at most five buckets per month
    WeeklyInMonth,
    /// One bucket per calendar month
    MonthlyInYear,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeeklyInMonth => write!(f, "weekly-in-month"),
            Self::MonthlyInYear => write!(f, "monthly-in-year"),
        }
    }
}

/// Sortable identity of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "unit", content = "index", rename_all = "lowercase")]
pub enum BucketKey {
    Week(u32),
    Month(u32),
}

impl BucketKey {
    pub fn for_date(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::WeeklyInMonth => Self::Week((date.day() + 6) / 7),
            Granularity::MonthlyInYear => Self::Month(date.month()),
        }
    }
}

/// Income, expense and savings totals for one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowBucket {
    pub key: BucketKey,
    pub label: String,
    pub income: Money,
    pub expense: Money,
    pub savings: Money,
}

impl FlowBucket {
    fn new(key: BucketKey, label: String) -> Self {
        Self {
            key,
            label,
            income: Money::zero(),
            expense: Money::zero(),
            savings: Money::zero(),
        }
    }

    fn add(&mut self, kind: CategoryKind, amount: Money) {
        match kind {
            CategoryKind::Income => self.income += amount,
            CategoryKind::Expense => self.expense += amount,
            CategoryKind::Savings => self.savings += amount,
        }
    }
}

/// Assigns transactions to flow buckets
#[derive(Debug, Clone)]
pub struct PeriodBucketer {
    week_label: String,
}

impl Default for PeriodBucketer {
    fn default() -> Self {
        Self::new("Week")
    }
}

impl PeriodBucketer {
    /// Create a bucketer; weekly buckets are labelled "<week_label> N"
    pub fn new(week_label: impl Into<String>) -> Self {
        Self {
            week_label: week_label.into(),
        }
    }

    pub fn label(&self, key: BucketKey) -> String {
        match key {
            BucketKey::Week(n) => format!("{} {}", self.week_label, n),
            BucketKey::Month(m) => NaiveDate::from_ymd_opt(2000, m, 1)
                .map(|d| d.format("%b").to_string())
                .unwrap_or_else(|| m.to_string()),
        }
    }

    /// Bucket transactions in first-seen order
    ///
    /// Kind comes from the root category; transactions with a missing
    /// category count as expense.
    pub fn bucket(
        &self,
        transactions: &[Transaction],
        tree: &CategoryTree,
        granularity: Granularity,
    ) -> Vec<FlowBucket> {
        let mut buckets: Vec<FlowBucket> = Vec::new();

        for txn in transactions {
            let key = BucketKey::for_date(txn.date, granularity);
            let kind = txn
                .category_id
                .and_then(|id| tree.root_kind(id))
                .unwrap_or(CategoryKind::Expense);

            let index = match buckets.iter().position(|b| b.key == key) {
                Some(index) => index,
                None => {
                    buckets.push(FlowBucket::new(key, self.label(key)));
                    buckets.len() - 1
                }
            };
            buckets[index].add(kind, txn.amount);
        }

        tracing::debug!(%granularity, buckets = buckets.len(), "flow series bucketed");
        buckets
    }
}

/// Reorder buckets into calendar order
pub fn sort_calendar(buckets: &mut [FlowBucket]) {
    buckets.sort_by_key(|b| b.key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, UserId};

    fn on(user: UserId, category: &Category, y: i32, m: u32, d: u32, cents: i64) -> Transaction {
        Transaction::new(
            user,
            Some(category.id),
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            Money::from_cents(cents),
        )
    }

    #[test]
    fn test_week_keys() {
        let date = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        assert_eq!(BucketKey::for_date(date(1), Granularity::WeeklyInMonth), BucketKey::Week(1));
        assert_eq!(BucketKey::for_date(date(7), Granularity::WeeklyInMonth), BucketKey::Week(1));
        assert_eq!(BucketKey::for_date(date(8), Granularity::WeeklyInMonth), BucketKey::Week(2));
        assert_eq!(BucketKey::for_date(date(10), Granularity::WeeklyInMonth), BucketKey::Week(2));
        assert_eq!(BucketKey::for_date(date(31), Granularity::WeeklyInMonth), BucketKey::Week(5));
    }

    #[test]
    fn test_weekly_buckets_first_seen_order() {
        let user = UserId::new();
        let food = Category::new(user, "Food", CategoryKind::Expense);
        let salary = Category::new(user, "Salary", CategoryKind::Income);
        let tree = CategoryTree::build(&[food.clone(), salary.clone()]);

        let transactions = vec![
            on(user, &food, 2025, 1, 10, 1500),
            on(user, &salary, 2025, 1, 1, 200000),
            on(user, &food, 2025, 1, 31, 700),
            on(user, &food, 2025, 1, 2, 300),
        ];

        let buckets =
            PeriodBucketer::default().bucket(&transactions, &tree, Granularity::WeeklyInMonth);

        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Week 2", "Week 1", "Week 5"]);
        assert_eq!(buckets[1].income.cents(), 200000);
        assert_eq!(buckets[1].expense.cents(), 300);
        assert_eq!(buckets[0].expense.cents(), 1500);
    }

    #[test]
    fn test_monthly_buckets_and_calendar_sort() {
        let user = UserId::new();
        let fund = Category::new(user, "Fund", CategoryKind::Savings);
        let tree = CategoryTree::build(&[fund.clone()]);

        let transactions = vec![
            on(user, &fund, 2025, 3, 5, 100),
            on(user, &fund, 2025, 1, 20, 200),
            on(user, &fund, 2025, 3, 28, 50),
        ];

        let mut buckets =
            PeriodBucketer::default().bucket(&transactions, &tree, Granularity::MonthlyInYear);
        assert_eq!(buckets[0].label, "Mar");
        assert_eq!(buckets[0].savings.cents(), 150);

        sort_calendar(&mut buckets);
        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Mar"]);
    }

    #[test]
    fn test_custom_week_label_and_orphans() {
        let user = UserId::new();
        let tree = CategoryTree::build(&[]);
        let orphan = Transaction::new(
            user,
            None,
            NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
            Money::from_cents(990),
        );

        let buckets =
            PeriodBucketer::new("Sem").bucket(&[orphan], &tree, Granularity::WeeklyInMonth);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, "Sem 3");
        assert_eq!(buckets[0].expense.cents(), 990);
    }
}
