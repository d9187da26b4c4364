//! Dashboard recompute pipeline
//!
//! Every mutation recomputes the whole dashboard from an explicit snapshot.
//! The category tree is built once per pass and shared by every derived view.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{SikaiError, SikaiResult};
use crate::models::{
    Budget, Category, CategoryId, CategoryKind, Money, MoneyParseError, MonthKey, Transaction,
    UserId,
};

use super::anomaly::Anomaly;
use super::category_tree::CategoryTree;
use super::drill_down::DrillDownProjector;
use super::period_bucket::{sort_calendar, FlowBucket, Granularity, PeriodBucketer};
use super::reconcile::{BudgetReconciler, Reconciliation};
use super::rollup::{Rollup, RollupAggregator, Slice, TypeTotals};

/// All records one computation sees, owned by a single user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub user_id: UserId,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
}

impl Snapshot {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Reject a snapshot that mixes records of different users
    pub fn ensure_single_owner(&self) -> SikaiResult<()> {
        let owners = self
            .categories
            .iter()
            .map(|c| c.user_id)
            .chain(self.transactions.iter().map(|t| t.user_id))
            .chain(self.budgets.iter().map(|b| b.user_id));

        for owner in owners {
            if owner != self.user_id {
                return Err(SikaiError::Validation(format!(
                    "snapshot for user {} contains records of user {}",
                    self.user_id.short(),
                    owner.short()
                )));
            }
        }
        Ok(())
    }

    /// Check ownership and every record's own invariants
    pub fn validate(&self) -> SikaiResult<()> {
        self.ensure_single_owner()?;

        for txn in &self.transactions {
            txn.validate().map_err(|e| {
                SikaiError::Validation(format!("transaction {}: {}", txn.id.short(), e))
            })?;
        }
        for budget in &self.budgets {
            budget.validate().map_err(|e| {
                SikaiError::Validation(format!("budget {}: {}", budget.id.short(), e))
            })?;
        }

        // Amounts are non-negative, so any subset total fits once these do
        Self::ensure_total_fits("transactions", self.transactions.iter().map(|t| t.amount))?;
        Self::ensure_total_fits("budgets", self.budgets.iter().map(|b| b.amount))?;
        Ok(())
    }

    fn ensure_total_fits(
        records: &str,
        amounts: impl Iterator<Item = Money>,
    ) -> SikaiResult<Money> {
        Money::checked_sum(amounts).ok_or_else(|| {
            SikaiError::InvalidAmount(MoneyParseError::OutOfRange(format!(
                "sum of {} exceeds {}",
                records,
                Money::from_cents(i64::MAX)
            )))
        })
    }
}

/// Time range a dashboard covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum ReportWindow {
    Month(MonthKey),
    Year(i32),
}

impl ReportWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Self::Month(month) => month.contains(date),
            Self::Year(year) => date.year() == *year,
        }
    }

    /// Weekly buckets inside a month, monthly buckets inside a year
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Month(_) => Granularity::WeeklyInMonth,
            Self::Year(_) => Granularity::MonthlyInYear,
        }
    }

    /// Budgets only reconcile against a single month
    pub fn month(&self) -> Option<MonthKey> {
        match self {
            Self::Month(month) => Some(*month),
            Self::Year(_) => None,
        }
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month(month) => write!(f, "{}", month.format_long()),
            Self::Year(year) => write!(f, "{}", year),
        }
    }
}

/// What the caller wants recomputed
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    pub window: ReportWindow,
    /// Root category to break down into sub-categories
    pub drill_down: Option<CategoryId>,
    /// Sort flow buckets by calendar instead of first-seen order
    pub calendar_order: bool,
    pub week_label: String,
    pub uncategorized_label: String,
}

impl DashboardRequest {
    pub fn new(window: ReportWindow) -> Self {
        Self {
            window,
            drill_down: None,
            calendar_order: false,
            week_label: "Week".to_string(),
            uncategorized_label: "Uncategorized".to_string(),
        }
    }

    pub fn with_drill_down(mut self, root_id: CategoryId) -> Self {
        self.drill_down = Some(root_id);
        self
    }

    pub fn with_calendar_order(mut self, calendar_order: bool) -> Self {
        self.calendar_order = calendar_order;
        self
    }

    pub fn with_labels(
        mut self,
        week_label: impl Into<String>,
        uncategorized_label: impl Into<String>,
    ) -> Self {
        self.week_label = week_label.into();
        self.uncategorized_label = uncategorized_label.into();
        self
    }
}

/// Sub-category breakdown of one root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillDown {
    pub root_id: CategoryId,
    pub root_name: String,
    pub total: Money,
    pub slices: Vec<Slice>,
}

/// Everything the dashboard shows for one window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub window: ReportWindow,
    pub totals: TypeTotals,
    pub balance: Money,
    pub income_share: f64,
    pub expense_share: f64,
    pub income_slices: Vec<Slice>,
    pub expense_slices: Vec<Slice>,
    pub savings_slices: Vec<Slice>,
    pub flow: Vec<FlowBucket>,
    pub budget: Option<Reconciliation>,
    pub drill_down: Option<DrillDown>,
    #[serde(skip)]
    pub rollup: Rollup,
    pub anomalies: Vec<Anomaly>,
}

/// Recompute the dashboard for `request` from scratch
pub fn recompute(snapshot: &Snapshot, request: &DashboardRequest) -> SikaiResult<Dashboard> {
    snapshot.validate()?;

    let tree = CategoryTree::build(&snapshot.categories);
    let transactions: Vec<Transaction> = snapshot
        .transactions
        .iter()
        .filter(|t| request.window.contains(t.date))
        .cloned()
        .collect();

    let drill_root = match request.drill_down {
        Some(id) => match tree.get(id) {
            Some(root) => Some(root),
            None => return Err(SikaiError::category_not_found(id.to_string())),
        },
        None => None,
    };

    let rollup = RollupAggregator::aggregate(&transactions, &tree);

    let mut flow = PeriodBucketer::new(request.week_label.as_str()).bucket(
        &transactions,
        &tree,
        request.window.granularity(),
    );
    if request.calendar_order {
        sort_calendar(&mut flow);
    }

    let budget = request.window.month().map(|month| {
        BudgetReconciler::reconcile(
            &snapshot.budgets,
            &rollup.totals_by_category,
            &snapshot.categories,
            month,
        )
    });

    let drill_down = drill_root.map(|root| DrillDown {
        root_id: root.id,
        root_name: root.name.clone(),
        total: rollup.root_total(root.id),
        slices: DrillDownProjector::project_rollup(root.id, &rollup, &tree),
    });

    let slices = |kind| rollup.pie_slices(&tree, kind, &request.uncategorized_label);

    let mut anomalies: Vec<Anomaly> = tree.anomalies().to_vec();
    anomalies.extend_from_slice(rollup.anomalies());
    if let Some(reconciliation) = &budget {
        anomalies.extend_from_slice(reconciliation.anomalies());
    }

    let dashboard = Dashboard {
        window: request.window,
        totals: rollup.totals_by_type,
        balance: rollup.balance(),
        income_share: rollup.totals_by_type.share_percent(CategoryKind::Income),
        expense_share: rollup.totals_by_type.share_percent(CategoryKind::Expense),
        income_slices: slices(CategoryKind::Income),
        expense_slices: slices(CategoryKind::Expense),
        savings_slices: slices(CategoryKind::Savings),
        flow,
        budget,
        drill_down,
        rollup: rollup.clone(),
        anomalies,
    };

    tracing::debug!(
        window = %request.window,
        transactions = dashboard.rollup.transaction_count,
        anomalies = dashboard.anomalies.len(),
        "dashboard recomputed"
    );
    Ok(dashboard)
}

/// Ticket for one recompute pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

/// Last-started-wins guard for overlapping recomputes
///
/// Each pass takes a generation from [`RecomputeGate::begin`]; a result is
/// only accepted if no newer pass has started since.
#[derive(Debug, Default)]
pub struct RecomputeGate {
    latest: AtomicU64,
}

impl RecomputeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::SeqCst) == generation.0
    }

    /// Hand back `result` if `generation` is still the newest pass
    pub fn accept<T>(&self, generation: Generation, result: T) -> Option<T> {
        if self.is_current(generation) {
            Some(result)
        } else {
            tracing::debug!(generation = generation.0, "discarding stale recompute");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        snapshot: Snapshot,
        salary: Category,
        home: Category,
        rent: Category,
    }

    fn fixture() -> Fixture {
        let user = UserId::new();
        let salary = Category::new(user, "Salary", CategoryKind::Income);
        let home = Category::new(user, "Home", CategoryKind::Expense);
        let rent = Category::child_of(&home, "Rent");
        let fund = Category::new(user, "Fund", CategoryKind::Savings);

        let mut snapshot = Snapshot::new(user);
        snapshot.categories = vec![salary.clone(), home.clone(), rent.clone(), fund.clone()];
        let txn = |category: Option<CategoryId>, day: NaiveDate, cents: i64| {
            Transaction::new(user, category, day, Money::from_cents(cents))
        };
        snapshot.transactions = vec![
            txn(Some(salary.id), date(2025, 1, 1), 300000),
            txn(Some(rent.id), date(2025, 1, 3), 100000),
            txn(Some(home.id), date(2025, 1, 12), 20000),
            txn(Some(fund.id), date(2025, 1, 20), 50000),
            txn(Some(CategoryId::new()), date(2025, 1, 21), 500),
            txn(Some(rent.id), date(2025, 2, 3), 100000),
        ];
        snapshot.budgets = vec![
            Budget::new(user, home.id, MonthKey::new(2025, 1).unwrap(), Money::from_cents(15000)),
            Budget::new(user, rent.id, MonthKey::new(2025, 1).unwrap(), Money::from_cents(120000)),
        ];

        Fixture {
            snapshot,
            salary,
            home,
            rent,
        }
    }

    #[test]
    fn test_month_dashboard() {
        let f = fixture();
        let request = DashboardRequest::new(ReportWindow::Month(MonthKey::new(2025, 1).unwrap()))
            .with_drill_down(f.home.id);

        let dashboard = recompute(&f.snapshot, &request).unwrap();

        assert_eq!(dashboard.totals.income.cents(), 300000);
        assert_eq!(dashboard.totals.expense.cents(), 120500);
        assert_eq!(dashboard.totals.savings.cents(), 50000);
        assert_eq!(dashboard.balance.cents(), 129500);
        assert_eq!(dashboard.rollup.transaction_count, 5);

        let expense_names: Vec<_> = dashboard
            .expense_slices
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(expense_names, vec!["Home", "Uncategorized"]);
        assert_eq!(dashboard.income_slices[0].name, f.salary.name);

        let labels: Vec<_> = dashboard.flow.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Week 1", "Week 2", "Week 3"]);

        let budget = dashboard.budget.as_ref().unwrap();
        let home_line = budget.get(f.home.id).unwrap();
        assert_eq!(home_line.actual.cents(), 20000);
        assert!(home_line.over_limit);
        let rent_line = budget.get(f.rent.id).unwrap();
        assert!(!rent_line.over_limit);

        let drill = dashboard.drill_down.as_ref().unwrap();
        assert_eq!(drill.total.cents(), 120000);
        assert_eq!(drill.slices.len(), 1);
        assert_eq!(drill.slices[0].value.cents(), 100000);

        assert_eq!(dashboard.anomalies.len(), 1);
        assert!(matches!(dashboard.anomalies[0], Anomaly::OrphanedTransaction { .. }));
    }

    #[test]
    fn test_year_dashboard_buckets_monthly_without_budget() {
        let f = fixture();
        let request = DashboardRequest::new(ReportWindow::Year(2025)).with_calendar_order(true);

        let dashboard = recompute(&f.snapshot, &request).unwrap();

        assert!(dashboard.budget.is_none());
        let labels: Vec<_> = dashboard.flow.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Feb"]);
        assert_eq!(dashboard.rollup.transaction_count, 6);
    }

    #[test]
    fn test_mixed_owner_snapshot_rejected() {
        let mut f = fixture();
        f.snapshot.transactions.push(Transaction::new(
            UserId::new(),
            None,
            date(2025, 1, 5),
            Money::from_cents(1),
        ));

        let request = DashboardRequest::new(ReportWindow::Year(2025));
        let err = recompute(&f.snapshot, &request).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut f = fixture();
        let user = f.snapshot.user_id;
        f.snapshot.transactions.push(Transaction::new(
            user,
            None,
            date(2025, 1, 5),
            Money::from_cents(-100),
        ));

        let request = DashboardRequest::new(ReportWindow::Year(2025));
        let err = recompute(&f.snapshot, &request).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_total_overflow_is_invalid_amount() {
        let mut f = fixture();
        let user = f.snapshot.user_id;
        let huge: Money = serde_json::from_str("92233720368547758").unwrap();
        for day in [6, 7] {
            f.snapshot.transactions.push(Transaction::new(
                user,
                Some(f.salary.id),
                date(2025, 1, day),
                huge,
            ));
        }

        let request = DashboardRequest::new(ReportWindow::Year(2025));
        let err = recompute(&f.snapshot, &request).unwrap_err();
        assert!(matches!(err, SikaiError::InvalidAmount(MoneyParseError::OutOfRange(_))));
        assert!(err.is_validation());
    }

    #[test]
    fn test_large_budgets_overflowing_together_are_rejected() {
        let mut f = fixture();
        let user = f.snapshot.user_id;
        let month = MonthKey::new(2025, 3).unwrap();
        let half = Money::from_cents(i64::MAX / 2 + 1);
        f.snapshot.budgets.push(Budget::new(user, f.home.id, month, half));
        f.snapshot.budgets.push(Budget::new(user, f.rent.id, month, half));

        let err = f.snapshot.validate().unwrap_err();
        assert!(matches!(err, SikaiError::InvalidAmount(_)));
    }

    #[test]
    fn test_unknown_drill_down_root() {
        let f = fixture();
        let request =
            DashboardRequest::new(ReportWindow::Year(2025)).with_drill_down(CategoryId::new());

        let err = recompute(&f.snapshot, &request).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_gate_discards_stale_results() {
        let gate = RecomputeGate::new();
        let first = gate.begin();
        let second = gate.begin();

        assert_eq!(gate.accept(first, "old"), None);
        assert_eq!(gate.accept(second, "new"), Some("new"));
        assert!(gate.is_current(second));
    }

    #[test]
    fn test_gate_across_threads_keeps_last_started() {
        let gate = RecomputeGate::new();
        let generations: Vec<Generation> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| gate.begin())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let newest = generations.iter().copied().max().unwrap();
        let accepted: Vec<_> = generations
            .iter()
            .filter_map(|g| gate.accept(*g, *g))
            .collect();
        assert_eq!(accepted, vec![newest]);
    }
}
