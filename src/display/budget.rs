//! Budget reconciliation formatting for terminal output

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::engine::{BudgetLine, Reconciliation};
use crate::models::CategoryKind;

use super::report::{double_separator, format_percentage};

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "Category")]
    name: String,
    #[tabled(rename = "Budget")]
    budget: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Variance")]
    variance: String,
    #[tabled(rename = "Used")]
    percent: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

impl BudgetRow {
    fn from_line(line: &BudgetLine, symbol: &str) -> Self {
        Self {
            name: line
                .name
                .clone()
                .unwrap_or_else(|| format!("(deleted {})", line.category_id.short())),
            budget: line.budget.format_with_symbol(symbol),
            actual: line.actual.format_with_symbol(symbol),
            variance: line.variance.format_with_symbol(symbol),
            percent: format_percentage(line.percent),
            status: status(line),
        }
    }
}

fn status(line: &BudgetLine) -> &'static str {
    if line.is_unbudgeted() {
        "NO BUDGET"
    } else if line.over_limit {
        "OVER"
    } else {
        "ok"
    }
}

fn table<'a>(lines: impl Iterator<Item = &'a BudgetLine>, symbol: &str) -> Option<String> {
    let rows: Vec<BudgetRow> = lines.map(|l| BudgetRow::from_line(l, symbol)).collect();
    if rows.is_empty() {
        return None;
    }

    Some(
        Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..5)).with(Alignment::right()))
            .to_string(),
    )
}

/// Format a month's reconciliation as an income section and an expense
/// section
pub fn format_budget_table(reconciliation: &Reconciliation, symbol: &str) -> String {
    let mut output = format!("Budget: {}\n", reconciliation.month.format_long());
    output.push_str(&double_separator(60));
    output.push('\n');

    if reconciliation.lines().is_empty() {
        output.push_str("No budgets or spending recorded for this month.\n");
        return output;
    }

    let income = reconciliation.lines_of_kind(CategoryKind::Income);
    let spending = reconciliation
        .lines()
        .iter()
        .filter(|l| l.kind != Some(CategoryKind::Income));

    if let Some(table) = table(income, symbol) {
        output.push_str("Expected income\n");
        output.push_str(&table);
        output.push_str("\n\n");
    }
    if let Some(table) = table(spending, symbol) {
        output.push_str("Expense budgets\n");
        output.push_str(&table);
        output.push('\n');
    }

    let over = reconciliation.over_limit().count();
    if over > 0 {
        let noun = if over == 1 { "category" } else { "categories" };
        output.push_str(&format!("\n{} {} over limit\n", over, noun));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BudgetReconciler;
    use crate::models::{Budget, Category, Money, MonthKey, UserId};
    use std::collections::HashMap;

    #[test]
    fn test_sections_and_status() {
        let user = UserId::new();
        let month = MonthKey::new(2025, 1).unwrap();
        let salary = Category::new(user, "Salary", CategoryKind::Income);
        let food = Category::new(user, "Food", CategoryKind::Expense);
        let fun = Category::new(user, "Fun", CategoryKind::Expense);
        let budgets = vec![
            Budget::new(user, salary.id, month, Money::from_cents(300000)),
            Budget::new(user, food.id, month, Money::from_cents(10000)),
        ];
        let actuals: HashMap<_, _> = [
            (food.id, Money::from_cents(15000)),
            (fun.id, Money::from_cents(2000)),
        ]
        .into_iter()
        .collect();
        let reconciliation =
            BudgetReconciler::reconcile(&budgets, &actuals, &[salary, food, fun], month);

        let output = format_budget_table(&reconciliation, "$");

        assert!(output.contains("Expected income"));
        assert!(output.contains("Expense budgets"));
        assert!(output.contains("OVER"));
        assert!(output.contains("NO BUDGET"));
        assert!(output.contains("-$50.00"));
        assert!(output.contains("2 categories over limit"));
    }

    #[test]
    fn test_empty_month() {
        let month = MonthKey::new(2025, 2).unwrap();
        let reconciliation = BudgetReconciler::reconcile(&[], &HashMap::new(), &[], month);

        assert!(format_budget_table(&reconciliation, "$").contains("No budgets or spending"));
    }
}
