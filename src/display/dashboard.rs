//! Dashboard formatting for terminal output

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::engine::{Anomaly, Dashboard, DrillDown, FlowBucket, Slice};
use crate::models::Money;

use super::report::{double_separator, format_bar, format_percentage, separator, truncate};

const WIDTH: usize = 60;
const NAME_WIDTH: usize = 22;
const BAR_WIDTH: usize = 20;

/// Format the totals, shares and per-category slices of a dashboard
pub fn format_summary(dashboard: &Dashboard, symbol: &str) -> String {
    let money = |m: Money| m.format_with_symbol(symbol);
    let totals = &dashboard.totals;
    let mut output = String::new();

    output.push_str(&format!("Summary: {}\n", dashboard.window));
    output.push_str(&double_separator(WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "{:<12} {:>14}  ({})\n",
        "Income",
        money(totals.income),
        format_percentage(dashboard.income_share)
    ));
    output.push_str(&format!(
        "{:<12} {:>14}  ({})\n",
        "Expenses",
        money(totals.expense),
        format_percentage(dashboard.expense_share)
    ));
    output.push_str(&format!("{:<12} {:>14}\n", "Savings", money(totals.savings)));
    output.push_str(&separator(WIDTH));
    output.push('\n');
    output.push_str(&format!("{:<12} {:>14}\n", "Balance", money(dashboard.balance)));

    for (title, slices) in [
        ("Income by category", &dashboard.income_slices),
        ("Expenses by category", &dashboard.expense_slices),
        ("Savings by category", &dashboard.savings_slices),
    ] {
        if slices.is_empty() {
            continue;
        }
        output.push('\n');
        output.push_str(title);
        output.push('\n');
        output.push_str(&format_slices(slices, symbol));
    }

    if let Some(drill) = &dashboard.drill_down {
        output.push('\n');
        output.push_str(&format_drill_down(drill, symbol));
    }

    output.push_str(&format_anomalies(&dashboard.anomalies));
    output
}

/// One line per slice with a bar scaled to the largest value
pub fn format_slices(slices: &[Slice], symbol: &str) -> String {
    let max = slices
        .iter()
        .map(|s| s.value.cents())
        .max()
        .unwrap_or(0) as f64;

    slices
        .iter()
        .map(|s| {
            format!(
                "  {:<name$} {:>14}  {}\n",
                truncate(&s.name, NAME_WIDTH),
                s.value.format_with_symbol(symbol),
                format_bar(s.value.cents() as f64, max, BAR_WIDTH),
                name = NAME_WIDTH
            )
        })
        .collect()
}

/// Format a root's breakdown into sub-categories
pub fn format_drill_down(drill: &DrillDown, symbol: &str) -> String {
    let mut output = format!(
        "{} ({})\n",
        drill.root_name,
        drill.total.format_with_symbol(symbol)
    );
    if drill.slices.is_empty() {
        output.push_str("  No drill-down available: no sub-category spending.\n");
    } else {
        output.push_str(&format_slices(&drill.slices, symbol));
    }
    output
}

#[derive(Tabled)]
struct FlowRow {
    #[tabled(rename = "Period")]
    label: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Expenses")]
    expense: String,
    #[tabled(rename = "Savings")]
    savings: String,
}

/// Format the flow series as a table
pub fn format_flow(dashboard: &Dashboard, symbol: &str) -> String {
    let mut output = format!("Flow: {}\n", dashboard.window);

    if dashboard.flow.is_empty() {
        output.push_str("No transactions in this period.\n");
        return output;
    }

    output.push_str(&flow_table(&dashboard.flow, symbol));
    output.push('\n');
    output.push_str(&format_anomalies(&dashboard.anomalies));
    output
}

fn flow_table(buckets: &[FlowBucket], symbol: &str) -> String {
    let rows = buckets.iter().map(|b| FlowRow {
        label: b.label.clone(),
        income: b.income.format_with_symbol(symbol),
        expense: b.expense.format_with_symbol(symbol),
        savings: b.savings.format_with_symbol(symbol),
    });

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}

/// Trailing warning section; empty when there is nothing to report
pub fn format_anomalies(anomalies: &[Anomaly]) -> String {
    if anomalies.is_empty() {
        return String::new();
    }

    let mut output = format!("\nWarnings ({})\n", anomalies.len());
    for anomaly in anomalies {
        output.push_str(&format!("  ! {}\n", anomaly));
    }
    output
}
