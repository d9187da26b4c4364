//! Budget CLI commands
//!
//! Shows a month's budget against actual spending and sets budget targets.

use clap::Subcommand;
use serde::Serialize;

use crate::display::format_budget_table;
use crate::engine::{
    recompute, BudgetEditor, CategoryTree, DashboardRequest, Reconciliation, ReportWindow,
};
use crate::error::{SikaiError, SikaiResult};
use crate::models::Money;
use crate::storage::BudgetWriteOutcome;

use super::{parse_month, print_json, resolve_category, CommandContext};

/// Budget subcommands
#[derive(Subcommand, Debug)]
pub enum BudgetCommands {
    /// Show budget versus actual for a month
    Show {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Set the budget for a category
    Set {
        /// Category name or ID
        category: String,
        /// Amount (e.g., "100" or "100.00")
        amount: String,
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

#[derive(Serialize)]
struct SetResult<'a> {
    category: &'a str,
    month: String,
    changed: bool,
    writes: Vec<BudgetWriteOutcome>,
}

/// Handle a budget command
pub fn handle_budget_command(ctx: &CommandContext, cmd: BudgetCommands) -> SikaiResult<()> {
    let symbol = ctx.settings.currency_symbol.as_str();

    match cmd {
        BudgetCommands::Show { month } => {
            let reconciliation = reconcile_month(ctx, month.as_deref())?;
            if ctx.json {
                print_json(&reconciliation)?;
            } else {
                print!("{}", format_budget_table(&reconciliation, symbol));
            }
        }

        BudgetCommands::Set {
            category,
            amount,
            month,
        } => {
            let month = parse_month(month.as_deref())?;
            let amount = Money::parse(&amount)?;

            let snapshot = ctx.snapshot()?;
            let tree = CategoryTree::build(&snapshot.categories);
            let category = resolve_category(&tree, &category)?;

            let mut editor = BudgetEditor::load(month, &snapshot.budgets);
            editor
                .set(category.id, amount)
                .map_err(|e| SikaiError::Validation(e.to_string()))?;

            let changes = editor.pending_changes();
            let writes = ctx
                .store
                .apply_budget_changes(snapshot.user_id, month, &changes)?;
            editor.mark_saved();

            if ctx.json {
                print_json(&SetResult {
                    category: &category.name,
                    month: month.to_string(),
                    changed: !writes.is_empty(),
                    writes,
                })?;
            } else if writes.is_empty() {
                println!(
                    "Budget for '{}' in {} is already {}",
                    category.name,
                    month.format_long(),
                    amount.format_with_symbol(symbol)
                );
            } else {
                println!(
                    "Set budget for '{}' in {} to {}",
                    category.name,
                    month.format_long(),
                    amount.format_with_symbol(symbol)
                );
            }
        }
    }

    Ok(())
}

fn reconcile_month(ctx: &CommandContext, month: Option<&str>) -> SikaiResult<Reconciliation> {
    let month = parse_month(month)?;
    let snapshot = ctx.snapshot()?;
    let dashboard = recompute(&snapshot, &DashboardRequest::new(ReportWindow::Month(month)))?;

    dashboard
        .budget
        .ok_or_else(|| SikaiError::Storage(format!("No reconciliation produced for {}", month)))
}
