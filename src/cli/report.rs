//! CLI commands for reports

use clap::{Args, Subcommand};

use crate::display::{format_drill_down, format_flow, format_summary};
use crate::engine::{recompute, CategoryTree, DashboardRequest, ReportWindow};
use crate::error::SikaiResult;

use super::{parse_month, print_json, resolve_category, CommandContext};

/// Time window shared by report commands
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Month to report on (YYYY-MM, defaults to the current month)
    #[arg(short, long)]
    pub month: Option<String>,

    /// Report on a whole year instead of a month
    #[arg(short, long, conflicts_with = "month")]
    pub year: Option<i32>,
}

impl WindowArgs {
    pub fn window(&self) -> SikaiResult<ReportWindow> {
        match self.year {
            Some(year) => Ok(ReportWindow::Year(year)),
            None => parse_month(self.month.as_deref()).map(ReportWindow::Month),
        }
    }
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Totals by type, balance and per-category distribution
    Summary {
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Income, expense and savings per week (month) or per month (year)
    Flow {
        #[command(flatten)]
        window: WindowArgs,

        /// Sort buckets by calendar instead of first appearance
        #[arg(long)]
        calendar_order: bool,
    },

    /// Break a root category down into its sub-categories
    #[command(alias = "drill")]
    DrillDown {
        /// Category name or ID
        category: String,

        #[command(flatten)]
        window: WindowArgs,
    },
}

/// Handle a report command
pub fn handle_report_command(ctx: &CommandContext, cmd: ReportCommands) -> SikaiResult<()> {
    let snapshot = ctx.snapshot()?;
    let settings = &ctx.settings;

    let request = |window: ReportWindow| {
        DashboardRequest::new(window)
            .with_labels(settings.week_label.as_str(), settings.uncategorized_label.as_str())
            .with_calendar_order(settings.calendar_order)
    };

    match cmd {
        ReportCommands::Summary { window } => {
            let dashboard = recompute(&snapshot, &request(window.window()?))?;
            if ctx.json {
                print_json(&dashboard)?;
            } else {
                print!("{}", format_summary(&dashboard, &settings.currency_symbol));
            }
        }

        ReportCommands::Flow {
            window,
            calendar_order,
        } => {
            let request = request(window.window()?);
            let request = if calendar_order {
                request.with_calendar_order(true)
            } else {
                request
            };
            let dashboard = recompute(&snapshot, &request)?;
            if ctx.json {
                print_json(&dashboard.flow)?;
            } else {
                print!("{}", format_flow(&dashboard, &settings.currency_symbol));
            }
        }

        ReportCommands::DrillDown { category, window } => {
            let tree = CategoryTree::build(&snapshot.categories);
            let category = resolve_category(&tree, &category)?;
            let root_id = tree.root_of(category.id).map(|r| r.id).unwrap_or(category.id);

            let dashboard = recompute(
                &snapshot,
                &request(window.window()?).with_drill_down(root_id),
            )?;
            if let Some(drill) = &dashboard.drill_down {
                if ctx.json {
                    print_json(drill)?;
                } else {
                    print!("{}", format_drill_down(drill, &settings.currency_symbol));
                }
            }
        }
    }

    Ok(())
}
