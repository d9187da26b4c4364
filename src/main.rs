use anyhow::Result;
use clap::{Parser, Subcommand};

use sikai::cli::{handle_budget_command, handle_report_command, CommandContext};
use sikai::config::{paths::SikaiPaths, settings::Settings};
use sikai::models::UserId;
use sikai::storage::JsonStore;

#[derive(Parser)]
#[command(
    name = "sikai",
    version,
    about = "Personal finance dashboard: rollups, flow charts and budget reconciliation",
    long_about = "Sikai aggregates your categorized income, expense and savings \
                  transactions into totals, per-category breakdowns and weekly or \
                  monthly flows, and reconciles monthly budgets against actual spending."
)]
struct Cli {
    /// User whose records to report on (defaults to the configured user)
    #[arg(long, global = true, env = "SIKAI_USER")]
    user: Option<UserId>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Dashboard reports
    #[command(subcommand)]
    Report(sikai::cli::ReportCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(sikai::cli::BudgetCommands),

    /// Show current configuration and paths
    Config,
}

fn command_context(
    paths: SikaiPaths,
    settings: Settings,
    user: Option<UserId>,
    json: bool,
) -> Result<CommandContext> {
    Ok(CommandContext {
        store: JsonStore::open(paths)?,
        settings,
        user_id: user,
        json,
    })
}

fn main() -> Result<()> {
    sikai::init_tracing();
    let cli = Cli::parse();

    let paths = SikaiPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Config) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
                return Ok(());
            }
            println!("Sikai Configuration");
            println!("===================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!();
            println!("Settings:");
            match settings.user_id {
                Some(user) => println!("  User:                {}", user),
                None => println!("  User:                (sole owner in store)"),
            }
            println!("  Currency symbol:     {}", settings.currency_symbol);
            println!("  Week label:          {}", settings.week_label);
            println!("  Uncategorized label: {}", settings.uncategorized_label);
            println!("  Calendar order:      {}", settings.calendar_order);
        }
        Some(Commands::Report(cmd)) => {
            let ctx = command_context(paths, settings, cli.user, cli.json)?;
            handle_report_command(&ctx, cmd)?;
        }
        Some(Commands::Budget(cmd)) => {
            let ctx = command_context(paths, settings, cli.user, cli.json)?;
            handle_budget_command(&ctx, cmd)?;
        }
        None => {
            println!("Sikai - personal finance dashboard");
            println!();
            println!("Run 'sikai --help' for usage information.");
        }
    }

    Ok(())
}
