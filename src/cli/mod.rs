//! CLI command handlers
//!
//! Bridges clap argument parsing with the engine and the JSON store.

pub mod budget;
pub mod report;

pub use budget::{handle_budget_command, BudgetCommands};
pub use report::{handle_report_command, ReportCommands, WindowArgs};

use serde::Serialize;

use crate::config::settings::Settings;
use crate::engine::{CategoryTree, Snapshot};
use crate::error::{SikaiError, SikaiResult};
use crate::models::{Category, CategoryId, MonthKey, UserId};
use crate::storage::JsonStore;

/// State shared by every command
pub struct CommandContext {
    pub store: JsonStore,
    pub settings: Settings,
    /// User given on the command line; falls back to the configured user
    pub user_id: Option<UserId>,
    /// Print results as JSON instead of tables
    pub json: bool,
}

impl CommandContext {
    /// Load the snapshot of the user being reported on
    pub fn snapshot(&self) -> SikaiResult<Snapshot> {
        let user = self
            .store
            .resolve_user(self.user_id.or(self.settings.user_id))?;
        self.store.load_snapshot(user)
    }
}

/// Find a category by id or case-insensitive name
pub fn resolve_category<'a>(tree: &'a CategoryTree, query: &str) -> SikaiResult<&'a Category> {
    if let Ok(id) = query.trim().parse::<CategoryId>() {
        if let Some(category) = tree.get(id) {
            return Ok(category);
        }
    }
    tree.find_by_name(query)
        .ok_or_else(|| SikaiError::category_not_found(query))
}

/// Parse a "YYYY-MM" month, defaulting to the current month
pub fn parse_month(month: Option<&str>) -> SikaiResult<MonthKey> {
    match month {
        Some(s) => MonthKey::parse(s)
            .map_err(|e| SikaiError::Validation(format!("Invalid month '{}': {}", s, e))),
        None => Ok(MonthKey::current()),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> SikaiResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryKind;

    #[test]
    fn test_resolve_category_by_name_or_id() {
        let user = UserId::new();
        let food = Category::new(user, "Groceries", CategoryKind::Expense);
        let tree = CategoryTree::build(&[food.clone()]);

        assert_eq!(resolve_category(&tree, "groceries").unwrap().id, food.id);
        assert_eq!(resolve_category(&tree, &food.id.to_string()).unwrap().id, food.id);
        assert!(resolve_category(&tree, "rent").unwrap_err().is_not_found());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month(Some("2025-07")).unwrap(), MonthKey::new(2025, 7).unwrap());
        assert!(parse_month(Some("2025-13")).unwrap_err().is_validation());
        assert_eq!(parse_month(None).unwrap(), MonthKey::current());
    }
}
