//! Display formatting for terminal output

pub mod budget;
pub mod dashboard;
pub mod report;

pub use budget::format_budget_table;
pub use dashboard::{format_anomalies, format_drill_down, format_flow, format_summary};
