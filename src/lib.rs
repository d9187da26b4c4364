//! Sikai - personal finance aggregation and reconciliation
//!
//! Turns one user's flat categories, transactions and monthly budgets into
//! dashboard views: totals by type, per-root and per-category rollups,
//! weekly or monthly flow series, sub-category drill-downs and a budget
//! versus actual reconciliation.
//!
//! # Architecture
//!
//! - `models`: records as stored (categories, transactions, budgets, money)
//! - `engine`: pure aggregation over a snapshot of those records
//! - `storage`: JSON file store with atomic writes
//! - `config`: data directory and user settings
//! - `display`: terminal formatting
//! - `cli`: command handlers for the `sikai` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use sikai::engine::{recompute, DashboardRequest, ReportWindow};
//! use sikai::storage::JsonStore;
//!
//! let store = JsonStore::open(sikai::config::SikaiPaths::new()?)?;
//! let snapshot = store.load_snapshot(user_id)?;
//! let dashboard = recompute(&snapshot, &DashboardRequest::new(ReportWindow::Year(2025)))?;
//! ```

use std::sync::Once;

pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod storage;

pub use error::{SikaiError, SikaiResult};

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber once
///
/// Filter directives come from `SIKAI_LOG`, then `RUST_LOG`, defaulting to
/// `sikai=warn`. Output goes to stderr so report output stays clean.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_env("SIKAI_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("sikai=warn"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
