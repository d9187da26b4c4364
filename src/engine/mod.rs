//! Aggregation and reconciliation engine
//!
//! Pure, synchronous computations over a [`Snapshot`] of one user's records:
//!
//! - `category_tree`: forest reconstruction with orphan and cycle handling
//! - `rollup`: totals by kind, by root and by exact category
//! - `period_bucket`: weekly or monthly flow series
//! - `reconcile`: budget versus actual per category
//! - `drill_down`: a root's distribution over its sub-categories
//! - `budget_editor`: dirty tracking and upsert planning for budget edits
//! - `pipeline`: full dashboard recompute and stale-result gating

pub mod anomaly;
pub mod budget_editor;
pub mod category_tree;
pub mod drill_down;
pub mod period_bucket;
pub mod pipeline;
pub mod reconcile;
pub mod rollup;

pub use anomaly::Anomaly;
pub use budget_editor::{plan_upsert, BudgetChange, BudgetEditor, BudgetWrite};
pub use category_tree::{CategoryNode, CategoryTree};
pub use drill_down::DrillDownProjector;
pub use period_bucket::{sort_calendar, BucketKey, FlowBucket, Granularity, PeriodBucketer};
pub use pipeline::{
    recompute, Dashboard, DashboardRequest, DrillDown, Generation, RecomputeGate, ReportWindow,
    Snapshot,
};
pub use reconcile::{BudgetLine, BudgetReconciler, Reconciliation};
pub use rollup::{Rollup, RollupAggregator, Slice, TypeTotals};
