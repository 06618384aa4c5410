//! Analytics over the entity store.
//!
//! Pure rollups over entity snapshots: weekly budget utilization,
//! grouped activity completion, project execution scores and the
//! trailing-window schedule report. Every ratio with a zero denominator
//! is a defined 0, never NaN, so the dashboards render without guards.

mod budget_utilization;
mod completion;
mod execution;
mod weekly_report;

pub use budget_utilization::{mode_utilization, ModeUtilization};
pub use completion::{group_completion, ActivityGroup};
pub use execution::{project_execution, ProjectExecution};
pub use weekly_report::{ModeHours, RatioBuckets, WeeklyReport, WeeklyReportAnalyzer};
