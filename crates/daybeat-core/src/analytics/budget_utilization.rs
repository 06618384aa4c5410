//! Weekly budget utilization.
//!
//! Compares the hours actually logged by completed activities against the
//! weekly hour goal of each mode. A mode with a zero goal reports 0%
//! utilization no matter what was logged.

use serde::{Deserialize, Serialize};

use crate::budget::BudgetAllocation;
use crate::entity::{Activity, ActivityStatus, Mode};

/// Utilization of one mode's weekly budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeUtilization {
    pub mode: Mode,
    /// Weekly goal in hours.
    pub goal_hours: f64,
    /// Hours logged by completed activities of this mode.
    pub actual_hours: f64,
    /// actual/goal in percent; 0 when the goal is 0.
    pub utilization_pct: f64,
}

/// Roll up utilization for every mode, in display order.
pub fn mode_utilization(
    allocation: &BudgetAllocation,
    activities: &[Activity],
) -> Vec<ModeUtilization> {
    Mode::ALL
        .iter()
        .map(|&mode| {
            let minutes: i64 = activities
                .iter()
                .filter(|a| {
                    !a.deleted && a.mode == mode && a.status == ActivityStatus::Completed
                })
                .map(|a| a.time_spent)
                .sum();
            let actual_hours = minutes as f64 / 60.0;
            let goal_hours = allocation.hours_for(mode);
            let utilization_pct = if goal_hours > 0.0 {
                actual_hours / goal_hours * 100.0
            } else {
                0.0
            };
            ModeUtilization {
                mode,
                goal_hours,
                actual_hours,
                utilization_pct,
            }
        })
        .collect()
}
