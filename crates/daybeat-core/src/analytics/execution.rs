//! Project execution scorecard.
//!
//! Execution is the mean of two component percentages: time logged
//! against time scheduled across the project's activities, and
//! milestones done against milestones set. A component with a zero
//! denominator contributes 0, so a project with no activities and no
//! reminders scores 0, not NaN.

use serde::{Deserialize, Serialize};

use crate::entity::{Activity, ActivityStatus, Project, ProjectStatus};

/// Execution figures for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectExecution {
    pub project_name: String,
    pub status: ProjectStatus,
    pub milestones_set: u32,
    pub milestones_done: u32,
    /// Logged/scheduled minutes across the project's activities, in percent.
    pub time_pct: f64,
    /// Done/set milestones, in percent.
    pub milestone_pct: f64,
    /// Mean of the two components.
    pub execution_pct: f64,
}

/// Score every non-deleted project.
pub fn project_execution(projects: &[Project], activities: &[Activity]) -> Vec<ProjectExecution> {
    projects
        .iter()
        .filter(|p| !p.deleted)
        .map(|project| {
            let mut scheduled = 0i64;
            let mut spent = 0i64;
            for activity in activities.iter().filter(|a| {
                !a.deleted && a.project.as_deref() == Some(project.name.as_str())
            }) {
                scheduled += activity.scheduled_minutes();
                if activity.status == ActivityStatus::Completed {
                    spent += activity.time_spent;
                }
            }

            let time_pct = if scheduled > 0 {
                spent as f64 / scheduled as f64 * 100.0
            } else {
                0.0
            };
            let milestone_pct = if project.milestones_set > 0 {
                project.milestones_done as f64 / project.milestones_set as f64 * 100.0
            } else {
                0.0
            };

            ProjectExecution {
                project_name: project.name.clone(),
                status: project.status,
                milestones_set: project.milestones_set,
                milestones_done: project.milestones_done,
                time_pct,
                milestone_pct,
                execution_pct: (time_pct + milestone_pct) / 2.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Mode, Priority, Recurrence};
    use chrono::{Duration, TimeZone, Utc};

    fn project(name: &str, set: u32, done: u32) -> Project {
        Project {
            id: 1,
            name: name.into(),
            mode: Mode::Work,
            status: ProjectStatus::Active,
            milestones_set: set,
            milestones_done: done,
            deleted: false,
        }
    }

    fn activity(id: EntityId, project: &str, minutes: i64, spent: Option<i64>) -> Activity {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        Activity {
            id,
            name: format!("A{id}"),
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            priority: Priority::Medium,
            mode: Mode::Work,
            project: Some(project.into()),
            recurrence: Recurrence::None,
            status: if spent.is_some() {
                ActivityStatus::Completed
            } else {
                ActivityStatus::Pending
            },
            actual_start: None,
            actual_end: None,
            time_spent: spent.unwrap_or(0),
            deleted: false,
        }
    }

    #[test]
    fn execution_is_the_mean_of_both_components() {
        let projects = vec![project("Thesis", 4, 2)];
        let activities = vec![
            activity(1, "Thesis", 120, Some(60)),
            activity(2, "Thesis", 60, None),
        ];
        let scores = project_execution(&projects, &activities);
        // 60/180 minutes and 2/4 milestones.
        assert!((scores[0].time_pct - 100.0 / 3.0).abs() < 1e-9);
        assert!((scores[0].milestone_pct - 50.0).abs() < 1e-9);
        assert!((scores[0].execution_pct - (100.0 / 3.0 + 50.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_project_scores_zero_not_nan() {
        let scores = project_execution(&[project("Idle", 0, 0)], &[]);
        assert_eq!(scores[0].time_pct, 0.0);
        assert_eq!(scores[0].milestone_pct, 0.0);
        assert_eq!(scores[0].execution_pct, 0.0);
    }

    #[test]
    fn unrelated_and_deleted_activities_are_ignored() {
        let projects = vec![project("Thesis", 0, 0)];
        let mut stray = activity(1, "Other", 60, Some(60));
        stray.project = Some("Other".into());
        let mut gone = activity(2, "Thesis", 60, Some(60));
        gone.deleted = true;

        let scores = project_execution(&projects, &[stray, gone]);
        assert_eq!(scores[0].time_pct, 0.0);
    }
}
