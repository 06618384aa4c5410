//! Trailing-window schedule report.
//!
//! Looks back over a trailing window (default 7 days) and buckets every
//! in-window activity by its logged/scheduled ratio:
//! - **Overshot**: ratio above 100%
//! - **Met**: ratio exactly 100%
//! - **Underutilised**: ratio strictly between 0 and 100%
//!
//! A 0 ratio lands in no bucket; the record only counts toward
//! `activities_considered`. Activities enter the window by start time,
//! reminders by due time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Activity, ActivityStatus, Mode, Reminder, ReminderStatus};

/// Ratio bucket counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioBuckets {
    pub overshot: u32,
    pub underutilised: u32,
    pub met: u32,
}

/// Hours of completed activity time per mode within the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeHours {
    pub work: f64,
    pub sleep: f64,
    pub relax: f64,
}

/// Complete window rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// Window length the report was computed with.
    pub window_days: i64,
    /// Non-deleted activities whose start fell in the window.
    pub activities_considered: u32,
    pub buckets: RatioBuckets,
    pub hours_spent: ModeHours,
    /// In-window reminders marked Done.
    pub milestones_done: u32,
    /// Done reminders completed after their due instant.
    pub milestones_lapsed: u32,
}

/// Analyzer for the trailing window.
#[derive(Debug, Clone)]
pub struct WeeklyReportAnalyzer {
    /// Trailing window length in days.
    pub window_days: i64,
}

impl Default for WeeklyReportAnalyzer {
    fn default() -> Self {
        Self { window_days: 7 }
    }
}

impl WeeklyReportAnalyzer {
    /// Create a new analyzer with the default 7-day window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new analyzer with a custom window length.
    pub fn with_window(window_days: i64) -> Self {
        Self { window_days }
    }

    /// Roll up the window ending at `now`.
    pub fn analyze(
        &self,
        now: DateTime<Utc>,
        activities: &[Activity],
        reminders: &[Reminder],
    ) -> WeeklyReport {
        let window_start = now - Duration::days(self.window_days);
        let mut report = WeeklyReport {
            window_days: self.window_days,
            ..Default::default()
        };

        for activity in activities
            .iter()
            .filter(|a| !a.deleted && a.start_time >= window_start && a.start_time <= now)
        {
            report.activities_considered += 1;

            let scheduled = activity.scheduled_minutes();
            let actual = if activity.status == ActivityStatus::Completed {
                activity.time_spent
            } else {
                0
            };
            let ratio = if scheduled > 0 {
                actual as f64 / scheduled as f64 * 100.0
            } else {
                0.0
            };
            if ratio > 100.0 {
                report.buckets.overshot += 1;
            } else if ratio == 100.0 {
                report.buckets.met += 1;
            } else if ratio > 0.0 {
                report.buckets.underutilised += 1;
            }

            if activity.status == ActivityStatus::Completed {
                let hours = activity.time_spent as f64 / 60.0;
                match activity.mode {
                    Mode::Work => report.hours_spent.work += hours,
                    Mode::Sleep => report.hours_spent.sleep += hours,
                    Mode::Relax => report.hours_spent.relax += hours,
                }
            }
        }

        for reminder in reminders
            .iter()
            .filter(|r| !r.deleted && r.end_time >= window_start && r.end_time <= now)
        {
            if reminder.status == ReminderStatus::Done {
                report.milestones_done += 1;
                let lapsed = reminder
                    .actual_end
                    .map(|end| end > reminder.end_time)
                    .unwrap_or(false);
                if lapsed {
                    report.milestones_lapsed += 1;
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Priority, Recurrence};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap()
    }

    fn activity(id: EntityId, days_ago: i64, scheduled: i64, spent: Option<i64>) -> Activity {
        let start = now() - Duration::days(days_ago);
        Activity {
            id,
            name: format!("A{id}"),
            start_time: start,
            end_time: start + Duration::minutes(scheduled),
            priority: Priority::Medium,
            mode: Mode::Work,
            project: None,
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

    fn done_reminder(id: EntityId, days_ago: i64, lapsed_by_min: i64) -> Reminder {
        let due = now() - Duration::days(days_ago);
        Reminder {
            id,
            name: format!("R{id}"),
            end_time: due,
            priority: Priority::Medium,
            mode: Mode::Work,
            project: None,
            recurrence: Recurrence::None,
            status: ReminderStatus::Done,
            actual_end: Some(due + Duration::minutes(lapsed_by_min)),
            time_spent: 0,
            deleted: false,
        }
    }

    #[test]
    fn overspent_activity_lands_in_overshot() {
        let analyzer = WeeklyReportAnalyzer::new();
        let report = analyzer.analyze(now(), &[activity(1, 2, 120, Some(150))], &[]);
        assert_eq!(report.activities_considered, 1);
        assert_eq!(report.buckets.overshot, 1);
        assert_eq!(report.buckets.met, 0);
        assert_eq!(report.buckets.underutilised, 0);
        assert!((report.hours_spent.work - 2.5).abs() < 1e-9);
    }

    #[test]
    fn buckets_split_met_under_and_uncounted() {
        let analyzer = WeeklyReportAnalyzer::new();
        let report = analyzer.analyze(
            now(),
            &[
                activity(1, 1, 60, Some(60)), // met
                activity(2, 2, 60, Some(30)), // underutilised
                activity(3, 3, 60, None),     // 0 ratio, no bucket
            ],
            &[],
        );
        assert_eq!(report.activities_considered, 3);
        assert_eq!(report.buckets.met, 1);
        assert_eq!(report.buckets.underutilised, 1);
        assert_eq!(report.buckets.overshot, 0);
    }

    #[test]
    fn records_outside_the_window_are_ignored() {
        let analyzer = WeeklyReportAnalyzer::new();
        let report = analyzer.analyze(
            now(),
            &[activity(1, 8, 60, Some(60))],
            &[done_reminder(1, 9, 0)],
        );
        assert_eq!(report.activities_considered, 0);
        assert_eq!(report.milestones_done, 0);
    }

    #[test]
    fn lapsed_counts_only_late_completions() {
        let analyzer = WeeklyReportAnalyzer::new();
        let report = analyzer.analyze(
            now(),
            &[],
            &[done_reminder(1, 1, 0), done_reminder(2, 2, 45)],
        );
        assert_eq!(report.milestones_done, 2);
        assert_eq!(report.milestones_lapsed, 1);
    }

    #[test]
    fn window_length_is_configurable() {
        let analyzer = WeeklyReportAnalyzer::with_window(14);
        let report = analyzer.analyze(now(), &[activity(1, 8, 60, Some(60))], &[]);
        assert_eq!(report.window_days, 14);
        assert_eq!(report.activities_considered, 1);
        assert_eq!(report.buckets.met, 1);
    }
}
