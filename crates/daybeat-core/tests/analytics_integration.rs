//! Integration tests for the analytics rollups.
//!
//! These tests build realistic records through the store and verify the
//! budget, completion, execution and weekly report numbers computed over
//! the live collections, so the store's completion writes and milestone
//! recomputation feed the analyzers exactly as the runtime does.

use chrono::{DateTime, Duration, TimeZone, Utc};
use daybeat_core::analytics::{
    group_completion, mode_utilization, project_execution, WeeklyReportAnalyzer,
};
use daybeat_core::{
    ActivityDraft, ActivityPatch, BudgetAllocation, EntityStore, Mode, Priority, ProjectDraft,
    Recurrence, ReminderDraft,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap()
}

fn draft(name: &str, mode: Mode, start: DateTime<Utc>, minutes: i64) -> ActivityDraft {
    ActivityDraft {
        name: name.to_string(),
        start_time: start,
        end_time: start + Duration::minutes(minutes),
        priority: Priority::Medium,
        mode,
        project: None,
        recurrence: Recurrence::None,
    }
}

fn reminder_draft(name: &str, due: DateTime<Utc>, project: Option<&str>) -> ReminderDraft {
    ReminderDraft {
        name: name.to_string(),
        end_time: due,
        priority: Priority::Medium,
        mode: Mode::Work,
        project: project.map(str::to_string),
        recurrence: Recurrence::None,
    }
}

#[test]
fn test_mode_utilization_counts_only_completed_time() {
    let mut store = EntityStore::new();
    let allocation = BudgetAllocation::assign(40.0, 56.0, 30.0).unwrap();

    let (done_60, _) = store
        .add_activity(draft("Design review", Mode::Work, now() - Duration::days(1), 60))
        .unwrap();
    let (done_90, _) = store
        .add_activity(draft("Pairing", Mode::Work, now() - Duration::days(2), 90))
        .unwrap();
    store
        .add_activity(draft("Planning", Mode::Work, now() + Duration::days(1), 120))
        .unwrap();
    let (relax, _) = store
        .add_activity(draft("Hike", Mode::Relax, now() - Duration::days(1), 90))
        .unwrap();

    store.complete_activity(done_60.id).unwrap();
    store.complete_activity(done_90.id).unwrap();
    store.complete_activity(relax.id).unwrap();

    let rows = mode_utilization(&allocation, store.all_activities());
    assert_eq!(rows.len(), 3);

    // Work: 150 logged minutes against a 40 h goal. The pending entry
    // contributes nothing.
    assert_eq!(rows[0].mode, Mode::Work);
    assert!((rows[0].actual_hours - 2.5).abs() < 1e-9);
    assert!((rows[0].utilization_pct - 6.25).abs() < 1e-9);

    // Sleep: goal set, nothing logged.
    assert_eq!(rows[1].mode, Mode::Sleep);
    assert_eq!(rows[1].goal_hours, 56.0);
    assert_eq!(rows[1].actual_hours, 0.0);
    assert_eq!(rows[1].utilization_pct, 0.0);

    assert_eq!(rows[2].mode, Mode::Relax);
    assert!((rows[2].utilization_pct - 5.0).abs() < 1e-9);
}

#[test]
fn test_budget_reallocation_shifts_utilization() {
    let mut store = EntityStore::new();
    let (work, _) = store
        .add_activity(draft("Audit", Mode::Work, now() - Duration::days(1), 120))
        .unwrap();
    store.complete_activity(work.id).unwrap();

    let before = mode_utilization(
        &BudgetAllocation::assign(40.0, 56.0, 30.0).unwrap(),
        store.all_activities(),
    );
    let after = mode_utilization(
        &BudgetAllocation::assign(20.0, 56.0, 30.0).unwrap(),
        store.all_activities(),
    );

    // Halving the goal doubles the percentage over the same records.
    assert!((before[0].utilization_pct - 5.0).abs() < 1e-9);
    assert!((after[0].utilization_pct - 10.0).abs() < 1e-9);
}

#[test]
fn test_group_completion_follows_store_edits() {
    let mut store = EntityStore::new();

    let (gym_monday, _) = store
        .add_activity(draft("Gym", Mode::Relax, now() - Duration::days(2), 60))
        .unwrap();
    store
        .add_activity(draft("Gym", Mode::Relax, now() - Duration::days(1), 60))
        .unwrap();
    let (deep_work, _) = store
        .add_activity(draft("Deep work", Mode::Work, now() - Duration::days(1), 90))
        .unwrap();
    store
        .update_activity(
            deep_work.id,
            &ActivityPatch {
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .unwrap();
    store.complete_activity(gym_monday.id).unwrap();

    let groups = group_completion(&store.activities());
    assert_eq!(groups.len(), 2);

    // High outranks the repeated Medium entries.
    assert_eq!(groups[0].name, "Deep work");
    assert_eq!(groups[0].priority, Priority::High);
    assert_eq!(groups[0].count, 1);
    assert_eq!(groups[0].completion_pct, 0.0);

    assert_eq!(groups[1].name, "Gym (2)");
    assert_eq!(groups[1].count, 2);
    assert_eq!(groups[1].total_time_set, 120);
    assert_eq!(groups[1].total_time_spent, 60);
    assert!((groups[1].completion_pct - 50.0).abs() < 1e-9);
}

#[test]
fn test_project_execution_reflects_milestone_completion() {
    let mut store = EntityStore::new();
    store
        .add_project(ProjectDraft {
            name: "Thesis".to_string(),
            mode: Mode::Work,
        })
        .unwrap();

    let (ch1, _) = store
        .add_activity(ActivityDraft {
            project: Some("Thesis".to_string()),
            ..draft("Draft ch1", Mode::Work, now() - Duration::days(3), 60)
        })
        .unwrap();
    store
        .add_activity(ActivityDraft {
            project: Some("Thesis".to_string()),
            ..draft("Draft ch2", Mode::Work, now() - Duration::days(1), 60)
        })
        .unwrap();
    let outline = store
        .add_reminder(reminder_draft("Submit outline", now() - Duration::days(2), Some("Thesis")))
        .unwrap();
    let full_draft = store
        .add_reminder(reminder_draft("Submit draft", now() + Duration::days(4), Some("Thesis")))
        .unwrap();

    store.complete_activity(ch1.id).unwrap();
    store.complete_reminder(outline.id).unwrap();

    // Milestone counts were recomputed by the reminder writes.
    let project = store.project_by_name("Thesis").unwrap();
    assert_eq!(project.milestones_set, 2);
    assert_eq!(project.milestones_done, 1);

    let rows = project_execution(&store.projects(), store.all_activities());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].project_name, "Thesis");
    assert!((rows[0].time_pct - 50.0).abs() < 1e-9);
    assert!((rows[0].milestone_pct - 50.0).abs() < 1e-9);
    assert!((rows[0].execution_pct - 50.0).abs() < 1e-9);

    // Finishing the second milestone lifts only the milestone component.
    store.complete_reminder(full_draft.id).unwrap();
    let rows = project_execution(&store.projects(), store.all_activities());
    assert!((rows[0].milestone_pct - 100.0).abs() < 1e-9);
    assert!((rows[0].execution_pct - 75.0).abs() < 1e-9);
}

#[test]
fn test_weekly_report_over_store_built_records() {
    let mut store = EntityStore::new();

    // Met: completed as scheduled.
    let (met, _) = store
        .add_activity(draft("Standup", Mode::Work, now() - Duration::days(1), 60))
        .unwrap();
    store.complete_activity(met.id).unwrap();

    // Overshot: completed, then the log corrected upward.
    let (over, _) = store
        .add_activity(draft("Refactor", Mode::Work, now() - Duration::days(2), 120))
        .unwrap();
    store.complete_activity(over.id).unwrap();
    store
        .update_activity(
            over.id,
            &ActivityPatch {
                time_spent: Some(150),
                ..Default::default()
            },
        )
        .unwrap();

    // Underutilised: completed, then the log corrected downward.
    let (under, _) = store
        .add_activity(draft("Reading", Mode::Work, now() - Duration::days(3), 60))
        .unwrap();
    store.complete_activity(under.id).unwrap();
    store
        .update_activity(
            under.id,
            &ActivityPatch {
                time_spent: Some(30),
                ..Default::default()
            },
        )
        .unwrap();

    // Considered but unbucketed: still pending.
    store
        .add_activity(draft("Backlog grooming", Mode::Work, now() - Duration::days(4), 60))
        .unwrap();

    // Outside the window entirely.
    let (old, _) = store
        .add_activity(draft("Last sprint", Mode::Work, now() - Duration::days(8), 60))
        .unwrap();
    store.complete_activity(old.id).unwrap();

    // Milestones: one done on time, one done 45 minutes late, one still open.
    let on_time = store
        .add_reminder(reminder_draft("Send invoice", now() - Duration::days(1), None))
        .unwrap();
    store.complete_reminder(on_time.id).unwrap();
    let late_due = now() - Duration::days(2);
    let late = store.add_reminder(reminder_draft("File taxes", late_due, None)).unwrap();
    store.finish_reminder(late.id, late_due + Duration::minutes(45)).unwrap();
    store
        .add_reminder(reminder_draft("Renew passport", now() - Duration::hours(3), None))
        .unwrap();

    let report =
        WeeklyReportAnalyzer::new().analyze(now(), store.all_activities(), store.all_reminders());

    assert_eq!(report.window_days, 7);
    assert_eq!(report.activities_considered, 4);
    assert_eq!(report.buckets.met, 1);
    assert_eq!(report.buckets.overshot, 1);
    assert_eq!(report.buckets.underutilised, 1);

    // 60 + 150 + 30 logged minutes, all Work.
    assert!((report.hours_spent.work - 4.0).abs() < 1e-9);
    assert_eq!(report.hours_spent.sleep, 0.0);
    assert_eq!(report.hours_spent.relax, 0.0);

    assert_eq!(report.milestones_done, 2);
    assert_eq!(report.milestones_lapsed, 1);
}
