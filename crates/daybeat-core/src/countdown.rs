//! Countdown projection.
//!
//! `project` is a pure function recomputed every tick for display. The
//! list builders apply the dashboard's filtering rules, including the
//! sleep-pair rule that keeps only the nearest Bedtime and Wake Up entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Activity, ActivityStatus, EntityId, Mode, Reminder, ReminderStatus};

const MS_PER_DAY: i64 = 86_400_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;

/// Remaining time until `boundary`, or `None` once it has passed.
///
/// Seconds are truncated, not rounded: the string decomposes to the same
/// minute count as integer division of the millisecond delta.
pub fn project(now: DateTime<Utc>, boundary: DateTime<Utc>) -> Option<String> {
    let delta = (boundary - now).num_milliseconds();
    if delta <= 0 {
        return None;
    }
    let days = delta / MS_PER_DAY;
    let hours = (delta % MS_PER_DAY) / MS_PER_HOUR;
    let minutes = (delta % MS_PER_HOUR) / MS_PER_MINUTE;
    if days > 0 {
        Some(format!("{days:02}d:{hours:02}h:{minutes:02}m"))
    } else {
        Some(format!("{hours:02}h:{minutes:02}m"))
    }
}

/// One row of a countdown list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownEntry {
    pub id: EntityId,
    pub name: String,
    pub boundary: DateTime<Utc>,
    pub remaining: String,
}

/// Upcoming activities: pending, not yet started, Sleep mode excluded
/// (its reminder pair carries the countdown instead), nearest first.
pub fn activity_countdowns(now: DateTime<Utc>, activities: &[Activity]) -> Vec<CountdownEntry> {
    let mut entries: Vec<CountdownEntry> = activities
        .iter()
        .filter(|a| {
            !a.deleted
                && a.status == ActivityStatus::Pending
                && a.actual_start.is_none()
                && a.mode != Mode::Sleep
        })
        .filter(|a| {
            if !a.is_well_formed() {
                tracing::warn!(id = a.id, "skipping unnamed activity in countdown list");
                return false;
            }
            true
        })
        .filter_map(|a| {
            let remaining = project(now, a.start_time)?;
            Some(CountdownEntry {
                id: a.id,
                name: a.name.clone(),
                boundary: a.start_time,
                remaining,
            })
        })
        .collect();
    entries.sort_by_key(|e| e.boundary);
    entries
}

/// Upcoming reminders with the pair rule applied: every non-paired
/// reminder, plus at most the nearest Bedtime and the nearest Wake Up,
/// re-sorted by due instant.
pub fn reminder_countdowns(now: DateTime<Utc>, reminders: &[Reminder]) -> Vec<CountdownEntry> {
    let upcoming: Vec<&Reminder> = reminders
        .iter()
        .filter(|r| !r.deleted && r.status == ReminderStatus::NotYet)
        .filter(|r| {
            if !r.is_well_formed() {
                tracing::warn!(id = r.id, "skipping unnamed reminder in countdown list");
                return false;
            }
            true
        })
        .filter(|r| r.end_time > now)
        .collect();

    let nearest_bedtime = upcoming
        .iter()
        .filter(|r| r.is_bedtime())
        .min_by_key(|r| r.end_time)
        .map(|r| r.id);
    let nearest_wake_up = upcoming
        .iter()
        .filter(|r| r.is_wake_up())
        .min_by_key(|r| r.end_time)
        .map(|r| r.id);

    let mut entries: Vec<CountdownEntry> = upcoming
        .into_iter()
        .filter(|r| {
            if r.is_bedtime() {
                Some(r.id) == nearest_bedtime
            } else if r.is_wake_up() {
                Some(r.id) == nearest_wake_up
            } else {
                true
            }
        })
        .filter_map(|r| {
            let remaining = project(now, r.end_time)?;
            Some(CountdownEntry {
                id: r.id,
                name: r.name.clone(),
                boundary: r.end_time,
                remaining,
            })
        })
        .collect();
    entries.sort_by_key(|e| e.boundary);
    entries
}
