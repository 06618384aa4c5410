//! Natural-language intent bridge.
//!
//! The conversational collaborator translates user text into small
//! tagged JSON commands, `{"action": "add_activity", "data": {...}}`.
//! This module parses and applies them. Every `data` field is optional;
//! missing fields take the interactive defaults, so a bare payload
//! still lands a usable record. Invalid values are reported, never
//! corrected.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{
    Activity, ActivityDraft, ActivityStatus, Mode, Priority, Recurrence, Reminder, ReminderDraft,
    ReminderStatus,
};
use crate::error::Result;
use crate::store::EntityStore;

/// One parsed intent command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum IntentCommand {
    #[serde(rename_all = "camelCase")]
    AddActivity {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        start_time: Option<DateTime<Utc>>,
        #[serde(default)]
        end_time: Option<DateTime<Utc>>,
        #[serde(default)]
        priority: Option<Priority>,
        #[serde(default)]
        mode: Option<Mode>,
        #[serde(default)]
        project: Option<String>,
        #[serde(default)]
        recurrence: Option<Recurrence>,
    },
    #[serde(rename_all = "camelCase")]
    AddReminder {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        end_time: Option<DateTime<Utc>>,
        #[serde(default)]
        priority: Option<Priority>,
        #[serde(default)]
        mode: Option<Mode>,
        #[serde(default)]
        project: Option<String>,
        #[serde(default)]
        recurrence: Option<Recurrence>,
    },
    QuerySchedule {},
}

/// Reply to one intent command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentReply {
    /// Human-readable confirmation or listing.
    pub message: String,
    /// Up to three nearest upcoming activities (schedule queries only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
    /// Up to three nearest upcoming reminders (schedule queries only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reminders: Vec<Reminder>,
}

impl IntentReply {
    fn text(message: String) -> Self {
        Self {
            message,
            activities: Vec::new(),
            reminders: Vec::new(),
        }
    }
}

/// Parse a raw intent payload.
pub fn parse(payload: &str) -> Result<IntentCommand> {
    Ok(serde_json::from_str(payload)?)
}

/// Apply a command against the store as of `now`.
pub fn apply(
    store: &mut EntityStore,
    command: IntentCommand,
    now: DateTime<Utc>,
) -> Result<IntentReply> {
    match command {
        IntentCommand::AddActivity {
            name,
            start_time,
            end_time,
            priority,
            mode,
            project,
            recurrence,
        } => {
            let start = start_time.unwrap_or(now);
            let draft = ActivityDraft {
                name: name.unwrap_or_else(|| "New Activity".to_string()),
                start_time: start,
                end_time: end_time.unwrap_or(start + Duration::hours(1)),
                priority: priority.unwrap_or(Priority::Medium),
                mode: mode.unwrap_or(Mode::Work),
                project,
                recurrence: recurrence.unwrap_or(Recurrence::None),
            };
            let (activity, _) = store.add_activity(draft)?;
            Ok(IntentReply::text(format!(
                "Added activity: {} on {}",
                activity.name,
                activity.start_time.format("%Y-%m-%d %H:%M")
            )))
        }
        IntentCommand::AddReminder {
            name,
            end_time,
            priority,
            mode,
            project,
            recurrence,
        } => {
            let draft = ReminderDraft {
                name: name.unwrap_or_else(|| "New Reminder".to_string()),
                end_time: end_time.unwrap_or(now),
                priority: priority.unwrap_or(Priority::Medium),
                mode: mode.unwrap_or(Mode::Work),
                project,
                recurrence: recurrence.unwrap_or(Recurrence::None),
            };
            let reminder = store.add_reminder(draft)?;
            Ok(IntentReply::text(format!(
                "Added reminder: {} due on {}",
                reminder.name,
                reminder.end_time.format("%Y-%m-%d %H:%M")
            )))
        }
        IntentCommand::QuerySchedule {} => Ok(query_schedule(store, now)),
    }
}

/// The three nearest upcoming activities and reminders, each ascending
/// by boundary instant.
fn query_schedule(store: &EntityStore, now: DateTime<Utc>) -> IntentReply {
    let mut activities: Vec<Activity> = store
        .activities()
        .into_iter()
        .filter(|a| a.status == ActivityStatus::Pending && a.start_time > now)
        .collect();
    activities.sort_by_key(|a| a.start_time);
    activities.truncate(3);

    let mut reminders: Vec<Reminder> = store
        .reminders()
        .into_iter()
        .filter(|r| r.status == ReminderStatus::NotYet && r.end_time > now)
        .collect();
    reminders.sort_by_key(|r| r.end_time);
    reminders.truncate(3);

    if activities.is_empty() && reminders.is_empty() {
        return IntentReply::text("You have no upcoming activities or reminders.".to_string());
    }

    let mut lines = vec!["Here is your upcoming schedule:".to_string()];
    for activity in &activities {
        lines.push(format!(
            "- Activity: {} at {}",
            activity.name,
            activity.start_time.format("%Y-%m-%d %H:%M")
        ));
    }
    for reminder in &reminders {
        lines.push(format!(
            "- Reminder: {} due {}",
            reminder.name,
            reminder.end_time.format("%Y-%m-%d %H:%M")
        ));
    }

    IntentReply {
        message: lines.join("\n"),
        activities,
        reminders,
    }
}
