//! Schedule entities: activities, reminders, projects.
//!
//! All records serialize in the camelCase wire form the UI collaborator
//! speaks (`startTime`, `actualEnd`, `timeSpent`, ...). Records are never
//! hard-deleted; the `deleted` flag suppresses them from active views and
//! from the trigger scan while preserving history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Store-assigned record identifier, unique across all entity kinds.
pub type EntityId = u64;

/// Name suffix of the bedtime half of a sleep reminder pair.
pub const BEDTIME_SUFFIX: &str = " - Bedtime";
/// Name suffix of the wake-up half of a sleep reminder pair.
pub const WAKE_UP_SUFFIX: &str = " - Wake Up";

// ── Enums ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Sort rank used by grouped views: High=3, Medium=2, Low=1.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Work,
    Sleep,
    Relax,
}

impl Mode {
    /// All modes in display order.
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::Sleep, Mode::Relax];
}

/// Informational recurrence tag. It does not auto-generate future
/// instances; the trigger engine watches only the stored instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityStatus {
    Pending,
    Completed,
}

impl ActivityStatus {
    /// Status moves forward only: Pending -> Completed, never back.
    pub fn can_transition_to(self, next: ActivityStatus) -> bool {
        self == next || matches!((self, next), (ActivityStatus::Pending, ActivityStatus::Completed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderStatus {
    #[serde(rename = "Not Yet")]
    NotYet,
    Done,
}

impl ReminderStatus {
    /// Status moves forward only: Not Yet -> Done, never back.
    pub fn can_transition_to(self, next: ReminderStatus) -> bool {
        self == next || matches!((self, next), (ReminderStatus::NotYet, ReminderStatus::Done))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Done,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Work => write!(f, "Work"),
            Mode::Sleep => write!(f, "Sleep"),
            Mode::Relax => write!(f, "Relax"),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::None => write!(f, "None"),
            Recurrence::Daily => write!(f, "Daily"),
            Recurrence::Weekly => write!(f, "Weekly"),
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityStatus::Pending => write!(f, "Pending"),
            ActivityStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderStatus::NotYet => write!(f, "Not Yet"),
            ReminderStatus::Done => write!(f, "Done"),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "Active"),
            ProjectStatus::Done => write!(f, "Done"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" => Ok(Mode::Work),
            "sleep" => Ok(Mode::Sleep),
            "relax" => Ok(Mode::Relax),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            other => Err(format!("unknown recurrence: {other}")),
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────

/// A scheduled task bounded by a start and an end instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: EntityId,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub priority: Priority,
    pub mode: Mode,
    /// Project reference by name, not id.
    #[serde(default)]
    pub project: Option<String>,
    pub recurrence: Recurrence,
    pub status: ActivityStatus,
    /// Set when the activity is acknowledged as started (confirm or
    /// auto-resolution); also the trigger engine's durable done-marker.
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
    /// Minutes actually spent; 0 until completion.
    #[serde(default)]
    pub time_spent: i64,
    #[serde(default)]
    pub deleted: bool,
}

impl Activity {
    /// Scheduled duration in whole minutes.
    pub fn scheduled_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes().max(0)
    }

    /// Records with a blank name are skipped by the trigger scan and the
    /// countdown lists rather than processed.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// A deadline task bounded by a single due instant (`endTime`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: EntityId,
    pub name: String,
    /// The due instant.
    pub end_time: DateTime<Utc>,
    pub priority: Priority,
    pub mode: Mode,
    #[serde(default)]
    pub project: Option<String>,
    pub recurrence: Recurrence,
    pub status: ReminderStatus,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent: i64,
    #[serde(default)]
    pub deleted: bool,
}

impl Reminder {
    pub fn is_bedtime(&self) -> bool {
        self.name.ends_with(BEDTIME_SUFFIX)
    }

    pub fn is_wake_up(&self) -> bool {
        self.name.ends_with(WAKE_UP_SUFFIX)
    }

    /// One half of an auto-created sleep pair. Display lists keep only the
    /// nearest bedtime and the nearest wake-up entry.
    pub fn is_sleep_pair(&self) -> bool {
        self.is_bedtime() || self.is_wake_up()
    }

    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// A named grouping of activities and reminders.
///
/// The milestone counts are a cache over the project's associated
/// non-deleted reminders; the store recomputes them on every write that
/// touches the reminder collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub mode: Mode,
    pub status: ProjectStatus,
    #[serde(default)]
    pub milestones_set: u32,
    #[serde(default)]
    pub milestones_done: u32,
    #[serde(default)]
    pub deleted: bool,
}

// ── Drafts ───────────────────────────────────────────────────────────

/// Input for creating an activity. The store assigns the id and the
/// initial lifecycle fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub priority: Priority,
    pub mode: Mode,
    #[serde(default)]
    pub project: Option<String>,
    pub recurrence: Recurrence,
}

impl ActivityDraft {
    /// Validate and build the record. End must be strictly after start;
    /// a violation is reported, never silently corrected.
    pub fn build(self, id: EntityId) -> Result<Activity, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.end_time <= self.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(Activity {
            id,
            name: self.name,
            start_time: self.start_time,
            end_time: self.end_time,
            priority: self.priority,
            mode: self.mode,
            project: self.project,
            recurrence: self.recurrence,
            status: ActivityStatus::Pending,
            actual_start: None,
            actual_end: None,
            time_spent: 0,
            deleted: false,
        })
    }
}

/// Input for creating a reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDraft {
    pub name: String,
    pub end_time: DateTime<Utc>,
    pub priority: Priority,
    pub mode: Mode,
    #[serde(default)]
    pub project: Option<String>,
    pub recurrence: Recurrence,
}

impl ReminderDraft {
    pub fn build(self, id: EntityId) -> Result<Reminder, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Reminder {
            id,
            name: self.name,
            end_time: self.end_time,
            priority: self.priority,
            mode: self.mode,
            project: self.project,
            recurrence: self.recurrence,
            status: ReminderStatus::NotYet,
            actual_end: None,
            time_spent: 0,
            deleted: false,
        })
    }
}

impl Activity {
    /// Drafts for the auto-created reminder pair of a Sleep activity:
    /// "<name> - Bedtime" due at the start, "<name> - Wake Up" due at the
    /// end, inheriting priority, mode, project and recurrence.
    pub fn sleep_pair_drafts(&self) -> Option<(ReminderDraft, ReminderDraft)> {
        if self.mode != Mode::Sleep {
            return None;
        }
        let bedtime = ReminderDraft {
            name: format!("{}{BEDTIME_SUFFIX}", self.name),
            end_time: self.start_time,
            priority: self.priority,
            mode: self.mode,
            project: self.project.clone(),
            recurrence: self.recurrence,
        };
        let wake_up = ReminderDraft {
            name: format!("{}{WAKE_UP_SUFFIX}", self.name),
            end_time: self.end_time,
            priority: self.priority,
            mode: self.mode,
            project: self.project.clone(),
            recurrence: self.recurrence,
        };
        Some((bedtime, wake_up))
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub mode: Mode,
}

impl ProjectDraft {
    pub fn build(self, id: EntityId) -> Result<Project, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Project {
            id,
            name: self.name,
            mode: self.mode,
            status: ProjectStatus::Active,
            milestones_set: 0,
            milestones_done: 0,
            deleted: false,
        })
    }
}

// ── Patches ──────────────────────────────────────────────────────────

/// Deserializes a field that distinguishes "absent" from "explicit null".
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Partial update for an activity. Absent fields leave the record
/// untouched; `project` accepts an explicit null to detach.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default, deserialize_with = "double_option")]
    pub project: Option<Option<String>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub status: Option<ActivityStatus>,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent: Option<i64>,
}

impl ActivityPatch {
    /// Merge into the record. The merged window is re-validated when
    /// either bound changes, and the status change must be monotonic.
    pub fn apply_to(&self, activity: &mut Activity) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName);
            }
        }
        if self.start_time.is_some() || self.end_time.is_some() {
            let start = self.start_time.unwrap_or(activity.start_time);
            let end = self.end_time.unwrap_or(activity.end_time);
            if end <= start {
                return Err(ValidationError::InvalidTimeRange { start, end });
            }
        }
        if let Some(status) = self.status {
            if !activity.status.can_transition_to(status) {
                return Err(ValidationError::InvalidTransition {
                    from: activity.status.to_string(),
                    to: status.to_string(),
                });
            }
        }

        if let Some(ref name) = self.name {
            activity.name = name.clone();
        }
        if let Some(start) = self.start_time {
            activity.start_time = start;
        }
        if let Some(end) = self.end_time {
            activity.end_time = end;
        }
        if let Some(priority) = self.priority {
            activity.priority = priority;
        }
        if let Some(mode) = self.mode {
            activity.mode = mode;
        }
        if let Some(ref project) = self.project {
            activity.project = project.clone();
        }
        if let Some(recurrence) = self.recurrence {
            activity.recurrence = recurrence;
        }
        if let Some(status) = self.status {
            activity.status = status;
        }
        if let Some(at) = self.actual_start {
            activity.actual_start = Some(at);
        }
        if let Some(at) = self.actual_end {
            activity.actual_end = Some(at);
        }
        if let Some(minutes) = self.time_spent {
            activity.time_spent = minutes.max(0);
        }
        Ok(())
    }
}

/// Partial update for a reminder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default, deserialize_with = "double_option")]
    pub project: Option<Option<String>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub status: Option<ReminderStatus>,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent: Option<i64>,
}

impl ReminderPatch {
    pub fn apply_to(&self, reminder: &mut Reminder) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName);
            }
        }
        if let Some(status) = self.status {
            if !reminder.status.can_transition_to(status) {
                return Err(ValidationError::InvalidTransition {
                    from: reminder.status.to_string(),
                    to: status.to_string(),
                });
            }
        }

        if let Some(ref name) = self.name {
            reminder.name = name.clone();
        }
        if let Some(end) = self.end_time {
            reminder.end_time = end;
        }
        if let Some(priority) = self.priority {
            reminder.priority = priority;
        }
        if let Some(mode) = self.mode {
            reminder.mode = mode;
        }
        if let Some(ref project) = self.project {
            reminder.project = project.clone();
        }
        if let Some(recurrence) = self.recurrence {
            reminder.recurrence = recurrence;
        }
        if let Some(status) = self.status {
            reminder.status = status;
        }
        if let Some(at) = self.actual_end {
            reminder.actual_end = Some(at);
        }
        if let Some(minutes) = self.time_spent {
            reminder.time_spent = minutes.max(0);
        }
        Ok(())
    }
}

/// Partial update for a project. Renames do not cascade to records
/// referencing the old name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
}

impl ProjectPatch {
    pub fn apply_to(&self, project: &mut Project) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName);
            }
            project.name = name.clone();
        }
        if let Some(mode) = self.mode {
            project.mode = mode;
        }
        Ok(())
    }
}
