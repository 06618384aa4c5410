//! In-memory entity store.
//!
//! Holds the activity, reminder and project collections behind an explicit
//! read/update surface. The runtime service owns the store and serializes
//! every mutation with the tick scan, so none of these methods need locks.
//!
//! Records are soft-deleted only. Project milestone counts are a cache and
//! are recomputed here on every write that touches the reminder collection,
//! including project reassignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{
    Activity, ActivityDraft, ActivityPatch, ActivityStatus, EntityId, Project, ProjectDraft,
    ProjectPatch, ProjectStatus, Reminder, ReminderDraft, ReminderPatch, ReminderStatus,
};
use crate::error::{Result, StoreError, ValidationError};

/// What happens to a deleted project's associated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectDeleteMode {
    /// Soft-delete the associated activities and reminders too.
    CascadeDelete,
    /// Keep them, clearing their project reference.
    DetachItems,
}

/// Serializable snapshot of the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub next_id: EntityId,
}

/// The single owned store.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    activities: Vec<Activity>,
    reminders: Vec<Reminder>,
    projects: Vec<Project>,
    next_id: EntityId,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            activities: Vec::new(),
            reminders: Vec::new(),
            projects: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        // ids are unique across all entity kinds.
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    // ── Listings ─────────────────────────────────────────────────────

    /// Full backing slice, deleted records included. The trigger scan
    /// filters on the flag itself.
    pub fn all_activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn all_reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn all_projects(&self) -> &[Project] {
        &self.projects
    }

    /// Non-deleted records, cloned for the external contract.
    pub fn activities(&self) -> Vec<Activity> {
        self.activities.iter().filter(|a| !a.deleted).cloned().collect()
    }

    pub fn reminders(&self) -> Vec<Reminder> {
        self.reminders.iter().filter(|r| !r.deleted).cloned().collect()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.projects.iter().filter(|p| !p.deleted).cloned().collect()
    }

    pub fn deleted_activities(&self) -> Vec<Activity> {
        self.activities.iter().filter(|a| a.deleted).cloned().collect()
    }

    pub fn deleted_reminders(&self) -> Vec<Reminder> {
        self.reminders.iter().filter(|r| r.deleted).cloned().collect()
    }

    pub fn deleted_projects(&self) -> Vec<Project> {
        self.projects.iter().filter(|p| p.deleted).cloned().collect()
    }

    pub fn activity(&self, id: EntityId) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn reminder(&self, id: EntityId) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    pub fn project(&self, id: EntityId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| !p.deleted && p.name == name)
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Validate and insert an activity. A Sleep-mode activity also creates
    /// its Bedtime/Wake-Up reminder pair; the new reminders are returned
    /// alongside the activity.
    pub fn add_activity(&mut self, draft: ActivityDraft) -> Result<(Activity, Vec<Reminder>)> {
        let id = self.allocate_id();
        let activity = draft.build(id)?;

        let mut created = Vec::new();
        if let Some((bedtime, wake_up)) = activity.sleep_pair_drafts() {
            for draft in [bedtime, wake_up] {
                let id = self.allocate_id();
                let reminder = draft.build(id)?;
                created.push(reminder.clone());
                self.reminders.push(reminder);
            }
        }

        let touched = activity.project.clone();
        self.activities.push(activity.clone());
        if let Some(name) = touched {
            // The pair reminders may reference the project.
            self.recompute_milestones(&name);
        }
        Ok((activity, created))
    }

    pub fn add_reminder(&mut self, draft: ReminderDraft) -> Result<Reminder> {
        let id = self.allocate_id();
        let reminder = draft.build(id)?;
        let touched = reminder.project.clone();
        self.reminders.push(reminder.clone());
        if let Some(name) = touched {
            self.recompute_milestones(&name);
        }
        Ok(reminder)
    }

    /// Insert a project. Names are foreign keys, so they must be unique
    /// among non-deleted projects.
    pub fn add_project(&mut self, draft: ProjectDraft) -> Result<Project> {
        if self.project_by_name(draft.name.trim()).is_some() {
            return Err(ValidationError::DuplicateProject {
                name: draft.name.trim().to_string(),
            }
            .into());
        }
        let id = self.allocate_id();
        let project = draft.build(id)?;
        let name = project.name.clone();
        self.projects.push(project);
        // Reminders created before the project may already reference it.
        self.recompute_milestones(&name);
        Ok(self
            .project(id)
            .cloned()
            .ok_or(StoreError::NotFound { kind: "project", id })?)
    }

    // ── Updates ──────────────────────────────────────────────────────

    /// Partial-merge update. Absent fields stay untouched; the merged time
    /// window is re-validated and status changes must be monotonic.
    pub fn update_activity(&mut self, id: EntityId, patch: &ActivityPatch) -> Result<Activity> {
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "activity", id })?;
        patch.apply_to(activity)?;
        Ok(activity.clone())
    }

    /// Like [`update_activity`], additionally recomputing milestones for
    /// both the old and the new project when the reference moves.
    ///
    /// [`update_activity`]: EntityStore::update_activity
    pub fn update_reminder(&mut self, id: EntityId, patch: &ReminderPatch) -> Result<Reminder> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { kind: "reminder", id })?;
        let old_project = reminder.project.clone();
        patch.apply_to(reminder)?;
        let updated = reminder.clone();

        if let Some(ref name) = old_project {
            self.recompute_milestones(name);
        }
        if updated.project != old_project {
            if let Some(ref name) = updated.project {
                self.recompute_milestones(name);
            }
        }
        Ok(updated)
    }

    /// Rename/retag a project. The new name must stay unique; references
    /// held by activities and reminders are not rewritten, so a full
    /// milestone recompute follows.
    pub fn update_project(&mut self, id: EntityId, patch: &ProjectPatch) -> Result<Project> {
        if let Some(ref name) = patch.name {
            let name = name.trim();
            if self.projects.iter().any(|p| !p.deleted && p.id != id && p.name == name) {
                return Err(ValidationError::DuplicateProject {
                    name: name.to_string(),
                }
                .into());
            }
        }
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound { kind: "project", id })?;
        patch.apply_to(project)?;
        let updated = project.clone();
        self.recompute_all_milestones();
        Ok(self.project(id).cloned().unwrap_or(updated))
    }

    // ── Explicit completion ──────────────────────────────────────────

    /// User marks the activity completed: scheduled times become the
    /// actual times and the scheduled duration becomes the time spent.
    pub fn complete_activity(&mut self, id: EntityId) -> Result<Activity> {
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "activity", id })?;
        if activity.status == ActivityStatus::Completed {
            return Err(ValidationError::InvalidTransition {
                from: activity.status.to_string(),
                to: ActivityStatus::Completed.to_string(),
            }
            .into());
        }
        activity.status = ActivityStatus::Completed;
        activity.actual_start = Some(activity.start_time);
        activity.actual_end = Some(activity.end_time);
        activity.time_spent = (activity.end_time - activity.start_time).num_minutes().max(0);
        Ok(activity.clone())
    }

    /// User marks the reminder done at its due instant.
    pub fn complete_reminder(&mut self, id: EntityId) -> Result<Reminder> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { kind: "reminder", id })?;
        if reminder.status == ReminderStatus::Done {
            return Err(ValidationError::InvalidTransition {
                from: reminder.status.to_string(),
                to: ReminderStatus::Done.to_string(),
            }
            .into());
        }
        reminder.status = ReminderStatus::Done;
        reminder.actual_end = Some(reminder.end_time);
        let updated = reminder.clone();
        if let Some(ref name) = updated.project {
            self.recompute_milestones(name);
        }
        Ok(updated)
    }

    // ── Trigger resolution ───────────────────────────────────────────

    /// Record that an activity actually began at `at`. Status stays
    /// Pending; the activity still runs to its own end.
    pub fn start_activity(&mut self, id: EntityId, at: DateTime<Utc>) -> Result<Activity> {
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "activity", id })?;
        if activity.status != ActivityStatus::Pending {
            return Err(ValidationError::InvalidTransition {
                from: activity.status.to_string(),
                to: ActivityStatus::Pending.to_string(),
            }
            .into());
        }
        activity.actual_start = Some(at);
        Ok(activity.clone())
    }

    /// Close an activity that never ran. It is finalized as Completed at
    /// `at` with zero time logged, so analytics count it as skipped.
    pub fn dismiss_activity(&mut self, id: EntityId, at: DateTime<Utc>) -> Result<Activity> {
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "activity", id })?;
        if activity.status == ActivityStatus::Completed {
            return Err(ValidationError::InvalidTransition {
                from: activity.status.to_string(),
                to: ActivityStatus::Completed.to_string(),
            }
            .into());
        }
        activity.status = ActivityStatus::Completed;
        activity.actual_start = Some(at);
        activity.actual_end = Some(at);
        activity.time_spent = 0;
        Ok(activity.clone())
    }

    /// Mark a reminder done as of `at` rather than its due instant.
    pub fn finish_reminder(&mut self, id: EntityId, at: DateTime<Utc>) -> Result<Reminder> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { kind: "reminder", id })?;
        if reminder.status == ReminderStatus::Done {
            return Err(ValidationError::InvalidTransition {
                from: reminder.status.to_string(),
                to: ReminderStatus::Done.to_string(),
            }
            .into());
        }
        reminder.status = ReminderStatus::Done;
        reminder.actual_end = Some(at);
        reminder.time_spent = 0;
        let updated = reminder.clone();
        if let Some(ref name) = updated.project {
            self.recompute_milestones(name);
        }
        Ok(updated)
    }

    // ── Soft delete / restore ────────────────────────────────────────

    pub fn delete_activity(&mut self, id: EntityId) -> Result<()> {
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "activity", id })?;
        activity.deleted = true;
        Ok(())
    }

    pub fn restore_activity(&mut self, id: EntityId) -> Result<()> {
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { kind: "activity", id })?;
        activity.deleted = false;
        Ok(())
    }

    pub fn delete_reminder(&mut self, id: EntityId) -> Result<()> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { kind: "reminder", id })?;
        reminder.deleted = true;
        let touched = reminder.project.clone();
        if let Some(ref name) = touched {
            self.recompute_milestones(name);
        }
        Ok(())
    }

    pub fn restore_reminder(&mut self, id: EntityId) -> Result<()> {
        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound { kind: "reminder", id })?;
        reminder.deleted = false;
        let touched = reminder.project.clone();
        if let Some(ref name) = touched {
            self.recompute_milestones(name);
        }
        Ok(())
    }

    /// Soft-delete a project. `CascadeDelete` soft-deletes its associated
    /// records too; `DetachItems` keeps them and clears their reference.
    pub fn delete_project(&mut self, id: EntityId, mode: ProjectDeleteMode) -> Result<()> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound { kind: "project", id })?;
        project.deleted = true;
        let name = project.name.clone();

        match mode {
            ProjectDeleteMode::CascadeDelete => {
                for activity in self.activities.iter_mut() {
                    if activity.project.as_deref() == Some(name.as_str()) && !activity.deleted {
                        activity.deleted = true;
                    }
                }
                for reminder in self.reminders.iter_mut() {
                    if reminder.project.as_deref() == Some(name.as_str()) && !reminder.deleted {
                        reminder.deleted = true;
                    }
                }
            }
            ProjectDeleteMode::DetachItems => {
                for activity in self.activities.iter_mut() {
                    if activity.project.as_deref() == Some(name.as_str()) {
                        activity.project = None;
                    }
                }
                for reminder in self.reminders.iter_mut() {
                    if reminder.project.as_deref() == Some(name.as_str()) {
                        reminder.project = None;
                    }
                }
            }
        }
        self.recompute_milestones(&name);
        Ok(())
    }

    /// Restore the project record only; records removed by an earlier
    /// cascade stay deleted until restored individually.
    pub fn restore_project(&mut self, id: EntityId) -> Result<()> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound { kind: "project", id })?;
        project.deleted = false;
        let name = project.name.clone();
        self.recompute_milestones(&name);
        Ok(())
    }

    // ── Milestones ───────────────────────────────────────────────────

    /// Recompute the cached milestone counts for every project carrying
    /// `name` from the current non-deleted reminders.
    pub fn recompute_milestones(&mut self, name: &str) {
        let set = self
            .reminders
            .iter()
            .filter(|r| !r.deleted && r.project.as_deref() == Some(name))
            .count() as u32;
        let done = self
            .reminders
            .iter()
            .filter(|r| {
                !r.deleted
                    && r.project.as_deref() == Some(name)
                    && r.status == ReminderStatus::Done
            })
            .count() as u32;

        for project in self.projects.iter_mut().filter(|p| p.name == name) {
            project.milestones_set = set;
            project.milestones_done = done;
            project.status = if set > 0 && done == set {
                ProjectStatus::Done
            } else {
                ProjectStatus::Active
            };
        }
    }

    pub fn recompute_all_milestones(&mut self) {
        let names: Vec<String> = self.projects.iter().map(|p| p.name.clone()).collect();
        for name in names {
            self.recompute_milestones(&name);
        }
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            activities: self.activities.clone(),
            reminders: self.reminders.clone(),
            projects: self.projects.clone(),
            next_id: self.next_id,
        }
    }

    /// Rebuild from a snapshot. The id counter is clamped above every
    /// stored id so hand-edited files cannot cause collisions.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let max_id = snapshot
            .activities
            .iter()
            .map(|a| a.id)
            .chain(snapshot.reminders.iter().map(|r| r.id))
            .chain(snapshot.projects.iter().map(|p| p.id))
            .max()
            .unwrap_or(0);
        Self {
            activities: snapshot.activities,
            reminders: snapshot.reminders,
            projects: snapshot.projects,
            next_id: snapshot.next_id.max(max_id + 1),
        }
    }
}
