//! Reminder management commands for CLI.

use clap::Subcommand;
use daybeat_core::{ReminderDraft, ReminderPatch};

use super::common::{parse_mode, parse_priority, parse_recurrence, parse_time};
use crate::state;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Create a new reminder
    Add {
        /// Reminder name
        name: String,
        /// Due instant (RFC 3339 or 'YYYY-MM-DD HH:MM')
        #[arg(long)]
        due: String,
        /// Priority: low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Mode: work, sleep or relax
        #[arg(long, default_value = "work")]
        mode: String,
        /// Project name to associate with
        #[arg(long)]
        project: Option<String>,
        /// Recurrence: none, daily or weekly
        #[arg(long, default_value = "none")]
        recurrence: String,
    },
    /// List reminders
    List {
        /// Show soft-deleted reminders instead
        #[arg(long)]
        deleted: bool,
    },
    /// Update a reminder
    Update {
        /// Reminder ID
        id: u64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New due instant
        #[arg(long)]
        due: Option<String>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
        /// New mode
        #[arg(long)]
        mode: Option<String>,
        /// New project name
        #[arg(long)]
        project: Option<String>,
        /// Clear the project reference
        #[arg(long)]
        detach_project: bool,
        /// New recurrence
        #[arg(long)]
        recurrence: Option<String>,
    },
    /// Mark a reminder done
    Complete {
        /// Reminder ID
        id: u64,
    },
    /// Soft-delete a reminder
    Delete {
        /// Reminder ID
        id: u64,
    },
    /// Restore a soft-deleted reminder
    Restore {
        /// Reminder ID
        id: u64,
    },
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state::load_store()?;

    match action {
        ReminderAction::Add {
            name,
            due,
            priority,
            mode,
            project,
            recurrence,
        } => {
            let draft = ReminderDraft {
                name,
                end_time: parse_time(&due)?,
                priority: parse_priority(&priority)?,
                mode: parse_mode(&mode)?,
                project,
                recurrence: parse_recurrence(&recurrence)?,
            };
            let reminder = store.add_reminder(draft)?;
            state::save_store(&store)?;
            println!("Reminder created: {}", reminder.id);
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::List { deleted } => {
            let listing = if deleted { store.deleted_reminders() } else { store.reminders() };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        ReminderAction::Update {
            id,
            name,
            due,
            priority,
            mode,
            project,
            detach_project,
            recurrence,
        } => {
            let patch = ReminderPatch {
                name,
                end_time: due.as_deref().map(parse_time).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                mode: mode.as_deref().map(parse_mode).transpose()?,
                project: if detach_project { Some(None) } else { project.map(Some) },
                recurrence: recurrence.as_deref().map(parse_recurrence).transpose()?,
                status: None,
                actual_end: None,
                time_spent: None,
            };
            let reminder = store.update_reminder(id, &patch)?;
            state::save_store(&store)?;
            println!("Reminder updated:");
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::Complete { id } => {
            let reminder = store.complete_reminder(id)?;
            state::save_store(&store)?;
            println!("Reminder completed: {id}");
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::Delete { id } => {
            store.delete_reminder(id)?;
            state::save_store(&store)?;
            println!("Reminder deleted: {id}");
        }
        ReminderAction::Restore { id } => {
            store.restore_reminder(id)?;
            state::save_store(&store)?;
            println!("Reminder restored: {id}");
        }
    }
    Ok(())
}
