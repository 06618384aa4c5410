//! Activity management commands for CLI.

use clap::Subcommand;
use daybeat_core::{ActivityDraft, ActivityPatch};

use super::common::{parse_mode, parse_priority, parse_recurrence, parse_time};
use crate::state;

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Create a new activity
    Add {
        /// Activity name
        name: String,
        /// Start instant (RFC 3339 or 'YYYY-MM-DD HH:MM')
        #[arg(long)]
        start: String,
        /// End instant
        #[arg(long)]
        end: String,
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
    /// List activities
    List {
        /// Show soft-deleted activities instead
        #[arg(long)]
        deleted: bool,
    },
    /// Update an activity
    Update {
        /// Activity ID
        id: u64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New start instant
        #[arg(long)]
        start: Option<String>,
        /// New end instant
        #[arg(long)]
        end: Option<String>,
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
        /// Corrected minutes spent
        #[arg(long)]
        time_spent: Option<i64>,
    },
    /// Mark an activity completed
    Complete {
        /// Activity ID
        id: u64,
    },
    /// Soft-delete an activity
    Delete {
        /// Activity ID
        id: u64,
    },
    /// Restore a soft-deleted activity
    Restore {
        /// Activity ID
        id: u64,
    },
}

pub fn run(action: ActivityAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state::load_store()?;

    match action {
        ActivityAction::Add {
            name,
            start,
            end,
            priority,
            mode,
            project,
            recurrence,
        } => {
            let draft = ActivityDraft {
                name,
                start_time: parse_time(&start)?,
                end_time: parse_time(&end)?,
                priority: parse_priority(&priority)?,
                mode: parse_mode(&mode)?,
                project,
                recurrence: parse_recurrence(&recurrence)?,
            };
            let (activity, pair) = store.add_activity(draft)?;
            state::save_store(&store)?;
            println!("Activity created: {}", activity.id);
            println!("{}", serde_json::to_string_pretty(&activity)?);
            for reminder in pair {
                println!("Reminder created: {} ({})", reminder.id, reminder.name);
            }
        }
        ActivityAction::List { deleted } => {
            let listing = if deleted { store.deleted_activities() } else { store.activities() };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        ActivityAction::Update {
            id,
            name,
            start,
            end,
            priority,
            mode,
            project,
            detach_project,
            recurrence,
            time_spent,
        } => {
            let patch = ActivityPatch {
                name,
                start_time: start.as_deref().map(parse_time).transpose()?,
                end_time: end.as_deref().map(parse_time).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                mode: mode.as_deref().map(parse_mode).transpose()?,
                project: if detach_project { Some(None) } else { project.map(Some) },
                recurrence: recurrence.as_deref().map(parse_recurrence).transpose()?,
                status: None,
                actual_start: None,
                actual_end: None,
                time_spent,
            };
            let activity = store.update_activity(id, &patch)?;
            state::save_store(&store)?;
            println!("Activity updated:");
            println!("{}", serde_json::to_string_pretty(&activity)?);
        }
        ActivityAction::Complete { id } => {
            let activity = store.complete_activity(id)?;
            state::save_store(&store)?;
            println!("Activity completed: {id}");
            println!("{}", serde_json::to_string_pretty(&activity)?);
        }
        ActivityAction::Delete { id } => {
            store.delete_activity(id)?;
            state::save_store(&store)?;
            println!("Activity deleted: {id}");
        }
        ActivityAction::Restore { id } => {
            store.restore_activity(id)?;
            state::save_store(&store)?;
            println!("Activity restored: {id}");
        }
    }
    Ok(())
}
