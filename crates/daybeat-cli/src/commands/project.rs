//! Project management commands for CLI.

use clap::Subcommand;
use daybeat_core::{ProjectDeleteMode, ProjectDraft, ProjectPatch};

use super::common::parse_mode;
use crate::state;

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Add {
        /// Project name (must be unique)
        name: String,
        /// Mode: work, sleep or relax
        #[arg(long, default_value = "work")]
        mode: String,
    },
    /// List projects with their milestone counts
    List {
        /// Show soft-deleted projects instead
        #[arg(long)]
        deleted: bool,
    },
    /// Rename a project or change its mode
    Update {
        /// Project ID
        id: u64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New mode
        #[arg(long)]
        mode: Option<String>,
    },
    /// Soft-delete a project
    Delete {
        /// Project ID
        id: u64,
        /// Keep associated records, clearing their project reference
        #[arg(long)]
        detach: bool,
    },
    /// Restore a soft-deleted project
    Restore {
        /// Project ID
        id: u64,
    },
}

pub fn run(action: ProjectAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = state::load_store()?;

    match action {
        ProjectAction::Add { name, mode } => {
            let draft = ProjectDraft {
                name,
                mode: parse_mode(&mode)?,
            };
            let project = store.add_project(draft)?;
            state::save_store(&store)?;
            println!("Project created: {}", project.id);
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List { deleted } => {
            let listing = if deleted { store.deleted_projects() } else { store.projects() };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        ProjectAction::Update { id, name, mode } => {
            let patch = ProjectPatch {
                name,
                mode: mode.as_deref().map(parse_mode).transpose()?,
            };
            let project = store.update_project(id, &patch)?;
            state::save_store(&store)?;
            println!("Project updated:");
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Delete { id, detach } => {
            let mode = if detach {
                ProjectDeleteMode::DetachItems
            } else {
                ProjectDeleteMode::CascadeDelete
            };
            store.delete_project(id, mode)?;
            state::save_store(&store)?;
            println!("Project deleted: {id}");
        }
        ProjectAction::Restore { id } => {
            store.restore_project(id)?;
            state::save_store(&store)?;
            println!("Project restored: {id}");
        }
    }
    Ok(())
}
