//! Analytics report commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use daybeat_core::analytics::{group_completion, project_execution, WeeklyReportAnalyzer};

use crate::state;

#[derive(Subcommand)]
pub enum ReportAction {
    /// Trailing-window schedule report
    Weekly {
        /// Window length in days
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Completion percentages for repeated activities
    Completion,
    /// Execution scores per project
    Execution,
}

pub fn run(action: ReportAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = state::load_store()?;

    match action {
        ReportAction::Weekly { days } => {
            let report = WeeklyReportAnalyzer::with_window(days).analyze(
                Utc::now(),
                store.all_activities(),
                store.all_reminders(),
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ReportAction::Completion => {
            let groups = group_completion(&store.activities());
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        ReportAction::Execution => {
            let rows = project_execution(&store.projects(), store.all_activities());
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
