//! Schedule view commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use daybeat_core::countdown::{activity_countdowns, reminder_countdowns};

use crate::state;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Countdown lists of upcoming activities and reminders
    Upcoming,
    /// Dump the whole schedule state
    Dump,
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = state::load_store()?;

    match action {
        ScheduleAction::Upcoming => {
            let now = Utc::now();
            let activities = activity_countdowns(now, store.all_activities());
            let reminders = reminder_countdowns(now, store.all_reminders());
            for entry in &activities {
                println!("{}  {}", entry.remaining, entry.name);
            }
            for entry in &reminders {
                println!("{}  {} (due)", entry.remaining, entry.name);
            }
            let listing = serde_json::json!({
                "activities": activities,
                "reminders": reminders,
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        ScheduleAction::Dump => {
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        }
    }
    Ok(())
}
