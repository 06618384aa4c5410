//! Weekly time budget commands for CLI.

use clap::Subcommand;
use daybeat_core::analytics::mode_utilization;
use daybeat_core::{format_hours, BudgetAllocation, Config};

use crate::state;

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show the configured weekly allocation
    Show,
    /// Assign the weekly allocation in hours
    Assign {
        /// Hours budgeted for Work
        work: f64,
        /// Hours budgeted for Sleep
        sleep: f64,
        /// Hours budgeted for Relax
        relax: f64,
    },
    /// Utilization of each mode against its budget
    Utilization,
}

pub fn run(action: BudgetAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        BudgetAction::Show => {
            let config = Config::load_or_default();
            let allocation = config.budget_allocation();
            println!(
                "Work {}  Sleep {}  Relax {}  (total {})",
                format_hours(allocation.work),
                format_hours(allocation.sleep),
                format_hours(allocation.relax),
                format_hours(allocation.total()),
            );
            println!("{}", serde_json::to_string_pretty(&allocation)?);
        }
        BudgetAction::Assign { work, sleep, relax } => {
            // Validates the 168 h week before anything is written.
            let allocation = BudgetAllocation::assign(work, sleep, relax)?;
            let mut config = Config::load_or_default();
            config.set_budget_allocation(allocation);
            config.save()?;
            println!(
                "Budget assigned: Work {}  Sleep {}  Relax {}",
                format_hours(allocation.work),
                format_hours(allocation.sleep),
                format_hours(allocation.relax),
            );
        }
        BudgetAction::Utilization => {
            let config = Config::load_or_default();
            let store = state::load_store()?;
            let rows = mode_utilization(&config.budget_allocation(), store.all_activities());
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
