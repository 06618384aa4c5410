//! Weekly time budget per mode.

use serde::{Deserialize, Serialize};

use crate::entity::Mode;
use crate::error::ValidationError;

/// Hours in a 168-hour week.
pub const HOURS_PER_WEEK: f64 = 168.0;

/// Allocated hours per mode for one week.
///
/// The assign operation validates the total against [`HOURS_PER_WEEK`];
/// the analytics side still guards its divisions and never assumes the
/// invariant holds for data that arrived another way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    /// Weekly hours allocated to Work.
    pub work: f64,

    /// Weekly hours allocated to Sleep.
    pub sleep: f64,

    /// Weekly hours allocated to Relax.
    pub relax: f64,
}

impl Default for BudgetAllocation {
    fn default() -> Self {
        Self {
            work: 20.0,
            sleep: 60.0,
            relax: 20.0,
        }
    }
}

impl BudgetAllocation {
    /// Replace the whole allocation, validating that every part is
    /// non-negative and the total fits in a week.
    pub fn assign(work: f64, sleep: f64, relax: f64) -> Result<Self, ValidationError> {
        let total = work + sleep + relax;
        if work < 0.0 || sleep < 0.0 || relax < 0.0 || total > HOURS_PER_WEEK {
            return Err(ValidationError::BudgetExceeded { total });
        }
        Ok(Self { work, sleep, relax })
    }

    pub fn hours_for(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Work => self.work,
            Mode::Sleep => self.sleep,
            Mode::Relax => self.relax,
        }
    }

    pub fn total(&self) -> f64 {
        self.work + self.sleep + self.relax
    }
}

/// Render fractional hours as `"<H>h <M>m"`, minutes rounded.
pub fn format_hours(hours: f64) -> String {
    let whole = hours.floor() as i64;
    let minutes = ((hours - hours.floor()) * 60.0).round() as i64;
    format!("{whole}h {minutes}m")
}
