//! Activity completion rollup.
//!
//! Activities are grouped by (name, priority, project) so repeated
//! instances of the same entry read as one line. Groups keep first-seen
//! order within a priority and sort by priority rank, highest first.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::{Activity, ActivityStatus, Priority};

/// Rolled-up completion figures for one (name, priority, project) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityGroup {
    /// Display name; carries a `" (<n>)"` suffix when n > 1.
    pub name: String,
    pub priority: Priority,
    pub project: Option<String>,
    /// Number of grouped records.
    pub count: usize,
    /// Scheduled minutes over all members.
    pub total_time_set: i64,
    /// Minutes logged by completed members.
    pub total_time_spent: i64,
    /// spent/set in percent; 0 when nothing is scheduled.
    pub completion_pct: f64,
}

struct GroupBuilder {
    name: String,
    priority: Priority,
    project: Option<String>,
    count: usize,
    time_set: i64,
    time_spent: i64,
}

impl GroupBuilder {
    fn new(activity: &Activity) -> Self {
        Self {
            name: activity.name.clone(),
            priority: activity.priority,
            project: activity.project.clone(),
            count: 0,
            time_set: 0,
            time_spent: 0,
        }
    }

    fn record(&mut self, activity: &Activity) {
        self.count += 1;
        self.time_set += activity.scheduled_minutes();
        if activity.status == ActivityStatus::Completed {
            self.time_spent += activity.time_spent;
        }
    }

    fn build(self) -> ActivityGroup {
        let name = if self.count > 1 {
            format!("{} ({})", self.name, self.count)
        } else {
            self.name
        };
        let completion_pct = if self.time_set > 0 {
            self.time_spent as f64 / self.time_set as f64 * 100.0
        } else {
            0.0
        };
        ActivityGroup {
            name,
            priority: self.priority,
            project: self.project,
            count: self.count,
            total_time_set: self.time_set,
            total_time_spent: self.time_spent,
            completion_pct,
        }
    }
}

/// Group and roll up the given activities.
pub fn group_completion(activities: &[Activity]) -> Vec<ActivityGroup> {
    let mut index: HashMap<(String, Priority, Option<String>), usize> = HashMap::new();
    let mut builders: Vec<GroupBuilder> = Vec::new();

    for activity in activities.iter().filter(|a| !a.deleted) {
        let key = (
            activity.name.clone(),
            activity.priority,
            activity.project.clone(),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            builders.push(GroupBuilder::new(activity));
            builders.len() - 1
        });
        builders[slot].record(activity);
    }

    let mut groups: Vec<ActivityGroup> = builders.into_iter().map(GroupBuilder::build).collect();
    // Stable sort keeps first-seen order within a rank.
    groups.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
    groups
}
