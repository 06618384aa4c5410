//! Append-only notification feed.
//!
//! The core only ever appends; entries are never removed or mutated. The
//! UI collaborator polls with `since()` using the last id it has seen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Monotonic feed id, starting at 1.
    pub id: u64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Notification {
    /// Feed line form: `HH:MM - message`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.timestamp.format("%H:%M"), self.message)
    }
}

/// The append-only feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFeed {
    entries: Vec<Notification>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message stamped at `at`. Returns the new entry.
    pub fn push(&mut self, message: impl Into<String>, at: DateTime<Utc>) -> Notification {
        let entry = Notification {
            id: self.entries.len() as u64 + 1,
            message: message.into(),
            timestamp: at,
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn all(&self) -> &[Notification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newer than `last_seen_id`. Ids are dense and monotonic, so
    /// this is a slice, not a scan.
    pub fn since(&self, last_seen_id: u64) -> &[Notification] {
        let start = (last_seen_id as usize).min(self.entries.len());
        &self.entries[start..]
    }
}
