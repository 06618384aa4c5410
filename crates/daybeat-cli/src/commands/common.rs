//! Shared argument parsing for the entity commands.

use chrono::{DateTime, NaiveDateTime, Utc};
use daybeat_core::{Mode, Priority, Recurrence};

type Error = Box<dyn std::error::Error>;

/// Parse an instant from RFC 3339 ("2026-03-02T09:00:00Z") or the short
/// "2026-03-02 09:00" form, which is taken as UTC.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(t.and_utc());
    }
    Err(format!("invalid time '{s}' (expected RFC 3339 or 'YYYY-MM-DD HH:MM')").into())
}

pub fn parse_priority(s: &str) -> Result<Priority, Error> {
    s.parse().map_err(|e| format!("{e} (low, medium, high)").into())
}

pub fn parse_mode(s: &str) -> Result<Mode, Error> {
    s.parse().map_err(|e| format!("{e} (work, sleep, relax)").into())
}

pub fn parse_recurrence(s: &str) -> Result<Recurrence, Error> {
    s.parse().map_err(|e| format!("{e} (none, daily, weekly)").into())
}
