//! Boundary-crossing trigger engine.
//!
//! The engine is a wall-clock scanner. It has no internal thread -- the
//! caller drives it by calling `scan()` once per tick and routes each
//! emitted event by its disposition.
//!
//! ## Event flow
//!
//! ```text
//! scan -> TriggerEvent (Fresh)  -> DecisionGate -> apply_decision
//!                      (Stale)  -> apply_stale
//! ```
//!
//! Every event carries a feed message; the caller appends it to the
//! notification feed before and independent of any human answer.
//!
//! At-most-once surfacing is enforced by the processed key set. A key is
//! evicted once its entity carries a durable marker (see [`TriggerEngine::evict`]),
//! so the set stays bounded by the number of live unfinalized records.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Activity, ActivityStatus, EntityId, Reminder, ReminderStatus};
use crate::error::Result;
use crate::store::EntityStore;

use super::gate::{DecisionAnswer, DecisionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Activity,
    Reminder,
}

/// Stable identity of one boundary crossing. An entity crosses its
/// boundary at most once, so the key doubles as the dedup token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub kind: EntityKind,
    pub id: EntityId,
}

/// How the caller should route a detected crossing.
#[derive(Debug, Clone)]
pub enum Disposition {
    /// Crossed within the current tick window; ask the user.
    Fresh(DecisionRequest),
    /// Crossed while nobody was watching; auto-resolve in the store.
    Stale,
}

/// One detected boundary crossing.
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub key: EventKey,
    pub entity_name: String,
    /// Scheduled boundary that was crossed.
    pub boundary: DateTime<Utc>,
    /// Scan instant at which the crossing was detected.
    pub detected_at: DateTime<Utc>,
    /// Feed line, recorded for both dispositions.
    pub message: String,
    pub disposition: Disposition,
}

/// The scanner. Owns only the dedup state; entities are borrowed from
/// the store on every scan.
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    processed: HashSet<EventKey>,
    /// A crossing older than this at detection time is stale.
    freshness: Duration,
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerEngine {
    /// Freshness window matching the default 1 s tick.
    pub fn new() -> Self {
        Self::with_freshness(Duration::seconds(1))
    }

    pub fn with_freshness(freshness: Duration) -> Self {
        Self {
            processed: HashSet::new(),
            freshness,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_processed(&self, key: EventKey) -> bool {
        self.processed.contains(&key)
    }

    pub fn processed_len(&self) -> usize {
        self.processed.len()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Detect boundary crossings as of `now`.
    ///
    /// Candidates are non-deleted Pending activities with no recorded
    /// start and startTime <= now, and non-deleted "Not Yet" reminders
    /// with endTime <= now. Each key fires at most once; unnamed records
    /// are skipped (and not marked) so a later fix can still fire.
    pub fn scan(
        &mut self,
        now: DateTime<Utc>,
        activities: &[Activity],
        reminders: &[Reminder],
    ) -> Vec<TriggerEvent> {
        let mut events = Vec::new();

        for activity in activities {
            if activity.deleted
                || activity.status != ActivityStatus::Pending
                || activity.actual_start.is_some()
                || activity.start_time > now
            {
                continue;
            }
            let key = EventKey {
                kind: EntityKind::Activity,
                id: activity.id,
            };
            if self.processed.contains(&key) {
                continue;
            }
            if !activity.is_well_formed() {
                tracing::warn!(id = activity.id, "skipping unnamed activity in trigger scan");
                continue;
            }
            self.processed.insert(key);
            events.push(self.activity_event(key, activity, now));
        }

        for reminder in reminders {
            if reminder.deleted
                || reminder.status != ReminderStatus::NotYet
                || reminder.end_time > now
            {
                continue;
            }
            let key = EventKey {
                kind: EntityKind::Reminder,
                id: reminder.id,
            };
            if self.processed.contains(&key) {
                continue;
            }
            if !reminder.is_well_formed() {
                tracing::warn!(id = reminder.id, "skipping unnamed reminder in trigger scan");
                continue;
            }
            self.processed.insert(key);
            events.push(self.reminder_event(key, reminder, now));
        }

        events
    }

    /// Drop keys whose entity is gone, soft-deleted or durably marked
    /// (activity started or finalized; reminder done). Keys for live
    /// unfinalized records stay, which is what makes a reminder decline
    /// permanent. Returns the number of keys dropped.
    pub fn evict(&mut self, activities: &[Activity], reminders: &[Reminder]) -> usize {
        let before = self.processed.len();
        self.processed.retain(|key| match key.kind {
            EntityKind::Activity => activities
                .iter()
                .find(|a| a.id == key.id)
                .map(|a| {
                    !a.deleted
                        && a.status == ActivityStatus::Pending
                        && a.actual_start.is_none()
                })
                .unwrap_or(false),
            EntityKind::Reminder => reminders
                .iter()
                .find(|r| r.id == key.id)
                .map(|r| !r.deleted && r.status == ReminderStatus::NotYet)
                .unwrap_or(false),
        });
        before - self.processed.len()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn is_fresh(&self, boundary: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - boundary < self.freshness
    }

    fn activity_event(&self, key: EventKey, activity: &Activity, now: DateTime<Utc>) -> TriggerEvent {
        let disposition = if self.is_fresh(activity.start_time, now) {
            Disposition::Fresh(DecisionRequest {
                id: Uuid::new_v4(),
                key,
                entity_name: activity.name.clone(),
                prompt: format!("Activity \"{}\" is starting now. Start?", activity.name),
                detected_at: now,
            })
        } else {
            Disposition::Stale
        };
        TriggerEvent {
            key,
            entity_name: activity.name.clone(),
            boundary: activity.start_time,
            detected_at: now,
            message: format!("Activity: {} is starting now!", activity.name),
            disposition,
        }
    }

    fn reminder_event(&self, key: EventKey, reminder: &Reminder, now: DateTime<Utc>) -> TriggerEvent {
        let disposition = if self.is_fresh(reminder.end_time, now) {
            Disposition::Fresh(DecisionRequest {
                id: Uuid::new_v4(),
                key,
                entity_name: reminder.name.clone(),
                prompt: format!("Reminder \"{}\" is due now. Mark as Done?", reminder.name),
                detected_at: now,
            })
        } else {
            Disposition::Stale
        };
        TriggerEvent {
            key,
            entity_name: reminder.name.clone(),
            boundary: reminder.end_time,
            detected_at: now,
            message: format!("Reminder: {} is due now!", reminder.name),
            disposition,
        }
    }
}

/// Write a human answer back to the store.
///
/// Activity confirm records the actual start at the detection instant
/// and leaves the status Pending; decline finalizes it with zero time.
/// Reminder confirm marks it done as of the detection instant; decline
/// changes nothing -- the retained key is the whole dismissal.
pub fn apply_decision(
    store: &mut EntityStore,
    request: &DecisionRequest,
    answer: DecisionAnswer,
) -> Result<()> {
    match (request.key.kind, answer) {
        (EntityKind::Activity, DecisionAnswer::Confirm) => {
            store.start_activity(request.key.id, request.detected_at)?;
        }
        (EntityKind::Activity, DecisionAnswer::Decline) => {
            store.dismiss_activity(request.key.id, request.detected_at)?;
        }
        (EntityKind::Reminder, DecisionAnswer::Confirm) => {
            store.finish_reminder(request.key.id, request.detected_at)?;
        }
        (EntityKind::Reminder, DecisionAnswer::Decline) => {}
    }
    Ok(())
}

/// Auto-resolution for a stale crossing, applied without a prompt: the
/// activity is taken as started, the reminder as done, both as of the
/// detection instant.
pub fn apply_stale(store: &mut EntityStore, event: &TriggerEvent) -> Result<()> {
    match event.key.kind {
        EntityKind::Activity => {
            store.start_activity(event.key.id, event.detected_at)?;
        }
        EntityKind::Reminder => {
            store.finish_reminder(event.key.id, event.detected_at)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ActivityDraft, Mode, Priority, Recurrence, ReminderDraft};
    use chrono::TimeZone;

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, min, sec).unwrap()
    }

    fn activity_draft(name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ActivityDraft {
        ActivityDraft {
            name: name.into(),
            start_time: start,
            end_time: end,
            priority: Priority::Medium,
            mode: Mode::Work,
            project: None,
            recurrence: Recurrence::None,
        }
    }

    fn reminder_draft(name: &str, due: DateTime<Utc>) -> ReminderDraft {
        ReminderDraft {
            name: name.into(),
            end_time: due,
            priority: Priority::Medium,
            mode: Mode::Work,
            project: None,
            recurrence: Recurrence::None,
        }
    }

    fn activity(id: EntityId, name: &str, start: DateTime<Utc>) -> Activity {
        Activity {
            id,
            name: name.into(),
            start_time: start,
            end_time: start + Duration::minutes(120),
            priority: Priority::Medium,
            mode: Mode::Work,
            project: None,
            recurrence: Recurrence::None,
            status: ActivityStatus::Pending,
            actual_start: None,
            actual_end: None,
            time_spent: 0,
            deleted: false,
        }
    }

    fn reminder(id: EntityId, name: &str, due: DateTime<Utc>) -> Reminder {
        Reminder {
            id,
            name: name.into(),
            end_time: due,
            priority: Priority::Medium,
            mode: Mode::Work,
            project: None,
            recurrence: Recurrence::None,
            status: ReminderStatus::NotYet,
            actual_end: None,
            time_spent: 0,
            deleted: false,
        }
    }

    #[test]
    fn crossing_fires_exactly_once() {
        let mut engine = TriggerEngine::new();
        let start = at(9, 0, 0);
        let items = vec![activity(1, "Write report", start)];

        let events = engine.scan(start, &items, &[]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].message, "Activity: Write report is starting now!");
        match &events[0].disposition {
            Disposition::Fresh(request) => {
                assert_eq!(
                    request.prompt,
                    "Activity \"Write report\" is starting now. Start?"
                );
                assert_eq!(request.detected_at, start);
            }
            Disposition::Stale => panic!("crossing at the boundary instant must be fresh"),
        }

        // Same entity, one second later, decision still unanswered.
        let events = engine.scan(start + Duration::seconds(1), &items, &[]);
        assert!(events.is_empty());
    }

    #[test]
    fn confirm_records_actual_start_and_blocks_retrigger() {
        let mut engine = TriggerEngine::new();
        let mut store = EntityStore::new();
        let start = at(9, 0, 0);
        let (added, _) = store
            .add_activity(activity_draft(
                "Write report",
                start,
                start + Duration::minutes(120),
            ))
            .unwrap();

        let events = engine.scan(start, store.all_activities(), store.all_reminders());
        assert_eq!(events.len(), 1);
        let request = match &events[0].disposition {
            Disposition::Fresh(request) => request.clone(),
            Disposition::Stale => panic!("expected a fresh crossing"),
        };

        apply_decision(&mut store, &request, DecisionAnswer::Confirm).unwrap();
        let activity = store.activity(added.id).unwrap();
        assert_eq!(activity.status, ActivityStatus::Pending);
        assert_eq!(activity.actual_start, Some(start));
        assert_eq!(activity.actual_end, None);

        let events = engine.scan(
            start + Duration::seconds(1),
            store.all_activities(),
            store.all_reminders(),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn activity_decline_finalizes_with_zero_time() {
        let mut engine = TriggerEngine::new();
        let mut store = EntityStore::new();
        let start = at(9, 0, 0);
        let (added, _) = store
            .add_activity(activity_draft(
                "Morning run",
                start,
                start + Duration::minutes(45),
            ))
            .unwrap();

        let events = engine.scan(start, store.all_activities(), store.all_reminders());
        let request = match &events[0].disposition {
            Disposition::Fresh(request) => request.clone(),
            Disposition::Stale => panic!("expected a fresh crossing"),
        };
        apply_decision(&mut store, &request, DecisionAnswer::Decline).unwrap();

        let activity = store.activity(added.id).unwrap();
        assert_eq!(activity.status, ActivityStatus::Completed);
        assert_eq!(activity.actual_start, Some(start));
        assert_eq!(activity.actual_end, Some(start));
        assert_eq!(activity.time_spent, 0);
    }

    #[test]
    fn reminder_decline_changes_nothing_and_stays_dismissed() {
        let mut engine = TriggerEngine::new();
        let mut store = EntityStore::new();
        let due = at(14, 30, 0);
        let added = store.add_reminder(reminder_draft("Call dentist", due)).unwrap();

        let events = engine.scan(due, store.all_activities(), store.all_reminders());
        assert_eq!(events.len(), 1);
        let request = match &events[0].disposition {
            Disposition::Fresh(request) => request.clone(),
            Disposition::Stale => panic!("expected a fresh crossing"),
        };
        apply_decision(&mut store, &request, DecisionAnswer::Decline).unwrap();

        let reminder = store.reminder(added.id).unwrap();
        assert_eq!(reminder.status, ReminderStatus::NotYet);
        assert_eq!(reminder.actual_end, None);

        // Dismissal is permanent: no re-fire, and eviction keeps the key
        // because the reminder is still live and unfinalized.
        engine.evict(store.all_activities(), store.all_reminders());
        let events = engine.scan(
            due + Duration::minutes(10),
            store.all_activities(),
            store.all_reminders(),
        );
        assert!(events.is_empty());
    }

    #[test]
    fn overdue_at_startup_is_stale_and_auto_resolves() {
        let mut engine = TriggerEngine::new();
        let mut store = EntityStore::new();
        let start = at(9, 0, 0);
        let due = at(9, 5, 0);
        let (added_activity, _) = store
            .add_activity(activity_draft("Deep work", start, start + Duration::minutes(90)))
            .unwrap();
        let added_reminder = store.add_reminder(reminder_draft("Submit form", due)).unwrap();

        // First scan happens long after both boundaries.
        let now = at(11, 0, 0);
        let events = engine.scan(now, store.all_activities(), store.all_reminders());
        assert_eq!(events.len(), 2);
        for event in &events {
            assert!(matches!(event.disposition, Disposition::Stale));
            apply_stale(&mut store, event).unwrap();
        }

        let activity = store.activity(added_activity.id).unwrap();
        assert_eq!(activity.status, ActivityStatus::Pending);
        assert_eq!(activity.actual_start, Some(now));

        let reminder = store.reminder(added_reminder.id).unwrap();
        assert_eq!(reminder.status, ReminderStatus::Done);
        assert_eq!(reminder.actual_end, Some(now));
        assert_eq!(reminder.time_spent, 0);
    }

    #[test]
    fn freshness_window_is_one_tick() {
        let start = at(9, 0, 0);
        let items = vec![activity(1, "A", start)];

        let mut engine = TriggerEngine::new();
        let events = engine.scan(start + Duration::milliseconds(999), &items, &[]);
        assert!(matches!(events[0].disposition, Disposition::Fresh(_)));

        let mut engine = TriggerEngine::new();
        let events = engine.scan(start + Duration::seconds(1), &items, &[]);
        assert!(matches!(events[0].disposition, Disposition::Stale));
    }

    #[test]
    fn future_boundaries_do_not_fire() {
        let mut engine = TriggerEngine::new();
        let now = at(9, 0, 0);
        let items = vec![activity(1, "Later", now + Duration::seconds(1))];
        assert!(engine.scan(now, &items, &[]).is_empty());
    }

    #[test]
    fn unnamed_records_warn_and_fire_after_fix() {
        let mut engine = TriggerEngine::new();
        let start = at(9, 0, 0);
        let mut items = vec![activity(1, "  ", start)];

        assert!(engine.scan(start, &items, &[]).is_empty());
        assert_eq!(engine.processed_len(), 0);

        // Naming the record later still gets it surfaced (stale by then).
        items[0].name = "Recovered".into();
        let events = engine.scan(start + Duration::minutes(5), &items, &[]);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].disposition, Disposition::Stale));
    }

    #[test]
    fn eviction_drops_marked_and_missing_keys_only() {
        let mut engine = TriggerEngine::new();
        let start = at(9, 0, 0);
        let mut items = vec![
            activity(1, "Confirmed", start),
            activity(2, "Awaiting answer", start),
        ];
        let due = at(9, 0, 0);
        let reminders = vec![reminder(3, "Declined", due)];

        let events = engine.scan(start, &items, &reminders);
        assert_eq!(events.len(), 3);
        assert_eq!(engine.processed_len(), 3);

        // Entity 1 gets its durable marker; 2 is still undecided and the
        // declined reminder is live and unfinalized, so both keys stay.
        items[0].actual_start = Some(start);
        let dropped = engine.evict(&items, &reminders);
        assert_eq!(dropped, 1);
        assert!(!engine.is_processed(EventKey {
            kind: EntityKind::Activity,
            id: 1,
        }));
        assert!(engine.is_processed(EventKey {
            kind: EntityKind::Activity,
            id: 2,
        }));
        assert!(engine.is_processed(EventKey {
            kind: EntityKind::Reminder,
            id: 3,
        }));

        // Hard removal drops the remaining keys.
        let dropped = engine.evict(&[], &[]);
        assert_eq!(dropped, 2);
        assert_eq!(engine.processed_len(), 0);
    }

    #[test]
    fn deleted_records_do_not_fire() {
        let mut engine = TriggerEngine::new();
        let start = at(9, 0, 0);
        let mut item = activity(1, "Gone", start);
        item.deleted = true;
        assert!(engine.scan(start, &[item], &[]).is_empty());
    }
}
