//! Runtime service: the single owner of the mutable state.
//!
//! One task owns the store, trigger engine, decision gate and
//! notification feed, and processes a command channel plus the tick
//! interval in a single `select!` loop. There is no finer-grained
//! locking anywhere; serialization through this task is the whole
//! concurrency story.
//!
//! [`Handle`] is a cheap clone holding the command sender. Every call
//! is an async request/reply over a oneshot. The tick keeps running
//! while a decision is outstanding, so new crossings keep being
//! recorded and queued behind the current prompt.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::analytics::{
    group_completion, mode_utilization, project_execution, ActivityGroup, ModeUtilization,
    ProjectExecution, WeeklyReport, WeeklyReportAnalyzer,
};
use crate::budget::BudgetAllocation;
use crate::config::Config;
use crate::entity::{
    Activity, ActivityDraft, ActivityPatch, EntityId, Project, ProjectDraft, ProjectPatch,
    Reminder, ReminderDraft, ReminderPatch,
};
use crate::error::{CoreError, Result};
use crate::intent::{self, IntentCommand, IntentReply};
use crate::notification::{Notification, NotificationFeed};
use crate::store::{EntityStore, ProjectDeleteMode, Snapshot};
use crate::trigger::{
    self, Admission, DecisionAnswer, DecisionGate, DecisionRequest, Disposition, EntityKind,
    EventKey, TriggerEngine,
};

type Reply<T> = oneshot::Sender<Result<T>>;

/// Requests processed by the service task.
enum Command {
    AddActivity { draft: ActivityDraft, reply: Reply<(Activity, Vec<Reminder>)> },
    AddReminder { draft: ReminderDraft, reply: Reply<Reminder> },
    AddProject { draft: ProjectDraft, reply: Reply<Project> },
    UpdateActivity { id: EntityId, patch: Box<ActivityPatch>, reply: Reply<Activity> },
    UpdateReminder { id: EntityId, patch: Box<ReminderPatch>, reply: Reply<Reminder> },
    UpdateProject { id: EntityId, patch: Box<ProjectPatch>, reply: Reply<Project> },
    CompleteActivity { id: EntityId, reply: Reply<Activity> },
    CompleteReminder { id: EntityId, reply: Reply<Reminder> },
    DeleteActivity { id: EntityId, reply: Reply<()> },
    DeleteReminder { id: EntityId, reply: Reply<()> },
    DeleteProject { id: EntityId, mode: ProjectDeleteMode, reply: Reply<()> },
    RestoreActivity { id: EntityId, reply: Reply<()> },
    RestoreReminder { id: EntityId, reply: Reply<()> },
    RestoreProject { id: EntityId, reply: Reply<()> },
    Activities { reply: Reply<Vec<Activity>> },
    Reminders { reply: Reply<Vec<Reminder>> },
    Projects { reply: Reply<Vec<Project>> },
    PendingDecision { reply: Reply<Option<DecisionRequest>> },
    Resolve { id: Uuid, answer: DecisionAnswer, reply: Reply<Option<DecisionRequest>> },
    NotificationsSince { last_seen: u64, reply: Reply<Vec<Notification>> },
    Budget { reply: Reply<BudgetAllocation> },
    AssignBudget { allocation: BudgetAllocation, reply: Reply<()> },
    Utilization { reply: Reply<Vec<ModeUtilization>> },
    Completion { reply: Reply<Vec<ActivityGroup>> },
    Execution { reply: Reply<Vec<ProjectExecution>> },
    Report { window_days: Option<i64>, reply: Reply<WeeklyReport> },
    Intent { command: IntentCommand, reply: Reply<IntentReply> },
    Snapshot { reply: Reply<Snapshot> },
    Shutdown { reply: Reply<Snapshot> },
}

/// Async client for the service. Clones share one channel.
#[derive(Clone)]
pub struct Handle {
    tx: mpsc::Sender<Command>,
}

impl Handle {
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| CoreError::ServiceStopped)?;
        rx.await.map_err(|_| CoreError::ServiceStopped)?
    }

    pub async fn add_activity(&self, draft: ActivityDraft) -> Result<(Activity, Vec<Reminder>)> {
        self.request(|reply| Command::AddActivity { draft, reply }).await
    }

    pub async fn add_reminder(&self, draft: ReminderDraft) -> Result<Reminder> {
        self.request(|reply| Command::AddReminder { draft, reply }).await
    }

    pub async fn add_project(&self, draft: ProjectDraft) -> Result<Project> {
        self.request(|reply| Command::AddProject { draft, reply }).await
    }

    pub async fn update_activity(&self, id: EntityId, patch: ActivityPatch) -> Result<Activity> {
        self.request(|reply| Command::UpdateActivity { id, patch: Box::new(patch), reply })
            .await
    }

    pub async fn update_reminder(&self, id: EntityId, patch: ReminderPatch) -> Result<Reminder> {
        self.request(|reply| Command::UpdateReminder { id, patch: Box::new(patch), reply })
            .await
    }

    pub async fn update_project(&self, id: EntityId, patch: ProjectPatch) -> Result<Project> {
        self.request(|reply| Command::UpdateProject { id, patch: Box::new(patch), reply })
            .await
    }

    pub async fn complete_activity(&self, id: EntityId) -> Result<Activity> {
        self.request(|reply| Command::CompleteActivity { id, reply }).await
    }

    pub async fn complete_reminder(&self, id: EntityId) -> Result<Reminder> {
        self.request(|reply| Command::CompleteReminder { id, reply }).await
    }

    pub async fn delete_activity(&self, id: EntityId) -> Result<()> {
        self.request(|reply| Command::DeleteActivity { id, reply }).await
    }

    pub async fn delete_reminder(&self, id: EntityId) -> Result<()> {
        self.request(|reply| Command::DeleteReminder { id, reply }).await
    }

    pub async fn delete_project(&self, id: EntityId, mode: ProjectDeleteMode) -> Result<()> {
        self.request(|reply| Command::DeleteProject { id, mode, reply }).await
    }

    pub async fn restore_activity(&self, id: EntityId) -> Result<()> {
        self.request(|reply| Command::RestoreActivity { id, reply }).await
    }

    pub async fn restore_reminder(&self, id: EntityId) -> Result<()> {
        self.request(|reply| Command::RestoreReminder { id, reply }).await
    }

    pub async fn restore_project(&self, id: EntityId) -> Result<()> {
        self.request(|reply| Command::RestoreProject { id, reply }).await
    }

    pub async fn activities(&self) -> Result<Vec<Activity>> {
        self.request(|reply| Command::Activities { reply }).await
    }

    pub async fn reminders(&self) -> Result<Vec<Reminder>> {
        self.request(|reply| Command::Reminders { reply }).await
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        self.request(|reply| Command::Projects { reply }).await
    }

    /// The decision currently awaiting an answer, if any.
    pub async fn pending_decision(&self) -> Result<Option<DecisionRequest>> {
        self.request(|reply| Command::PendingDecision { reply }).await
    }

    /// Answer the current decision. Returns the next surfaced request
    /// when the queue was non-empty.
    pub async fn resolve(
        &self,
        id: Uuid,
        answer: DecisionAnswer,
    ) -> Result<Option<DecisionRequest>> {
        self.request(|reply| Command::Resolve { id, answer, reply }).await
    }

    /// Feed entries with an id greater than `last_seen`.
    pub async fn notifications_since(&self, last_seen: u64) -> Result<Vec<Notification>> {
        self.request(|reply| Command::NotificationsSince { last_seen, reply })
            .await
    }

    pub async fn budget(&self) -> Result<BudgetAllocation> {
        self.request(|reply| Command::Budget { reply }).await
    }

    pub async fn assign_budget(&self, allocation: BudgetAllocation) -> Result<()> {
        self.request(|reply| Command::AssignBudget { allocation, reply }).await
    }

    pub async fn utilization(&self) -> Result<Vec<ModeUtilization>> {
        self.request(|reply| Command::Utilization { reply }).await
    }

    pub async fn completion(&self) -> Result<Vec<ActivityGroup>> {
        self.request(|reply| Command::Completion { reply }).await
    }

    pub async fn execution(&self) -> Result<Vec<ProjectExecution>> {
        self.request(|reply| Command::Execution { reply }).await
    }

    pub async fn report(&self, window_days: Option<i64>) -> Result<WeeklyReport> {
        self.request(|reply| Command::Report { window_days, reply }).await
    }

    /// Apply a parsed conversational command.
    pub async fn intent(&self, command: IntentCommand) -> Result<IntentReply> {
        self.request(|reply| Command::Intent { command, reply }).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Stop the service and hand back the final state.
    pub async fn shutdown(&self) -> Result<Snapshot> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

/// Start the service task. The returned handle drives it; dropping
/// every handle stops the loop.
pub fn spawn(config: &Config, store: EntityStore) -> (Handle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);
    let service = Service::new(config, store, rx);
    let join = tokio::spawn(service.run());
    (Handle { tx }, join)
}

struct Service {
    store: EntityStore,
    engine: TriggerEngine,
    gate: DecisionGate,
    feed: NotificationFeed,
    budget: BudgetAllocation,
    tick: std::time::Duration,
    rx: mpsc::Receiver<Command>,
}

impl Service {
    fn new(config: &Config, store: EntityStore, rx: mpsc::Receiver<Command>) -> Self {
        Self {
            store,
            engine: TriggerEngine::with_freshness(config.engine.freshness()),
            gate: DecisionGate::new(),
            feed: NotificationFeed::new(),
            budget: config.budget_allocation(),
            tick: config.engine.tick_interval(),
            rx,
        }
    }

    async fn run(mut self) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(tick = ?self.tick, "runtime service started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.handle_tick(Utc::now());
                }
                command = self.rx.recv() => {
                    match command {
                        Some(Command::Shutdown { reply }) => {
                            let _ = reply.send(Ok(self.store.snapshot()));
                            break;
                        }
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
            }
        }

        info!("runtime service stopped");
    }

    /// One scan pass. Fresh events go through the gate, stale ones are
    /// resolved in place; both leave a feed entry first.
    fn handle_tick(&mut self, now: DateTime<Utc>) {
        trace!(%now, "tick");
        let events = self
            .engine
            .scan(now, self.store.all_activities(), self.store.all_reminders());

        for event in events {
            let entry = self.feed.push(event.message.clone(), event.detected_at);
            debug!(id = entry.id, message = %entry.message, "notification recorded");

            match event.disposition {
                Disposition::Fresh(request) => match self.gate.submit(request) {
                    Admission::Surfaced => {
                        debug!(name = %event.entity_name, "decision surfaced");
                    }
                    Admission::Queued { position } => {
                        debug!(name = %event.entity_name, position, "decision queued");
                    }
                },
                Disposition::Stale => {
                    if let Err(error) = trigger::apply_stale(&mut self.store, &event) {
                        warn!(%error, name = %event.entity_name, "stale auto-resolution failed");
                    }
                }
            }
        }

        self.engine
            .evict(self.store.all_activities(), self.store.all_reminders());
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::AddActivity { draft, reply } => {
                let _ = reply.send(self.store.add_activity(draft));
            }
            Command::AddReminder { draft, reply } => {
                let _ = reply.send(self.store.add_reminder(draft));
            }
            Command::AddProject { draft, reply } => {
                let _ = reply.send(self.store.add_project(draft));
            }
            Command::UpdateActivity { id, patch, reply } => {
                let _ = reply.send(self.store.update_activity(id, &patch));
            }
            Command::UpdateReminder { id, patch, reply } => {
                let _ = reply.send(self.store.update_reminder(id, &patch));
            }
            Command::UpdateProject { id, patch, reply } => {
                let _ = reply.send(self.store.update_project(id, &patch));
            }
            Command::CompleteActivity { id, reply } => {
                let _ = reply.send(self.store.complete_activity(id));
            }
            Command::CompleteReminder { id, reply } => {
                let _ = reply.send(self.store.complete_reminder(id));
            }
            Command::DeleteActivity { id, reply } => {
                let result = self.store.delete_activity(id);
                if result.is_ok() {
                    self.gate.retract(EventKey {
                        kind: EntityKind::Activity,
                        id,
                    });
                }
                let _ = reply.send(result);
            }
            Command::DeleteReminder { id, reply } => {
                let result = self.store.delete_reminder(id);
                if result.is_ok() {
                    self.gate.retract(EventKey {
                        kind: EntityKind::Reminder,
                        id,
                    });
                }
                let _ = reply.send(result);
            }
            Command::DeleteProject { id, mode, reply } => {
                let result = self.store.delete_project(id, mode);
                if result.is_ok() {
                    self.retract_deleted();
                }
                let _ = reply.send(result);
            }
            Command::RestoreActivity { id, reply } => {
                let _ = reply.send(self.store.restore_activity(id));
            }
            Command::RestoreReminder { id, reply } => {
                let _ = reply.send(self.store.restore_reminder(id));
            }
            Command::RestoreProject { id, reply } => {
                let _ = reply.send(self.store.restore_project(id));
            }
            Command::Activities { reply } => {
                let _ = reply.send(Ok(self.store.activities()));
            }
            Command::Reminders { reply } => {
                let _ = reply.send(Ok(self.store.reminders()));
            }
            Command::Projects { reply } => {
                let _ = reply.send(Ok(self.store.projects()));
            }
            Command::PendingDecision { reply } => {
                let _ = reply.send(Ok(self.gate.current().cloned()));
            }
            Command::Resolve { id, answer, reply } => {
                let _ = reply.send(self.resolve_decision(id, answer));
            }
            Command::NotificationsSince { last_seen, reply } => {
                let _ = reply.send(Ok(self.feed.since(last_seen).to_vec()));
            }
            Command::Budget { reply } => {
                let _ = reply.send(Ok(self.budget));
            }
            Command::AssignBudget { allocation, reply } => {
                // Revalidated here; handles can be fed raw struct literals.
                let result =
                    BudgetAllocation::assign(allocation.work, allocation.sleep, allocation.relax)
                        .map(|valid| {
                            self.budget = valid;
                        })
                        .map_err(CoreError::from);
                let _ = reply.send(result);
            }
            Command::Utilization { reply } => {
                let _ = reply.send(Ok(mode_utilization(&self.budget, self.store.all_activities())));
            }
            Command::Completion { reply } => {
                let _ = reply.send(Ok(group_completion(self.store.all_activities())));
            }
            Command::Execution { reply } => {
                let _ = reply.send(Ok(project_execution(
                    self.store.all_projects(),
                    self.store.all_activities(),
                )));
            }
            Command::Report { window_days, reply } => {
                let analyzer = match window_days {
                    Some(days) => WeeklyReportAnalyzer::with_window(days),
                    None => WeeklyReportAnalyzer::new(),
                };
                let _ = reply.send(Ok(analyzer.analyze(
                    Utc::now(),
                    self.store.all_activities(),
                    self.store.all_reminders(),
                )));
            }
            Command::Intent { command, reply } => {
                let _ = reply.send(intent::apply(&mut self.store, command, Utc::now()));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(Ok(self.store.snapshot()));
            }
            // Shutdown is intercepted by the run loop.
            Command::Shutdown { reply } => {
                let _ = reply.send(Ok(self.store.snapshot()));
            }
        }
    }

    fn resolve_decision(
        &mut self,
        id: Uuid,
        answer: DecisionAnswer,
    ) -> Result<Option<DecisionRequest>> {
        let (resolved, _) = self.gate.resolve(id)?;
        trigger::apply_decision(&mut self.store, &resolved, answer)?;
        debug!(name = %resolved.entity_name, ?answer, "decision resolved");
        Ok(self.gate.current().cloned())
    }

    /// After a cascade delete, withdraw prompts whose entity went away.
    fn retract_deleted(&mut self) {
        let gone: Vec<EventKey> = self
            .store
            .all_activities()
            .iter()
            .filter(|a| a.deleted)
            .map(|a| EventKey {
                kind: EntityKind::Activity,
                id: a.id,
            })
            .chain(
                self.store
                    .all_reminders()
                    .iter()
                    .filter(|r| r.deleted)
                    .map(|r| EventKey {
                        kind: EntityKind::Reminder,
                        id: r.id,
                    }),
            )
            .collect();
        for key in gone {
            self.gate.retract(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Mode, Priority, Recurrence};
    use chrono::{Duration, TimeZone};

    fn service() -> (Service, mpsc::Sender<Command>) {
        let (tx, rx) = mpsc::channel(8);
        let config = Config::default();
        (Service::new(&config, EntityStore::new(), rx), tx)
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
    }

    fn draft(name: &str, start: DateTime<Utc>) -> ActivityDraft {
        ActivityDraft {
            name: name.into(),
            start_time: start,
            end_time: start + Duration::minutes(60),
            priority: Priority::Medium,
            mode: Mode::Work,
            project: None,
            recurrence: Recurrence::None,
        }
    }

    #[test]
    fn tick_routes_fresh_events_through_the_gate() {
        let (mut service, _tx) = service();
        let start = at(9, 0);
        service.store.add_activity(draft("Standup", start)).unwrap();

        service.handle_tick(start);

        assert_eq!(service.feed.len(), 1);
        assert_eq!(service.feed.all()[0].message, "Activity: Standup is starting now!");
        let request = service.gate.current().cloned().unwrap();
        assert_eq!(request.prompt, "Activity \"Standup\" is starting now. Start?");

        // Answer through the same path the channel uses.
        let next = service
            .resolve_decision(request.id, DecisionAnswer::Confirm)
            .unwrap();
        assert!(next.is_none());
        let activity = &service.store.activities()[0];
        assert_eq!(activity.actual_start, Some(start));
    }

    #[test]
    fn tick_auto_resolves_stale_crossings() {
        let (mut service, _tx) = service();
        let start = at(9, 0);
        service.store.add_activity(draft("Missed", start)).unwrap();

        service.handle_tick(at(11, 0));

        assert!(service.gate.is_idle());
        assert_eq!(service.feed.len(), 1);
        let activity = &service.store.activities()[0];
        assert_eq!(activity.actual_start, Some(at(11, 0)));
    }

    #[test]
    fn concurrent_crossings_queue_behind_the_prompt() {
        let (mut service, _tx) = service();
        let start = at(9, 0);
        service.store.add_activity(draft("First", start)).unwrap();
        service.store.add_activity(draft("Second", start)).unwrap();

        service.handle_tick(start);

        assert_eq!(service.feed.len(), 2);
        assert_eq!(service.gate.queue_len(), 1);
        let current = service.gate.current().cloned().unwrap();
        assert_eq!(current.entity_name, "First");

        let next = service
            .resolve_decision(current.id, DecisionAnswer::Decline)
            .unwrap()
            .unwrap();
        assert_eq!(next.entity_name, "Second");
    }

    #[test]
    fn deleting_the_entity_withdraws_its_prompt() {
        let (mut service, _tx) = service();
        let start = at(9, 0);
        let (added, _) = service.store.add_activity(draft("Doomed", start)).unwrap();

        service.handle_tick(start);
        assert!(service.gate.current().is_some());

        service.handle_command(Command::DeleteActivity {
            id: added.id,
            reply: oneshot::channel().0,
        });
        assert!(service.gate.is_idle());
    }

    #[tokio::test]
    async fn handle_round_trips_through_the_task() {
        let config = Config::default();
        let (handle, join) = spawn(&config, EntityStore::new());

        let (activity, pair) = handle
            .add_activity(draft("Via handle", Utc::now() + Duration::hours(1)))
            .await
            .unwrap();
        assert!(pair.is_empty());
        assert_eq!(activity.name, "Via handle");

        let listed = handle.activities().await.unwrap();
        assert_eq!(listed.len(), 1);

        let report = handle.report(None).await.unwrap();
        assert_eq!(report.window_days, 7);

        let snapshot = handle.shutdown().await.unwrap();
        assert_eq!(snapshot.activities.len(), 1);
        join.await.unwrap();

        assert!(matches!(
            handle.activities().await,
            Err(CoreError::ServiceStopped)
        ));
    }
}
