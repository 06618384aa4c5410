//! # Daybeat Core Library
//!
//! This library provides the core logic for the Daybeat schedule
//! companion. It implements a CLI-first philosophy where all operations
//! are available via a standalone CLI binary, with any GUI being a thin
//! layer over the same core library.
//!
//! ## Architecture
//!
//! - **Trigger Engine**: A wall-clock scanner that detects boundary
//!   crossings (activity starts, reminder dues) exactly once and routes
//!   fresh crossings through a single-flight decision gate
//! - **Entity Store**: In-memory collections with soft delete, partial
//!   patches and cached project milestone counts
//! - **Analytics**: Pure rollups (budget utilization, completion,
//!   execution, trailing-window report) with defined zero semantics
//! - **Runtime**: One tokio task owning all mutable state, driven by a
//!   command channel and a periodic tick
//!
//! ## Key Components
//!
//! - [`TriggerEngine`]: Boundary-crossing detector
//! - [`DecisionGate`]: Single outstanding prompt, FIFO overflow
//! - [`EntityStore`]: Activities, reminders, projects
//! - [`runtime::Handle`]: Async client for the service task

pub mod analytics;
pub mod budget;
pub mod config;
pub mod countdown;
pub mod entity;
pub mod error;
pub mod intent;
pub mod notification;
pub mod runtime;
pub mod store;
pub mod trigger;

pub use budget::{format_hours, BudgetAllocation};
pub use config::Config;
pub use countdown::CountdownEntry;
pub use entity::{
    Activity, ActivityDraft, ActivityPatch, ActivityStatus, EntityId, Mode, Priority, Project,
    ProjectDraft, ProjectPatch, ProjectStatus, Recurrence, Reminder, ReminderDraft, ReminderPatch,
    ReminderStatus,
};
pub use error::{ConfigError, CoreError, DecisionError, StoreError, ValidationError};
pub use intent::{IntentCommand, IntentReply};
pub use notification::{Notification, NotificationFeed};
pub use store::{EntityStore, ProjectDeleteMode, Snapshot};
pub use trigger::{
    DecisionAnswer, DecisionGate, DecisionRequest, Disposition, EntityKind, EventKey,
    TriggerEngine, TriggerEvent,
};
