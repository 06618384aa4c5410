//! Error hierarchy for the core library, built on thiserror.
//!
//! Every failure in this library is local and recoverable; there is no
//! fatal error class.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for daybeat-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Config file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Draft and patch validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Decision-gate errors
    #[error("Decision error: {0}")]
    Decision(#[from] DecisionError),

    /// Raw filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The runtime service task is gone
    #[error("Runtime service is not running")]
    ServiceStopped,
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record with the given id exists
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: u64 },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not read the config file
    #[error("Could not load config from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Could not write the config file
    #[error("Could not save config to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// The config file is not valid TOML
    #[error("Could not parse config: {0}")]
    ParseFailed(String),
}

/// Input validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// End does not follow start
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Record has no usable name
    #[error("Name must not be empty")]
    EmptyName,

    /// Project names are foreign keys and must stay unique
    #[error("A project named '{name}' already exists")]
    DuplicateProject { name: String },

    /// Status may only move forward
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Weekly budget exceeds the hours in a week
    #[error("Budget total {total}h exceeds the 168h week")]
    BudgetExceeded { total: f64 },
}

/// Decision-gate errors.
#[derive(Error, Debug)]
pub enum DecisionError {
    /// An answer arrived while no decision was outstanding
    #[error("No decision is awaiting an answer")]
    NoPendingDecision,

    /// An answer referenced a request that is not the current one
    #[error("Answer references request {submitted}, which is not the current decision")]
    RequestMismatch { submitted: uuid::Uuid },
}

/// Crate-wide result alias.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
