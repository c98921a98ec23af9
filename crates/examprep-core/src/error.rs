//! Core error types for examprep-core.
//!
//! Only a small set of failures are hard errors here. Corrupted stored
//! values, future-dated timestamps, a declined confirmation and a failed
//! rescue quiz are all recovered locally and never show up as `CoreError`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for examprep-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session protocol misuse
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Statement execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another process
    #[error("Store is locked")]
    Locked,

    /// Value could not be encoded for persistence
    #[error("Failed to encode value for '{key}': {message}")]
    EncodeFailed { key: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Quiz result where the score exceeds the question count
    #[error("Quiz score {score} exceeds total {total}")]
    ScoreOutOfRange { score: u32, total: u32 },

    /// Unknown record collection name
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

/// Errors raised when a session protocol is driven out of order.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// Operation requires `Session::start()` first
    #[error("Session has not been started")]
    NotStarted,

    /// Operation requires first-time setup to be completed
    #[error("Setup has not been completed; run setup first")]
    SetupIncomplete,

    /// Rescue outcome submitted while no rescue is on offer
    #[error("No streak rescue is on offer (state: {state})")]
    RescueNotOffered { state: String },

    /// Confirmation token is unknown, stale or already consumed
    #[error("Confirmation token {0} is not pending")]
    InvalidToken(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
