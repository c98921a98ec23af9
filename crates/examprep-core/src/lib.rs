//! # ExamPrep Core Library
//!
//! Durable state and temporal-rollover engine for the ExamPrep study
//! tracker. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Storage**: SQLite-backed key-value store with typed reads that fall
//!   back to defaults, plus TOML-based engine configuration
//! - **Rollover**: resets the weekly chapter count and daily hours when
//!   their window has passed
//! - **Ledger**: experience, level and daily streak
//! - **Rescue**: once-per-load offer to revive a broken streak via a quiz
//! - **Settings**: two-phase, confirmation-gated exam level changes
//!
//! ## Key Components
//!
//! - [`Session`]: one application load; runs the start-up effects once
//! - [`Store`]: the single source of truth for persisted records
//! - [`Config`]: engine configuration management

pub mod clock;
pub mod error;
pub mod ledger;
pub mod model;
pub mod rescue;
pub mod rollover;
pub mod session;
pub mod settings;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, SessionError, StorageError, ValidationError};
pub use ledger::{Credit, CreditOutcome, Ledger, StreakBreak, StreakChange};
pub use model::{
    ChaptersCompleted, Collection, ExamLevel, FocusedGroup, GamificationStats, HoursStudied,
    Record, Settings, Snapshot, TrackingProgress,
};
pub use rescue::{QuizOutcome, RescueProtocol, RescueResult, RescueState};
pub use rollover::{RolloverEngine, RolloverReport};
pub use session::{Session, StartReport, Status};
pub use settings::{ApplyOutcome, ConfirmationToken, SettingsController};
pub use storage::{Config, Key, Store};
