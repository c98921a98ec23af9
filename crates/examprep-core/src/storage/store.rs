//! Typed durable store.
//!
//! Every persisted record is owned here. Reads never fail: a missing,
//! unreadable or corrupted value yields the caller's default (and a `warn`
//! event). Writes either land completely or not at all.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::backend::{KvBackend, MemoryBackend, SqliteBackend};
use super::data_dir;
use crate::error::{Result, StorageError};
use crate::model::{
    ChaptersCompleted, Collection, GamificationStats, HoursStudied, Record, Settings, Snapshot,
    TrackingProgress,
};

/// Persisted keys. The string form is the on-disk key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    UserSettings,
    GamificationStats,
    MockTests,
    TrackingProgress,
    CompletionHistory,
    Reminders,
    QuizHistory,
    Doubts,
    ChaptersCompletedThisWeek,
    HoursStudiedToday,
    IsSetupComplete,
}

impl Key {
    pub const ALL: [Key; 11] = [
        Key::UserSettings,
        Key::GamificationStats,
        Key::MockTests,
        Key::TrackingProgress,
        Key::CompletionHistory,
        Key::Reminders,
        Key::QuizHistory,
        Key::Doubts,
        Key::ChaptersCompletedThisWeek,
        Key::HoursStudiedToday,
        Key::IsSetupComplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Key::UserSettings => "userSettings",
            Key::GamificationStats => "gamificationStats",
            Key::MockTests => "mockTests",
            Key::TrackingProgress => "trackingProgress",
            Key::CompletionHistory => "completionHistory",
            Key::Reminders => "reminders",
            Key::QuizHistory => "quizHistory",
            Key::Doubts => "doubts",
            Key::ChaptersCompletedThisWeek => "chaptersCompletedThisWeek",
            Key::HoursStudiedToday => "hoursStudiedToday",
            Key::IsSetupComplete => "isSetupComplete",
        }
    }
}

impl From<Collection> for Key {
    fn from(collection: Collection) -> Self {
        match collection {
            Collection::MockTests => Key::MockTests,
            Collection::CompletionHistory => Key::CompletionHistory,
            Collection::Reminders => Key::Reminders,
            Collection::QuizHistory => Key::QuizHistory,
            Collection::Doubts => Key::Doubts,
        }
    }
}

/// A set of writes applied atomically by [`Store::commit`].
///
/// A later `put` for the same key replaces the earlier one.
#[derive(Debug, Default)]
pub struct WriteBatch {
    entries: Vec<(String, String)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `value` and queue it under `key`.
    pub fn put<T: Serialize>(&mut self, key: Key, value: &T) -> Result<&mut Self, StorageError> {
        let encoded = serde_json::to_string(value).map_err(|e| StorageError::EncodeFailed {
            key: key.as_str().to_string(),
            message: e.to_string(),
        })?;
        self.entries.push((key.as_str().to_string(), encoded));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The single source of truth for application state.
pub struct Store {
    backend: Box<dyn KvBackend>,
}

impl Store {
    /// Open the store at `<data_dir>/examprep.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("examprep.db");
        Self::open_at(&path)
    }

    /// Open a SQLite-backed store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening store");
        Ok(Self::with_backend(Box::new(SqliteBackend::open(path)?)))
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    pub fn with_backend(backend: Box<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// Read `key`, falling back to `default` when absent or unreadable.
    pub fn read<T: DeserializeOwned>(&self, key: Key, default: T) -> T {
        let raw = match self.backend.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "store unavailable, using default");
                return default;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "corrupted value, using default");
                default
            }
        }
    }

    pub fn read_or_default<T: DeserializeOwned + Default>(&self, key: Key) -> T {
        self.read(key, T::default())
    }

    /// Persist a single value.
    pub fn write<T: Serialize>(&mut self, key: Key, value: &T) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put(key, value)?;
        self.commit(batch)
    }

    /// Apply every write in `batch` atomically.
    pub fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.backend.put_all(&batch.entries)?;
        Ok(())
    }

    /// Clear every persisted key.
    pub fn reset(&mut self) -> Result<()> {
        self.backend.clear()?;
        info!("store cleared");
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        self.read_or_default(Key::UserSettings)
    }

    pub fn gamification(&self) -> GamificationStats {
        self.read_or_default(Key::GamificationStats)
    }

    pub fn is_setup_complete(&self) -> bool {
        self.read(Key::IsSetupComplete, false)
    }

    pub fn chapters_this_week(&self, week_start: NaiveDateTime) -> ChaptersCompleted {
        self.read(
            Key::ChaptersCompletedThisWeek,
            ChaptersCompleted::starting(week_start),
        )
    }

    pub fn hours_today(&self, today: NaiveDate) -> HoursStudied {
        self.read(Key::HoursStudiedToday, HoursStudied::on(today))
    }

    pub fn progress(&self) -> TrackingProgress {
        self.read_or_default(Key::TrackingProgress)
    }

    pub fn records(&self, collection: Collection) -> Vec<Record> {
        self.read_or_default(collection.into())
    }

    /// Hydrate every record at once.
    ///
    /// `week_start` and `today` only seed the defaults of the windowed counters.
    pub fn snapshot(&self, week_start: NaiveDateTime, today: NaiveDate) -> Snapshot {
        Snapshot {
            is_setup_complete: self.is_setup_complete(),
            settings: self.settings(),
            gamification: self.gamification(),
            chapters_completed_this_week: self.chapters_this_week(week_start),
            hours_studied_today: self.hours_today(today),
            progress: self.progress(),
            mock_tests: self.records(Collection::MockTests),
            completion_history: self.records(Collection::CompletionHistory),
            reminders: self.records(Collection::Reminders),
            quiz_history: self.records(Collection::QuizHistory),
            doubts: self.records(Collection::Doubts),
        }
    }
}
