//! Settings mutation controller.
//!
//! A change of exam level invalidates the progress recorded against the old
//! syllabus, so it goes through a two-phase protocol: propose, then commit
//! or cancel with the returned token. Nothing is written until commit.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, SessionError};
use crate::model::{ExamLevel, GamificationStats, Record, Settings, TrackingProgress};
use crate::storage::{Key, Store, WriteBatch};

/// Handle for a pending level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConfirmationToken(Uuid);

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConfirmationToken {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(ConfirmationToken)
            .map_err(|_| SessionError::InvalidToken(s.to_string()))
    }
}

/// Result of [`SettingsController::apply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Settings were written; no other record changed.
    Saved,
    /// The level changes; nothing was written yet.
    ConfirmationRequired {
        token: ConfirmationToken,
        from: ExamLevel,
        to: ExamLevel,
    },
}

#[derive(Debug, Clone)]
struct PendingLevelChange {
    token: ConfirmationToken,
    settings: Settings,
}

#[derive(Debug, Default)]
pub struct SettingsController {
    pending: Option<PendingLevelChange>,
}

impl SettingsController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings awaiting confirmation, if any.
    pub fn pending(&self) -> Option<&Settings> {
        self.pending.as_ref().map(|p| &p.settings)
    }

    /// Save `new`, or stage it behind a confirmation when the exam level changes.
    pub fn apply(&mut self, store: &mut Store, new: Settings) -> Result<ApplyOutcome> {
        let current = store.settings();
        if new.level == current.level {
            store.write(Key::UserSettings, &new)?;
            info!("settings saved");
            return Ok(ApplyOutcome::Saved);
        }
        let to = new.level;
        let token = self.propose_level_change(new);
        Ok(ApplyOutcome::ConfirmationRequired {
            token,
            from: current.level,
            to,
        })
    }

    /// Stage `new` and return the token that commits it. Replaces any earlier proposal.
    pub fn propose_level_change(&mut self, new: Settings) -> ConfirmationToken {
        let token = ConfirmationToken(Uuid::new_v4());
        self.pending = Some(PendingLevelChange {
            token,
            settings: new,
        });
        token
    }

    /// Commit a staged level change: wipe level-scoped records and save the settings
    /// in one atomic batch.
    pub fn commit_level_change(
        &mut self,
        store: &mut Store,
        token: ConfirmationToken,
    ) -> Result<Settings> {
        let pending = self.take_pending(token)?;
        let previous = store.settings().level;

        let empty: Vec<Record> = Vec::new();
        let mut batch = WriteBatch::new();
        batch
            .put(Key::TrackingProgress, &TrackingProgress::new())?
            .put(Key::GamificationStats, &GamificationStats::default())?
            .put(Key::MockTests, &empty)?
            .put(Key::CompletionHistory, &empty)?
            .put(Key::Reminders, &empty)?
            .put(Key::QuizHistory, &empty)?
            .put(Key::Doubts, &empty)?
            .put(Key::UserSettings, &pending.settings)?;

        if let Err(err) = store.commit(batch) {
            // Keep the proposal so the caller can retry with the same token.
            self.pending = Some(pending);
            return Err(err);
        }

        info!(from = %previous, to = %pending.settings.level, "exam level changed, progress reset");
        Ok(pending.settings)
    }

    /// Drop a staged level change. Nothing is written.
    pub fn cancel(&mut self, token: ConfirmationToken) -> Result<()> {
        self.take_pending(token)?;
        info!("level change cancelled");
        Ok(())
    }

    fn take_pending(&mut self, token: ConfirmationToken) -> Result<PendingLevelChange> {
        match self.pending.take() {
            Some(p) if p.token == token => Ok(p),
            other => {
                self.pending = other;
                Err(SessionError::InvalidToken(token.to_string()).into())
            }
        }
    }
}
