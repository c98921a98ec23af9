//! Streak rescue protocol.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Offered -> Resolved    (quiz result, dismiss, or studying instead)
//! ```
//!
//! With no broken streak at session start the protocol stays `Idle`.
//!
//! State is per session and never persisted: a reload while `Offered`
//! offers the rescue again.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SessionError, ValidationError};
use crate::ledger::StreakBreak;
use crate::storage::{Key, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RescueState {
    Idle,
    Offered,
    Resolved,
}

impl fmt::Display for RescueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RescueState::Idle => "idle",
            RescueState::Offered => "offered",
            RescueState::Resolved => "resolved",
        };
        f.write_str(s)
    }
}

/// Score reported by the remedial quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub score: u32,
    pub total: u32,
}

/// How the rescue ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RescueResult {
    /// Streak revived at 1.
    Rescued { required: u32 },
    Failed { required: u32 },
    Dismissed,
}

impl RescueResult {
    pub fn message(&self) -> &'static str {
        match self {
            RescueResult::Rescued { .. } => {
                "Great job! Your streak is rescued and set to 1. Keep going!"
            }
            RescueResult::Failed { .. } => {
                "Rescue attempt failed. Try studying a chapter or attempt again tomorrow."
            }
            RescueResult::Dismissed => "Rescue dismissed. Your streak will restart next time you study.",
        }
    }
}

/// Per-session rescue state machine.
#[derive(Debug, Clone)]
pub struct RescueProtocol {
    state: RescueState,
    pass_percent: u32,
    offered_for: Option<StreakBreak>,
    result: Option<RescueResult>,
}

impl RescueProtocol {
    pub fn new(pass_percent: u32) -> Self {
        Self {
            state: RescueState::Idle,
            pass_percent: pass_percent.min(100),
            offered_for: None,
            result: None,
        }
    }

    pub fn state(&self) -> RescueState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == RescueState::Offered
    }

    /// The break the current offer was made for.
    pub fn offered_for(&self) -> Option<StreakBreak> {
        self.offered_for
    }

    pub fn result(&self) -> Option<RescueResult> {
        self.result
    }

    /// Correct answers needed out of `total`: `ceil(total * pass_percent / 100)`.
    pub fn required_score(&self, total: u32) -> u32 {
        let scaled = u64::from(total) * u64::from(self.pass_percent);
        u32::try_from(scaled.div_ceil(100)).unwrap_or(u32::MAX)
    }

    /// Whether `outcome` clears the pass mark. An empty quiz never passes.
    pub fn passes(&self, outcome: QuizOutcome) -> bool {
        outcome.total > 0 && outcome.score >= self.required_score(outcome.total)
    }

    /// Move `Idle -> Offered`. Returns `false` (and changes nothing) in any other state.
    pub fn offer(&mut self, brk: StreakBreak) -> bool {
        if self.state != RescueState::Idle {
            debug!(state = %self.state, "rescue already handled this session");
            return false;
        }
        self.state = RescueState::Offered;
        self.offered_for = Some(brk);
        info!(streak = brk.streak, last_studied = %brk.last_studied, "streak rescue offered");
        true
    }

    /// Resolve the offer with a quiz outcome. A pass revives the streak at 1 as of `today`.
    pub fn resolve(
        &mut self,
        store: &mut Store,
        outcome: QuizOutcome,
        today: NaiveDate,
    ) -> Result<RescueResult> {
        if self.state != RescueState::Offered {
            return Err(SessionError::RescueNotOffered {
                state: self.state.to_string(),
            }
            .into());
        }
        if outcome.score > outcome.total {
            return Err(ValidationError::ScoreOutOfRange {
                score: outcome.score,
                total: outcome.total,
            }
            .into());
        }

        let required = self.required_score(outcome.total);
        let result = if self.passes(outcome) {
            let mut stats = store.gamification();
            stats.streak = 1;
            stats.last_studied_date = Some(today);
            store.write(Key::GamificationStats, &stats)?;
            info!(score = outcome.score, total = outcome.total, "streak rescued");
            RescueResult::Rescued { required }
        } else {
            info!(score = outcome.score, total = outcome.total, required, "streak rescue failed");
            RescueResult::Failed { required }
        };

        self.state = RescueState::Resolved;
        self.result = Some(result);
        Ok(result)
    }

    /// Close the offer without touching state. Counts as a silent fail.
    pub fn dismiss(&mut self) -> Result<RescueResult> {
        if self.state != RescueState::Offered {
            return Err(SessionError::RescueNotOffered {
                state: self.state.to_string(),
            }
            .into());
        }
        self.state = RescueState::Resolved;
        self.result = Some(RescueResult::Dismissed);
        debug!("streak rescue dismissed");
        Ok(RescueResult::Dismissed)
    }
}

impl Default for RescueProtocol {
    fn default() -> Self {
        Self::new(60)
    }
}
