//! Gamification ledger: experience, level and daily streak.
//!
//! ## Streak rules
//!
//! ```text
//! last studied == today      -> unchanged
//! last studied == yesterday  -> streak + 1
//! never studied / streak 0   -> streak = 1
//! older (broken)             -> restarted at 1 (reported, never silent)
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::clock::yesterday;
use crate::error::Result;
use crate::model::GamificationStats;
use crate::storage::{Key, Store};

/// A study event to credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub xp: u64,
    /// Whether the event counts as studying today for streak purposes.
    pub studied_today: bool,
}

impl Credit {
    pub fn study(xp: u64) -> Self {
        Self {
            xp,
            studied_today: true,
        }
    }

    pub fn xp_only(xp: u64) -> Self {
        Self {
            xp,
            studied_today: false,
        }
    }
}

/// How a credit affected the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreakChange {
    Unchanged,
    /// First credited day of a new streak.
    Started,
    Extended,
    /// The streak was broken and restarted at 1.
    Restarted { lost: u32 },
}

/// Result of [`Ledger::credit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditOutcome {
    pub xp_gained: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub streak_before: u32,
    pub streak_after: u32,
    pub change: StreakChange,
}

impl CreditOutcome {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// A broken streak found at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakBreak {
    pub streak: u32,
    pub last_studied: NaiveDate,
}

/// Owns the experience/level/streak arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct Ledger {
    xp_per_level: u64,
}

impl Ledger {
    pub fn new(xp_per_level: u64) -> Self {
        Self {
            xp_per_level: xp_per_level.max(1),
        }
    }

    /// Gamification level reached with `xp` experience. Starts at 1.
    pub fn level_for_xp(&self, xp: u64) -> u32 {
        u32::try_from(xp / self.xp_per_level)
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1)
    }

    /// `Some` when a live streak's last study day is before yesterday.
    pub fn detect_break(&self, stats: &GamificationStats, today: NaiveDate) -> Option<StreakBreak> {
        if stats.streak == 0 {
            return None;
        }
        let last = stats.last_studied_date?;
        if last < yesterday(today) {
            Some(StreakBreak {
                streak: stats.streak,
                last_studied: last,
            })
        } else {
            None
        }
    }

    /// Apply `credit` to the stored stats.
    pub fn credit(
        &self,
        store: &mut Store,
        credit: Credit,
        today: NaiveDate,
    ) -> Result<CreditOutcome> {
        let mut stats = store.gamification();
        let outcome = self.apply(&mut stats, credit, today);
        store.write(Key::GamificationStats, &stats)?;
        Ok(outcome)
    }

    /// In-memory form of [`Ledger::credit`], for callers that persist `stats`
    /// together with other records.
    pub fn apply(
        &self,
        stats: &mut GamificationStats,
        credit: Credit,
        today: NaiveDate,
    ) -> CreditOutcome {
        let level_before = stats.level;
        let streak_before = stats.streak;

        stats.xp = stats.xp.saturating_add(credit.xp);
        stats.level = stats.level.max(self.level_for_xp(stats.xp));

        let change = if !credit.studied_today {
            StreakChange::Unchanged
        } else {
            match stats.last_studied_date {
                Some(last) if last >= today => StreakChange::Unchanged,
                Some(last) if last == yesterday(today) && stats.streak > 0 => {
                    stats.streak = stats.streak.saturating_add(1);
                    stats.last_studied_date = Some(today);
                    StreakChange::Extended
                }
                _ if stats.streak == 0 => {
                    stats.streak = 1;
                    stats.last_studied_date = Some(today);
                    StreakChange::Started
                }
                _ => {
                    let lost = stats.streak;
                    stats.streak = 1;
                    stats.last_studied_date = Some(today);
                    StreakChange::Restarted { lost }
                }
            }
        };

        let outcome = CreditOutcome {
            xp_gained: credit.xp,
            level_before,
            level_after: stats.level,
            streak_before,
            streak_after: stats.streak,
            change,
        };
        if let StreakChange::Restarted { lost } = change {
            info!(lost, "streak broken, restarted at 1");
        }
        if outcome.leveled_up() {
            info!(level = outcome.level_after, xp = stats.xp, "level up");
        }
        outcome
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(100)
    }
}
