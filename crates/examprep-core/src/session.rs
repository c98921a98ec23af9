//! Session orchestration.
//!
//! A `Session` is one application load. It owns the store and hands it to
//! each component explicitly. `start()` runs the once-per-load effects
//! (rollover, then streak-break detection) and is guarded so a second call
//! returns the first report without doing anything.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = Session::new(Store::open()?, Box::new(SystemClock), &Config::load()?);
//! session.start()?;
//! session.complete_chapter(50)?;
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::{week_start, Clock};
use crate::error::{Result, SessionError, ValidationError};
use crate::ledger::{Credit, CreditOutcome, Ledger, StreakBreak};
use crate::model::{Collection, Record, Settings, Snapshot};
use crate::rescue::{QuizOutcome, RescueProtocol, RescueResult, RescueState};
use crate::rollover::{RolloverEngine, RolloverReport};
use crate::settings::{ApplyOutcome, ConfirmationToken, SettingsController};
use crate::storage::{Config, Key, Store, WriteBatch};

/// What `start()` did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartReport {
    pub rollover: RolloverReport,
    pub streak_break: Option<StreakBreak>,
    pub rescue_offered: bool,
}

/// Store snapshot plus per-session state, for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub rescue: RescueState,
    pub week_start: NaiveDateTime,
    pub today: NaiveDate,
    pub weekly_goal_met: bool,
    pub daily_goal_met: bool,
}

pub struct Session {
    store: Store,
    clock: Box<dyn Clock>,
    rollover: RolloverEngine,
    ledger: Ledger,
    rescue: RescueProtocol,
    settings: SettingsController,
    pass_percent: u32,
    started: Option<StartReport>,
}

impl Session {
    pub fn new(store: Store, clock: Box<dyn Clock>, config: &Config) -> Self {
        Self {
            store,
            clock,
            rollover: RolloverEngine::new(config.calendar.week_start),
            ledger: Ledger::new(config.gamification.xp_per_level),
            rescue: RescueProtocol::new(config.rescue.pass_percent),
            settings: SettingsController::new(),
            pass_percent: config.rescue.pass_percent,
            started: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn current_week_start(&self) -> NaiveDateTime {
        week_start(self.clock.now(), self.rollover.first_day())
    }

    pub fn is_started(&self) -> bool {
        self.started.is_some()
    }

    /// Run the session-start effects once.
    pub fn start(&mut self) -> Result<&StartReport> {
        if self.started.is_some() {
            debug!("session already started");
        } else {
            let report = self.run_start()?;
            self.started = Some(report);
        }
        self.started.as_ref().ok_or_else(|| SessionError::NotStarted.into())
    }

    fn run_start(&mut self) -> Result<StartReport> {
        let now = self.clock.now();
        let rollover = self.rollover.reconcile(&mut self.store, now)?;

        let stats = self.store.gamification();
        let streak_break = self.ledger.detect_break(&stats, now.date());
        let rescue_offered = match streak_break {
            Some(brk) => self.rescue.offer(brk),
            None => false,
        };

        info!(
            rolled_week = rollover.week_reset.is_some(),
            rolled_day = rollover.day_reset.is_some(),
            rescue_offered,
            "session started"
        );
        Ok(StartReport {
            rollover,
            streak_break,
            rescue_offered,
        })
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started.is_none() {
            return Err(SessionError::NotStarted.into());
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store
            .snapshot(self.current_week_start(), self.clock.today())
    }

    pub fn status(&self) -> Status {
        let snapshot = self.snapshot();
        let weekly_goal_met = snapshot.chapters_completed_this_week.count
            >= snapshot.settings.weekly_chapter_goal;
        let daily_goal_met =
            snapshot.hours_studied_today.hours >= snapshot.settings.daily_hours_goal;
        Status {
            rescue: self.rescue.state(),
            week_start: self.current_week_start(),
            today: self.clock.today(),
            weekly_goal_met,
            daily_goal_met,
            snapshot,
        }
    }

    // ── Setup ────────────────────────────────────────────────────────

    pub fn is_setup_complete(&self) -> bool {
        self.store.is_setup_complete()
    }

    pub fn ensure_setup_complete(&self) -> Result<()> {
        if !self.is_setup_complete() {
            return Err(SessionError::SetupIncomplete.into());
        }
        Ok(())
    }

    /// Save the initial settings and mark setup done, atomically.
    pub fn complete_setup(&mut self, settings: Settings) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch
            .put(Key::UserSettings, &settings)?
            .put(Key::IsSetupComplete, &true)?;
        self.store.commit(batch)?;
        info!(level = %settings.level, "setup complete");
        Ok(())
    }

    // ── Study events ─────────────────────────────────────────────────

    /// Credit a study event. Studying while a rescue is on offer closes the
    /// offer, and the broken streak restarts at 1.
    pub fn credit(&mut self, credit: Credit) -> Result<CreditOutcome> {
        self.ensure_started()?;
        let today = self.clock.today();
        let outcome = self.ledger.credit(&mut self.store, credit, today)?;
        self.close_rescue_after(credit)?;
        Ok(outcome)
    }

    fn close_rescue_after(&mut self, credit: Credit) -> Result<()> {
        if credit.studied_today && self.rescue.is_pending() {
            info!("studied instead of taking the rescue quiz");
            self.rescue.dismiss()?;
        }
        Ok(())
    }

    /// A chapter was finished: bump this week's count and credit `xp`.
    pub fn complete_chapter(&mut self, xp: u64) -> Result<CreditOutcome> {
        self.ensure_started()?;
        let today = self.clock.today();
        let mut chapters = self.store.chapters_this_week(self.current_week_start());
        chapters.count = chapters.count.saturating_add(1);

        let mut stats = self.store.gamification();
        let outcome = self
            .ledger
            .apply(&mut stats, Credit::study(xp), today);

        let mut batch = WriteBatch::new();
        batch
            .put(Key::ChaptersCompletedThisWeek, &chapters)?
            .put(Key::GamificationStats, &stats)?;
        self.store.commit(batch)?;
        self.close_rescue_after(Credit::study(xp))?;
        info!(count = chapters.count, "chapter completed");
        Ok(outcome)
    }

    /// Add focused study time to today's total and credit `xp`.
    pub fn log_study_hours(&mut self, hours: f64, xp: u64) -> Result<CreditOutcome> {
        self.ensure_started()?;
        if !hours.is_finite() || hours <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "hours".into(),
                message: format!("expected a positive number, got {hours}"),
            }
            .into());
        }
        let today = self.clock.today();
        let mut studied = self.store.hours_today(today);
        studied.hours += hours;

        let mut stats = self.store.gamification();
        let outcome = self
            .ledger
            .apply(&mut stats, Credit::study(xp), today);

        let mut batch = WriteBatch::new();
        batch
            .put(Key::HoursStudiedToday, &studied)?
            .put(Key::GamificationStats, &stats)?;
        self.store.commit(batch)?;
        self.close_rescue_after(Credit::study(xp))?;
        info!(hours = studied.hours, "study time logged");
        Ok(outcome)
    }

    // ── Rescue ───────────────────────────────────────────────────────

    pub fn rescue(&self) -> &RescueProtocol {
        &self.rescue
    }

    pub fn pass_percent(&self) -> u32 {
        self.pass_percent
    }

    pub fn submit_rescue(&mut self, outcome: QuizOutcome) -> Result<RescueResult> {
        self.ensure_started()?;
        let today = self.clock.today();
        self.rescue.resolve(&mut self.store, outcome, today)
    }

    pub fn dismiss_rescue(&mut self) -> Result<RescueResult> {
        self.ensure_started()?;
        self.rescue.dismiss()
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn apply_settings(&mut self, settings: Settings) -> Result<ApplyOutcome> {
        self.settings.apply(&mut self.store, settings)
    }

    pub fn propose_level_change(&mut self, settings: Settings) -> ConfirmationToken {
        self.settings.propose_level_change(settings)
    }

    pub fn commit_level_change(&mut self, token: ConfirmationToken) -> Result<Settings> {
        let saved = self.settings.commit_level_change(&mut self.store, token)?;
        if self.rescue.is_pending() {
            // The streak it was offered for no longer exists.
            self.rescue.dismiss()?;
        }
        Ok(saved)
    }

    pub fn cancel_level_change(&mut self, token: ConfirmationToken) -> Result<()> {
        self.settings.cancel(token)
    }

    // ── Collections ──────────────────────────────────────────────────

    /// Append `record` to `collection`, returning the new length.
    pub fn add_record(&mut self, collection: Collection, record: Record) -> Result<usize> {
        let mut records = self.store.records(collection);
        records.push(record);
        self.store.write(collection.into(), &records)?;
        Ok(records.len())
    }

    /// Set the tracking progress entry for `id`.
    pub fn set_progress(&mut self, id: &str, value: Record) -> Result<()> {
        let mut progress = self.store.progress();
        progress.insert(id.to_string(), value);
        self.store.write(Key::TrackingProgress, &progress)
    }

    // ── Reset ────────────────────────────────────────────────────────

    /// Clear every persisted key and start a fresh session on the same store.
    pub fn reset_all(&mut self) -> Result<&StartReport> {
        self.store.reset()?;
        self.rescue = RescueProtocol::new(self.pass_percent);
        self.settings = SettingsController::new();
        self.started = None;
        info!("all data reset, restarting session");
        self.start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::ledger::StreakChange;
    use crate::model::{ExamLevel, GamificationStats};
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn session_with(store: Store) -> Session {
        Session::new(store, Box::new(FixedClock::on(today())), &Config::default())
    }

    fn broken_streak_store() -> Store {
        let mut store = Store::in_memory();
        store
            .write(
                Key::GamificationStats,
                &GamificationStats {
                    xp: 120,
                    level: 2,
                    streak: 5,
                    last_studied_date: Some(today() - Duration::days(2)),
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn start_runs_once() {
        let mut session = session_with(broken_streak_store());
        let first = session.start().unwrap().clone();
        assert!(first.rescue_offered);

        let second = session.start().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(session.rescue().state(), RescueState::Offered);
    }

    #[test]
    fn operations_require_start() {
        let mut session = session_with(Store::in_memory());
        assert!(session.credit(Credit::study(10)).is_err());
        assert!(session.complete_chapter(10).is_err());
    }

    #[test]
    fn studying_during_pending_rescue_restarts_streak() {
        let mut session = session_with(broken_streak_store());
        session.start().unwrap();

        let out = session.complete_chapter(15).unwrap();
        assert_eq!(out.change, StreakChange::Restarted { lost: 5 });
        let stats = session.store().gamification();
        assert_eq!(stats.streak, 1);
        assert_eq!(stats.last_studied_date, Some(today()));
        assert_eq!(session.rescue().state(), RescueState::Resolved);
        assert_eq!(session.rescue().result(), Some(RescueResult::Dismissed));
    }

    #[test]
    fn xp_only_credit_keeps_rescue_open() {
        let mut session = session_with(broken_streak_store());
        session.start().unwrap();

        let out = session.credit(Credit::xp_only(15)).unwrap();
        assert_eq!(out.change, StreakChange::Unchanged);
        assert_eq!(session.store().gamification().streak, 5);
        assert_eq!(session.rescue().state(), RescueState::Offered);
    }

    #[test]
    fn credit_after_dismissed_rescue_restarts_streak() {
        let mut session = session_with(broken_streak_store());
        session.start().unwrap();
        session.dismiss_rescue().unwrap();

        let out = session.credit(Credit::study(15)).unwrap();
        assert_eq!(out.change, StreakChange::Restarted { lost: 5 });
        assert_eq!(session.store().gamification().streak, 1);
    }

    #[test]
    fn complete_chapter_updates_count_and_stats() {
        let mut session = session_with(Store::in_memory());
        session.start().unwrap();
        session.complete_chapter(50).unwrap();
        session.complete_chapter(50).unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.chapters_completed_this_week.count, 2);
        assert_eq!(snapshot.gamification.xp, 100);
        assert_eq!(snapshot.gamification.level, 2);
        assert_eq!(snapshot.gamification.streak, 1);
    }

    #[test]
    fn log_study_hours_accumulates_and_validates() {
        let mut session = session_with(Store::in_memory());
        session.start().unwrap();
        session.log_study_hours(1.5, 20).unwrap();
        session.log_study_hours(2.0, 20).unwrap();
        assert_eq!(session.snapshot().hours_studied_today.hours, 3.5);
        assert!(session.log_study_hours(-1.0, 0).is_err());
        assert!(session.log_study_hours(f64::NAN, 0).is_err());
    }

    #[test]
    fn complete_setup_is_atomic() {
        let mut session = session_with(Store::in_memory());
        assert!(session.ensure_setup_complete().is_err());
        let settings = Settings {
            name: "Ravi".into(),
            level: ExamLevel::Final,
            ..Settings::default()
        };
        session.complete_setup(settings.clone()).unwrap();
        assert!(session.is_setup_complete());
        assert_eq!(session.store().settings(), settings);
    }

    #[test]
    fn level_change_closes_pending_rescue() {
        let mut session = session_with(broken_streak_store());
        session.start().unwrap();
        let token = session.propose_level_change(Settings {
            level: ExamLevel::Final,
            ..Settings::default()
        });
        session.commit_level_change(token).unwrap();
        assert_eq!(session.rescue().state(), RescueState::Resolved);
        assert_eq!(session.store().gamification(), GamificationStats::default());
    }

    #[test]
    fn reset_all_restarts_on_defaults() {
        let mut session = session_with(broken_streak_store());
        session.start().unwrap();
        session.complete_setup(Settings::default()).unwrap();
        session
            .add_record(Collection::Reminders, serde_json::json!({"at": "09:00"}))
            .unwrap();

        let report = session.reset_all().unwrap().clone();
        assert!(!report.rescue_offered);
        assert_eq!(session.rescue().state(), RescueState::Idle);
        assert!(!session.is_setup_complete());
        assert!(session.store().records(Collection::Reminders).is_empty());
        assert_eq!(session.store().gamification(), GamificationStats::default());
    }

    #[test]
    fn status_reports_goals() {
        let mut session = session_with(Store::in_memory());
        session.start().unwrap();
        session.log_study_hours(4.0, 0).unwrap();
        let status = session.status();
        assert!(status.daily_goal_met);
        assert!(!status.weekly_goal_met);
        assert_eq!(status.rescue, RescueState::Idle);
    }
}
