//! Integration tests driving sessions over an on-disk store, one `Session` per load.

use chrono::{Duration, NaiveDate};
use examprep_core::{
    ApplyOutcome, Collection, Config, Credit, ExamLevel, FixedClock, GamificationStats, Key,
    QuizOutcome, RescueResult, RescueState, Session, Settings, Store, StreakChange,
};
use serde_json::json;
use tempfile::TempDir;

fn day(offset: i64) -> NaiveDate {
    // 2026-10-14 is a Wednesday.
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap() + Duration::days(offset)
}

/// Load a session from the store file on `day(offset)`.
fn load(dir: &TempDir, offset: i64) -> Session {
    let store = Store::open_at(&dir.path().join("examprep.db")).unwrap();
    let mut session = Session::new(store, Box::new(FixedClock::on(day(offset))), &Config::default());
    session.start().unwrap();
    session
}

#[test]
fn streak_survives_restarts_and_breaks_after_a_gap() {
    let dir = tempfile::tempdir().unwrap();

    for offset in 0..5 {
        let mut session = load(&dir, offset);
        session.complete_chapter(40).unwrap();
    }
    let session = load(&dir, 4);
    assert_eq!(session.store().gamification().streak, 5);
    assert_eq!(session.rescue().state(), RescueState::Idle);

    // Two days later the streak is broken and a rescue is offered, but not yet cleared.
    let session = load(&dir, 6);
    assert_eq!(session.rescue().state(), RescueState::Offered);
    assert_eq!(session.store().gamification().streak, 5);
}

#[test]
fn studying_daily_without_the_quiz_builds_a_new_streak() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = Store::open_at(&dir.path().join("examprep.db")).unwrap();
        store
            .write(
                Key::GamificationStats,
                &GamificationStats {
                    xp: 500,
                    level: 6,
                    streak: 5,
                    last_studied_date: Some(day(-3)),
                },
            )
            .unwrap();
    }

    let mut session = load(&dir, 0);
    assert_eq!(session.rescue().state(), RescueState::Offered);
    let out = session.complete_chapter(25).unwrap();
    assert_eq!(out.change, StreakChange::Restarted { lost: 5 });
    assert_eq!(session.store().gamification().xp, 525);

    for offset in 1..4 {
        let mut session = load(&dir, offset);
        assert_eq!(session.rescue().state(), RescueState::Idle);
        let out = session.complete_chapter(25).unwrap();
        assert_eq!(out.change, StreakChange::Extended);
    }

    let stats = load(&dir, 3).store().gamification();
    assert_eq!(stats.streak, 4);
    assert_eq!(stats.last_studied_date, Some(day(3)));
}

#[test]
fn rescue_is_reoffered_after_reload_and_pass_revives_at_one() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = Store::open_at(&dir.path().join("examprep.db")).unwrap();
        store
            .write(
                Key::GamificationStats,
                &GamificationStats {
                    xp: 0,
                    level: 1,
                    streak: 9,
                    last_studied_date: Some(day(-3)),
                },
            )
            .unwrap();
    }

    // Reload while offered: offered again.
    drop(load(&dir, 0));
    let mut session = load(&dir, 0);
    assert_eq!(session.rescue().state(), RescueState::Offered);

    let result = session
        .submit_rescue(QuizOutcome { score: 6, total: 10 })
        .unwrap();
    assert!(matches!(result, RescueResult::Rescued { .. }));

    let session = load(&dir, 0);
    let stats = session.store().gamification();
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.last_studied_date, Some(day(0)));
    assert_eq!(session.rescue().state(), RescueState::Idle);

    // Studying the next day continues from 1.
    let mut session = load(&dir, 1);
    session.credit(Credit::study(10)).unwrap();
    assert_eq!(session.store().gamification().streak, 2);
}

#[test]
fn failed_rescue_leaves_stats_and_retry_waits_for_next_load() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = Store::open_at(&dir.path().join("examprep.db")).unwrap();
        store
            .write(
                Key::GamificationStats,
                &GamificationStats {
                    xp: 80,
                    level: 1,
                    streak: 4,
                    last_studied_date: Some(day(-5)),
                },
            )
            .unwrap();
    }

    let mut session = load(&dir, 0);
    let before = session.store().gamification();
    let result = session
        .submit_rescue(QuizOutcome { score: 5, total: 10 })
        .unwrap();
    assert!(matches!(result, RescueResult::Failed { required: 6 }));
    assert_eq!(session.store().gamification(), before);
    assert!(session
        .submit_rescue(QuizOutcome { score: 10, total: 10 })
        .is_err());

    let session = load(&dir, 1);
    assert_eq!(session.rescue().state(), RescueState::Offered);
}

#[test]
fn week_and_day_roll_over_on_load() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut session = load(&dir, 0);
        session.complete_chapter(10).unwrap();
        session.complete_chapter(10).unwrap();
        session.log_study_hours(2.5, 10).unwrap();
    }

    let session = load(&dir, 1);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.chapters_completed_this_week.count, 2);
    assert_eq!(snapshot.hours_studied_today.hours, 0.0);
    assert_eq!(snapshot.hours_studied_today.date, day(1));

    // 2026-10-19 is the next Monday.
    let session = load(&dir, 5);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.chapters_completed_this_week.count, 0);
    assert_eq!(
        snapshot.chapters_completed_this_week.start_date,
        day(5).and_hms_opt(0, 0, 0).unwrap()
    );
}

#[test]
fn declined_level_change_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = load(&dir, 0);
    session.complete_setup(Settings::default()).unwrap();
    session.complete_chapter(70).unwrap();
    session
        .add_record(Collection::QuizHistory, json!({"score": 8, "total": 10}))
        .unwrap();
    session.set_progress("accounts", json!({"ch3": true})).unwrap();
    let before = session.snapshot();

    let mut next = Settings::default();
    next.level = ExamLevel::Final;
    next.name = "Meera".into();
    let token = match session.apply_settings(next).unwrap() {
        ApplyOutcome::ConfirmationRequired { token, .. } => token,
        ApplyOutcome::Saved => panic!("level change saved without confirmation"),
    };
    session.cancel_level_change(token).unwrap();
    drop(session);

    let session = load(&dir, 0);
    assert_eq!(session.snapshot(), before);
}

#[test]
fn confirmed_level_change_persists_reset() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut session = load(&dir, 0);
        session.complete_setup(Settings::default()).unwrap();
        session.complete_chapter(70).unwrap();
        session
            .add_record(Collection::Doubts, json!({"text": "consolidation"}))
            .unwrap();
        let token = session.propose_level_change(Settings {
            level: ExamLevel::Foundation,
            ..Settings::default()
        });
        session.commit_level_change(token).unwrap();
    }

    let session = load(&dir, 0);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.settings.level, ExamLevel::Foundation);
    assert_eq!(snapshot.gamification, GamificationStats::default());
    assert!(snapshot.doubts.is_empty());
    assert!(snapshot.progress.is_empty());
    assert!(snapshot.is_setup_complete);
    // Windowed counters are not level-scoped.
    assert_eq!(snapshot.chapters_completed_this_week.count, 1);
}

#[test]
fn full_reset_returns_every_key_to_default() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut session = load(&dir, 0);
        session.complete_setup(Settings::default()).unwrap();
        session.complete_chapter(30).unwrap();
        session.log_study_hours(1.0, 5).unwrap();
        for collection in Collection::ALL {
            session.add_record(collection, json!({"n": 1})).unwrap();
        }
        session.reset_all().unwrap();
    }

    let session = load(&dir, 0);
    let snapshot = session.snapshot();
    assert!(!snapshot.is_setup_complete);
    assert_eq!(snapshot.settings, Settings::default());
    assert_eq!(snapshot.gamification, GamificationStats::default());
    assert_eq!(snapshot.chapters_completed_this_week.count, 0);
    assert_eq!(snapshot.hours_studied_today.hours, 0.0);
    assert!(snapshot.progress.is_empty());
    for collection in Collection::ALL {
        assert!(session.store().records(collection).is_empty());
    }
}
