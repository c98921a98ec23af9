//! Temporal rollover of the windowed counters.
//!
//! Run once at session start. The weekly counter is reset only when its
//! start is strictly older than the current week start; a future-dated week
//! is left alone. The daily counter is reset whenever its day is not today.

use chrono::{NaiveDateTime, Weekday};
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::week_start;
use crate::error::Result;
use crate::model::{ChaptersCompleted, HoursStudied};
use crate::storage::{Key, Store, WriteBatch};

/// What a rollover pass changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RolloverReport {
    /// Previous weekly record, when it was reset.
    pub week_reset: Option<ChaptersCompleted>,
    /// Previous daily record, when it was reset.
    pub day_reset: Option<HoursStudied>,
}

impl RolloverReport {
    pub fn is_noop(&self) -> bool {
        self.week_reset.is_none() && self.day_reset.is_none()
    }
}

/// Reconciles windowed counters against the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct RolloverEngine {
    first_day: Weekday,
}

impl RolloverEngine {
    pub fn new(first_day: Weekday) -> Self {
        Self { first_day }
    }

    pub fn first_day(&self) -> Weekday {
        self.first_day
    }

    /// Reset stale counters in `store` as of `now`, atomically.
    pub fn reconcile(&self, store: &mut Store, now: NaiveDateTime) -> Result<RolloverReport> {
        let current_week = week_start(now, self.first_day);
        let today = now.date();

        let mut report = RolloverReport::default();
        let mut batch = WriteBatch::new();

        let chapters = store.chapters_this_week(current_week);
        if chapters.start_date < current_week {
            batch.put(
                Key::ChaptersCompletedThisWeek,
                &ChaptersCompleted::starting(current_week),
            )?;
            report.week_reset = Some(chapters);
        } else if chapters.start_date > current_week {
            debug!(start = %chapters.start_date, "weekly counter is future-dated, keeping it");
        }

        let hours = store.hours_today(today);
        if hours.date != today {
            batch.put(Key::HoursStudiedToday, &HoursStudied::on(today))?;
            report.day_reset = Some(hours);
        }

        store.commit(batch)?;

        if let Some(prev) = &report.week_reset {
            info!(previous_count = prev.count, week_start = %current_week, "weekly chapters rolled over");
        }
        if let Some(prev) = &report.day_reset {
            info!(previous_hours = prev.hours, %today, "daily hours rolled over");
        }
        Ok(report)
    }
}

impl Default for RolloverEngine {
    fn default() -> Self {
        Self::new(Weekday::Mon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        // Wednesday 2026-10-14, 09:30
        NaiveDate::from_ymd_opt(2026, 10, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn monday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn fresh_store_needs_no_rollover() {
        let mut store = Store::in_memory();
        let report = RolloverEngine::default().reconcile(&mut store, now()).unwrap();
        assert!(report.is_noop());
    }

    #[test]
    fn stale_week_resets_count_and_anchor() {
        let mut store = Store::in_memory();
        store
            .write(
                Key::ChaptersCompletedThisWeek,
                &ChaptersCompleted {
                    count: 7,
                    start_date: monday() - Duration::days(7),
                },
            )
            .unwrap();

        let report = RolloverEngine::default().reconcile(&mut store, now()).unwrap();
        assert_eq!(report.week_reset.map(|c| c.count), Some(7));
        assert_eq!(
            store.chapters_this_week(monday()),
            ChaptersCompleted::starting(monday())
        );
    }

    #[test]
    fn current_week_is_left_alone() {
        let mut store = Store::in_memory();
        let record = ChaptersCompleted {
            count: 3,
            start_date: monday(),
        };
        store.write(Key::ChaptersCompletedThisWeek, &record).unwrap();

        let report = RolloverEngine::default().reconcile(&mut store, now()).unwrap();
        assert!(report.week_reset.is_none());
        assert_eq!(store.chapters_this_week(monday()), record);
    }

    #[test]
    fn future_week_is_not_rewound() {
        let mut store = Store::in_memory();
        let record = ChaptersCompleted {
            count: 2,
            start_date: monday() + Duration::days(14),
        };
        store.write(Key::ChaptersCompletedThisWeek, &record).unwrap();

        RolloverEngine::default().reconcile(&mut store, now()).unwrap();
        assert_eq!(store.chapters_this_week(monday()), record);
    }

    #[test]
    fn stale_day_resets_hours() {
        let mut store = Store::in_memory();
        let today = now().date();
        store
            .write(
                Key::HoursStudiedToday,
                &HoursStudied {
                    hours: 3.5,
                    date: today - Duration::days(1),
                },
            )
            .unwrap();

        let report = RolloverEngine::default().reconcile(&mut store, now()).unwrap();
        assert_eq!(report.day_reset.map(|h| h.hours), Some(3.5));
        assert_eq!(store.hours_today(today), HoursStudied::on(today));
    }

    #[test]
    fn future_day_resets_hours() {
        let mut store = Store::in_memory();
        let today = now().date();
        store
            .write(
                Key::HoursStudiedToday,
                &HoursStudied {
                    hours: 3.0,
                    date: today + Duration::days(1),
                },
            )
            .unwrap();

        let report = RolloverEngine::default().reconcile(&mut store, now()).unwrap();
        assert_eq!(report.day_reset.map(|h| h.hours), Some(3.0));
        assert_eq!(store.hours_today(today), HoursStudied::on(today));
    }

    #[test]
    fn same_day_keeps_hours() {
        let mut store = Store::in_memory();
        let today = now().date();
        let record = HoursStudied { hours: 1.0, date: today };
        store.write(Key::HoursStudiedToday, &record).unwrap();

        let report = RolloverEngine::default().reconcile(&mut store, now()).unwrap();
        assert!(report.day_reset.is_none());
        assert_eq!(store.hours_today(today), record);
    }

    #[test]
    fn sunday_anchor_moves_the_boundary() {
        let mut store = Store::in_memory();
        // Started counting on Monday; with a Sunday anchor the current week began the day before.
        store
            .write(
                Key::ChaptersCompletedThisWeek,
                &ChaptersCompleted {
                    count: 4,
                    start_date: monday(),
                },
            )
            .unwrap();
        let report = RolloverEngine::new(Weekday::Sun)
            .reconcile(&mut store, now())
            .unwrap();
        assert!(report.week_reset.is_none());
    }
}
