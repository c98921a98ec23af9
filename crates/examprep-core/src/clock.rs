//! Wall-clock source and calendar helpers.
//!
//! All day and week boundaries are computed in local wall-clock time, so the
//! clock hands out a `NaiveDateTime` already converted to the local zone.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Weekday};

/// Source of "now" for every time-windowed computation.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the host clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a given instant. Used by tests and replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Midday on the given date, which keeps tests clear of midnight edges.
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Start (00:00) of the week containing `now`, anchored on `first_day`.
pub fn week_start(now: NaiveDateTime, first_day: Weekday) -> NaiveDateTime {
    let date = now.date();
    let offset =
        (7 + date.weekday().num_days_from_monday() - first_day.num_days_from_monday()) % 7;
    let start = date - Duration::days(i64::from(offset));
    start.and_time(chrono::NaiveTime::MIN)
}

/// The calendar day before `today`.
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}
