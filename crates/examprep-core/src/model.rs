//! Persisted domain records.
//!
//! Field names serialize in camelCase so stored values keep the key layout
//! the data was first written with (`weeklyChapterGoal`, `lastStudiedDate`).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Syllabus tier the candidate is preparing for.
///
/// Not to be confused with the gamification level in [`GamificationStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExamLevel {
    Foundation,
    #[default]
    Intermediate,
    Final,
}

impl fmt::Display for ExamLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExamLevel::Foundation => "foundation",
            ExamLevel::Intermediate => "intermediate",
            ExamLevel::Final => "final",
        };
        f.write_str(s)
    }
}

impl FromStr for ExamLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "foundation" => Ok(ExamLevel::Foundation),
            "intermediate" => Ok(ExamLevel::Intermediate),
            "final" => Ok(ExamLevel::Final),
            other => Err(ValidationError::InvalidValue {
                field: "level".into(),
                message: format!("unknown exam level '{other}'"),
            }),
        }
    }
}

/// Which paper group the candidate is concentrating on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FocusedGroup {
    Group1,
    Group2,
    #[default]
    Both,
}

impl FromStr for FocusedGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "group1" => Ok(FocusedGroup::Group1),
            "group2" => Ok(FocusedGroup::Group2),
            "both" => Ok(FocusedGroup::Both),
            other => Err(ValidationError::InvalidValue {
                field: "focusedGroup".into(),
                message: format!("unknown group '{other}'"),
            }),
        }
    }
}

/// User settings singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub name: String,
    pub level: ExamLevel,
    pub weekly_chapter_goal: u32,
    pub daily_hours_goal: f64,
    pub revisions: u32,
    pub focused_group: FocusedGroup,
    pub exam_attempt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "Student".into(),
            level: ExamLevel::Intermediate,
            weekly_chapter_goal: 10,
            daily_hours_goal: 4.0,
            revisions: 3,
            focused_group: FocusedGroup::Both,
            exam_attempt: "jan26".into(),
        }
    }
}

impl Settings {
    /// Returns a copy with one field replaced, parsing `value` for the field's type.
    ///
    /// Field names accept both the stored camelCase form and snake_case.
    pub fn with_field(&self, field: &str, value: &str) -> Result<Self, ValidationError> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: field.to_string(),
            message,
        };
        let mut next = self.clone();
        match field {
            "name" => next.name = value.to_string(),
            "level" => next.level = value.parse()?,
            "weeklyChapterGoal" | "weekly_chapter_goal" => {
                next.weekly_chapter_goal = value
                    .parse()
                    .map_err(|e| invalid(format!("{e}")))?;
            }
            "dailyHoursGoal" | "daily_hours_goal" => {
                let hours: f64 = value.parse().map_err(|e| invalid(format!("{e}")))?;
                if !hours.is_finite() || hours < 0.0 {
                    return Err(invalid("must be a non-negative number".into()));
                }
                next.daily_hours_goal = hours;
            }
            "revisions" => {
                next.revisions = value.parse().map_err(|e| invalid(format!("{e}")))?;
            }
            "focusedGroup" | "focused_group" => next.focused_group = value.parse()?,
            "examAttempt" | "exam_attempt" => next.exam_attempt = value.to_string(),
            _ => return Err(invalid("unknown settings field".into())),
        }
        Ok(next)
    }
}

/// Experience, level and streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamificationStats {
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    /// Most recent day credited toward the streak. `None` until the first study day.
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub last_studied_date: Option<NaiveDate>,
}

/// Older records store "no date yet" as `""`.
fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(date) => date.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl Default for GamificationStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
            last_studied_date: None,
        }
    }
}

/// Chapters finished in the week that began at `start_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaptersCompleted {
    pub count: u32,
    pub start_date: NaiveDateTime,
}

impl ChaptersCompleted {
    pub fn starting(week_start: NaiveDateTime) -> Self {
        Self {
            count: 0,
            start_date: week_start,
        }
    }
}

/// Hours logged on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoursStudied {
    pub hours: f64,
    pub date: NaiveDate,
}

impl HoursStudied {
    pub fn on(date: NaiveDate) -> Self {
        Self { hours: 0.0, date }
    }
}

/// Opaque collaborator-owned record (mock test, reminder, doubt, ...).
pub type Record = serde_json::Value;

/// Per-subject/chapter tracking progress, keyed by the collaborator's identifiers.
pub type TrackingProgress = serde_json::Map<String, serde_json::Value>;

/// Append-only record lists owned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    MockTests,
    CompletionHistory,
    Reminders,
    QuizHistory,
    Doubts,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::MockTests,
        Collection::CompletionHistory,
        Collection::Reminders,
        Collection::QuizHistory,
        Collection::Doubts,
    ];
}

impl FromStr for Collection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mock-tests" | "mockTests" => Ok(Collection::MockTests),
            "completion-history" | "completionHistory" => Ok(Collection::CompletionHistory),
            "reminders" => Ok(Collection::Reminders),
            "quiz-history" | "quizHistory" => Ok(Collection::QuizHistory),
            "doubts" => Ok(Collection::Doubts),
            other => Err(ValidationError::UnknownCollection(other.to_string())),
        }
    }
}

/// Everything the store holds, hydrated in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub is_setup_complete: bool,
    pub settings: Settings,
    pub gamification: GamificationStats,
    pub chapters_completed_this_week: ChaptersCompleted,
    pub hours_studied_today: HoursStudied,
    pub progress: TrackingProgress,
    pub mock_tests: Vec<Record>,
    pub completion_history: Vec<Record>,
    pub reminders: Vec<Record>,
    pub quiz_history: Vec<Record>,
    pub doubts: Vec<Record>,
}
