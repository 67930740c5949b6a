//! Lesson completion rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per `(user, lesson)` bookkeeping row.
///
/// # Invariants
/// - `watched_seconds` is a high-water mark and never decreases
/// - `first_completed_at` is set at most once
/// - `points_awarded` only ever transitions false -> true
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonCompletion {
    pub user_id: String,
    pub lesson_id: String,
    pub course_id: String,

    /// Highest watch position reported so far, in seconds
    pub watched_seconds: u32,

    /// When the lesson first crossed its completion threshold
    pub first_completed_at: Option<DateTime<Utc>>,

    /// Guards double-award of `points_on_completion`
    pub points_awarded: bool,
}

impl LessonCompletion {
    pub fn new(
        user_id: impl Into<String>,
        lesson_id: impl Into<String>,
        course_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            lesson_id: lesson_id.into(),
            course_id: course_id.into(),
            watched_seconds: 0,
            first_completed_at: None,
            points_awarded: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.first_completed_at.is_some()
    }

    /// Raise the high-water mark. Returns false (and changes nothing) when
    /// the report does not exceed the stored mark.
    pub fn advance_watch(&mut self, watched_seconds: u32) -> bool {
        if watched_seconds <= self.watched_seconds {
            return false;
        }
        self.watched_seconds = watched_seconds;
        true
    }
}
