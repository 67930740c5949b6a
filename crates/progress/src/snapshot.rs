//! Derived progress views
//!
//! Snapshots are recomputed from completion rows against the current
//! outline; they are never a source of truth of their own.

use acadia_core::{Percent, Points};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-module completion counts, for mentor dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub module_id: String,
    pub completed_lessons: usize,
    pub total_lessons: usize,
}

impl ModuleProgress {
    pub fn is_complete(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons == self.total_lessons
    }
}

/// Course-level progress for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub user_id: String,
    pub course_id: String,
    pub completed_lesson_count: usize,
    pub total_lesson_count: usize,
    pub percent_complete: Percent,
    pub points_earned: Points,
    /// Set exactly once, when the last lesson completes
    pub course_completed_at: Option<DateTime<Utc>>,
    pub modules: Vec<ModuleProgress>,
}

impl ProgressSnapshot {
    /// Snapshot of a user with no recorded progress
    pub fn empty(
        user_id: impl Into<String>,
        course_id: impl Into<String>,
        total_lesson_count: usize,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            course_id: course_id.into(),
            completed_lesson_count: 0,
            total_lesson_count,
            percent_complete: Percent::ZERO,
            points_earned: Points::ZERO,
            course_completed_at: None,
            modules: Vec::new(),
        }
    }

    pub fn is_course_complete(&self) -> bool {
        self.course_completed_at.is_some()
    }
}
