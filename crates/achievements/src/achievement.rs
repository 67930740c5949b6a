//! Achievement records and badge codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A badge the evaluator can award.
///
/// Codes render to stable strings; the string form is the uniqueness key
/// per user, so course-scoped badges embed the course id.
///
/// # Examples
/// - `MODULE_1_COMPLETE:rust-101`
/// - `PROGRESS_50:rust-101`
/// - `COURSE_COMPLETE:rust-101`
/// - `STREAK_3_DAYS`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementCode {
    /// Every lesson in the module is complete; `module_number` is 1-based
    ModuleComplete {
        course_id: String,
        module_number: u32,
    },

    /// The course reached a progress milestone
    Milestone { course_id: String, percent: u8 },

    /// Every lesson in the course is complete
    CourseComplete { course_id: String },

    /// Completed at least one lesson on N consecutive days
    Streak { days: u32 },
}

impl AchievementCode {
    /// Stable string form, the uniqueness key per user
    pub fn as_code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AchievementCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AchievementCode::ModuleComplete {
                course_id,
                module_number,
            } => write!(f, "MODULE_{}_COMPLETE:{}", module_number, course_id),
            AchievementCode::Milestone { course_id, percent } => {
                write!(f, "PROGRESS_{}:{}", percent, course_id)
            }
            AchievementCode::CourseComplete { course_id } => {
                write!(f, "COURSE_COMPLETE:{}", course_id)
            }
            AchievementCode::Streak { days } => write!(f, "STREAK_{}_DAYS", days),
        }
    }
}

/// An awarded badge. Append-only; `(user_id, code)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub user_id: String,
    pub code: AchievementCode,
    pub earned_at: DateTime<Utc>,
}

impl Achievement {
    pub fn new(user_id: impl Into<String>, code: AchievementCode, earned_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            code,
            earned_at,
        }
    }
}
