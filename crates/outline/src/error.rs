//! Outline errors

use thiserror::Error;

/// Errors raised when validating or registering a course outline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    #[error("Duplicate module id: {0}")]
    DuplicateModule(String),

    #[error("Duplicate lesson id: {0}")]
    DuplicateLesson(String),

    #[error("Module ranks in course '{course_id}' are not dense zero-based: {orders:?}")]
    NonDenseModuleOrder { course_id: String, orders: Vec<u32> },

    #[error("Lesson ranks in module '{module_id}' are not dense zero-based: {orders:?}")]
    NonDenseLessonOrder { module_id: String, orders: Vec<u32> },

    #[error("Lesson '{lesson_id}' claims module '{claimed}' but sits in module '{actual}'")]
    ForeignLesson {
        lesson_id: String,
        claimed: String,
        actual: String,
    },

    #[error("Module '{0}' sets both at_date and after_days")]
    PolicyConflict(String),

    #[error("Module '{module_id}' has a negative unlock delay: {days}")]
    NegativeDelay { module_id: String, days: i64 },
}
