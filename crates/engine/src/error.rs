//! Engine errors

use acadia_access::AccessDecision;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// `record_progress` was called against a locked lesson. Surfaced to
    /// the end user as a "content locked" state, not a system error.
    #[error("access denied: {decision}")]
    AccessDenied { decision: AccessDecision },

    #[error("unknown lesson: {0}")]
    UnknownLesson(String),

    #[error("unknown course: {0}")]
    UnknownCourse(String),

    #[error(transparent)]
    Outline(#[from] acadia_outline::OutlineError),

    #[error(transparent)]
    Entitlement(#[from] acadia_entitlement::EntitlementError),

    #[error(transparent)]
    Progress(#[from] acadia_progress::ProgressError),

    #[error(transparent)]
    Achievements(#[from] acadia_achievements::AchievementError),
}

impl EngineError {
    /// The decision behind an `AccessDenied`, if that is what this is
    pub fn denied_decision(&self) -> Option<&AccessDecision> {
        match self {
            EngineError::AccessDenied { decision } => Some(decision),
            _ => None,
        }
    }
}
