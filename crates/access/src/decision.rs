//! Access decisions
//!
//! Locked variants carry the payload a player or dashboard needs to render
//! the lock: when a drip gate opens, which prerequisite is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single decision returned for a (user, lesson, now) query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Free-preview content, reachable without an entitlement
    UnlockedPreview,

    /// Entitled and no gate applies
    Unlocked,

    /// No live entitlement for the course (absent, paused, or revoked)
    LockedNotEntitled,

    /// The module's drip gate has not opened yet
    LockedTime { unlocks_at: DateTime<Utc> },

    /// The lesson is manually locked by the instructor
    LockedManual,

    /// Sequential mode: an earlier lesson is still incomplete
    LockedSequential { missing_lesson_id: String },
}

impl AccessDecision {
    /// Create a LockedTime decision
    pub fn locked_time(unlocks_at: DateTime<Utc>) -> Self {
        AccessDecision::LockedTime { unlocks_at }
    }

    /// Create a LockedSequential decision
    pub fn locked_sequential(missing_lesson_id: impl Into<String>) -> Self {
        AccessDecision::LockedSequential {
            missing_lesson_id: missing_lesson_id.into(),
        }
    }

    /// True for either unlocked variant - the only decisions under which
    /// progress may be recorded
    pub fn is_unlocked(&self) -> bool {
        matches!(
            self,
            AccessDecision::UnlockedPreview | AccessDecision::Unlocked
        )
    }

    /// True for any locked variant
    pub fn is_locked(&self) -> bool {
        !self.is_unlocked()
    }

    /// Stable code string for logs and API payloads
    pub fn code(&self) -> &'static str {
        match self {
            AccessDecision::UnlockedPreview => "UNLOCKED_PREVIEW",
            AccessDecision::Unlocked => "UNLOCKED",
            AccessDecision::LockedNotEntitled => "LOCKED_NOT_ENTITLED",
            AccessDecision::LockedTime { .. } => "LOCKED_TIME",
            AccessDecision::LockedManual => "LOCKED_MANUAL",
            AccessDecision::LockedSequential { .. } => "LOCKED_SEQUENTIAL",
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDecision::LockedTime { unlocks_at } => {
                write!(f, "{} (until {})", self.code(), unlocks_at)
            }
            AccessDecision::LockedSequential { missing_lesson_id } => {
                write!(f, "{} (missing {})", self.code(), missing_lesson_id)
            }
            _ => f.write_str(self.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlocked_variants() {
        assert!(AccessDecision::Unlocked.is_unlocked());
        assert!(AccessDecision::UnlockedPreview.is_unlocked());
        assert!(AccessDecision::LockedManual.is_locked());
        assert!(AccessDecision::locked_sequential("l1").is_locked());
    }

    #[test]
    fn test_codes() {
        assert_eq!(AccessDecision::Unlocked.code(), "UNLOCKED");
        assert_eq!(
            AccessDecision::locked_time(Utc::now()).code(),
            "LOCKED_TIME"
        );
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&AccessDecision::locked_sequential("l2")).unwrap();
        assert_eq!(
            json,
            r#"{"type":"locked_sequential","missing_lesson_id":"l2"}"#
        );
    }
}
