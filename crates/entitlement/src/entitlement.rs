//! Entitlement aggregate and lifecycle enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle status of an entitlement
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntitlementStatus {
    /// Enrollment is live; content unlocks per course policy
    Active,

    /// Every lesson completed; content stays accessible
    Completed,

    /// Temporarily suspended (billing hold, mentor action); no access
    Paused,

    /// Soft-deleted for audit; superseded or refunded
    Revoked,
}

impl EntitlementStatus {
    /// Whether this status entitles the holder to non-preview content.
    ///
    /// Completed courses remain readable; paused and revoked do not.
    pub fn grants_access(&self) -> bool {
        matches!(self, EntitlementStatus::Active | EntitlementStatus::Completed)
    }
}

/// How the entitlement was obtained
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntitlementSource {
    /// Purchased through the payment system
    Paid,
    /// Free enrollment (open course, coupon)
    Free,
    /// Granted manually by an admin or mentor
    AdminGranted,
}

/// A record granting a user access to one course.
///
/// # Invariant
/// At most one non-revoked entitlement exists per `(user_id, course_id)`;
/// `EntitlementStore::grant` revokes any live prior record before creating
/// a new one. `granted_at` is the clock base for enrollment-relative drip
/// policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Unique id, `ENT-` prefixed
    pub id: String,

    pub user_id: String,
    pub course_id: String,
    pub source: EntitlementSource,

    /// Enrollment instant; drip policies count days from here
    pub granted_at: DateTime<Utc>,

    pub status: EntitlementStatus,

    /// Set exactly once, when the course reaches full completion
    pub completed_at: Option<DateTime<Utc>>,

    /// Set when the entitlement is revoked (refund or supersession)
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    /// Create a new active entitlement
    pub fn new(
        user_id: impl Into<String>,
        course_id: impl Into<String>,
        source: EntitlementSource,
        granted_at: DateTime<Utc>,
    ) -> Self {
        let id = format!(
            "ENT-{}",
            uuid::Uuid::new_v4().to_string()[..8].to_uppercase()
        );
        Self {
            id,
            user_id: user_id.into(),
            course_id: course_id.into(),
            source,
            granted_at,
            status: EntitlementStatus::Active,
            completed_at: None,
            revoked_at: None,
        }
    }

    /// Whether this entitlement currently grants content access
    pub fn grants_access(&self) -> bool {
        self.status.grants_access()
    }
}
