//! Drip-release unlock policy

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Time-based unlock policy for a drip-gated module.
///
/// At most one of `after_days` / `at_date` may be set; course authoring
/// rejects outlines that set both (`OutlineError::PolicyConflict`). Should a
/// conflicted policy still reach evaluation, the later of the two resolved
/// instants wins and the inconsistency is logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnlockPolicy {
    /// Days after enrollment (`granted_at`) at which the module opens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_days: Option<i64>,

    /// Absolute instant at which the module opens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_date: Option<DateTime<Utc>>,
}

impl UnlockPolicy {
    /// Policy that opens the module N days after enrollment
    pub fn after_days(days: i64) -> Self {
        Self {
            after_days: Some(days),
            at_date: None,
        }
    }

    /// Policy that opens the module at an absolute date
    pub fn at_date(date: DateTime<Utc>) -> Self {
        Self {
            after_days: None,
            at_date: Some(date),
        }
    }

    /// True when both fields are set (a configuration error)
    pub fn is_conflicted(&self) -> bool {
        self.after_days.is_some() && self.at_date.is_some()
    }

    /// True when neither field is set (the module is not time-gated)
    pub fn is_empty(&self) -> bool {
        self.after_days.is_none() && self.at_date.is_none()
    }

    /// Resolve the effective unlock instant against an enrollment clock base.
    ///
    /// Returns `None` when the policy carries no time gate. A conflicted
    /// policy resolves to the later of the two instants.
    pub fn resolve_instant(&self, granted_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.at_date, self.after_days) {
            (Some(at), Some(days)) => {
                let relative = granted_at + Duration::days(days);
                tracing::warn!(
                    at_date = %at,
                    after_days = days,
                    "unlock policy sets both at_date and after_days; keeping the later instant"
                );
                Some(at.max(relative))
            }
            (Some(at), None) => Some(at),
            (None, Some(days)) => Some(granted_at + Duration::days(days)),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_after_days_resolves_relative_to_grant() {
        let policy = UnlockPolicy::after_days(7);
        assert_eq!(policy.resolve_instant(t0()), Some(t0() + Duration::days(7)));
    }

    #[test]
    fn test_at_date_ignores_grant() {
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let policy = UnlockPolicy::at_date(date);
        assert_eq!(policy.resolve_instant(t0()), Some(date));
    }

    #[test]
    fn test_empty_policy_is_not_time_gated() {
        let policy = UnlockPolicy::default();
        assert!(policy.is_empty());
        assert_eq!(policy.resolve_instant(t0()), None);
    }

    #[test]
    fn test_conflicted_policy_keeps_later_instant() {
        let absolute = t0() + Duration::days(3);
        let policy = UnlockPolicy {
            after_days: Some(10),
            at_date: Some(absolute),
        };
        assert!(policy.is_conflicted());
        // grant + 10d is later than the absolute date
        assert_eq!(
            policy.resolve_instant(t0()),
            Some(t0() + Duration::days(10))
        );

        let policy = UnlockPolicy {
            after_days: Some(1),
            at_date: Some(absolute),
        };
        assert_eq!(policy.resolve_instant(t0()), Some(absolute));
    }

    #[test]
    fn test_serde_omits_unset_fields() {
        let json = serde_json::to_string(&UnlockPolicy::after_days(7)).unwrap();
        assert_eq!(json, r#"{"after_days":7}"#);
    }
}
