//! Unlock policy evaluator
//!
//! The rules run in one fixed order and the first match wins:
//!
//! 1. preview lesson                      -> `UnlockedPreview`
//! 2. no live entitlement                 -> `LockedNotEntitled`
//! 3. armed drip gate not yet open        -> `LockedTime`
//! 4. lesson manually locked              -> `LockedManual`
//! 5. sequential prerequisite missing     -> `LockedSequential`
//!    otherwise                           -> `Unlocked`
//!
//! Rule 1 is the only one that needs no entitlement. Rule 5 only applies
//! to courses with sequential mode enabled; for all others step 5 is
//! simply `Unlocked`.

use crate::decision::AccessDecision;
use acadia_entitlement::Entitlement;
use acadia_outline::{CourseOutline, Lesson, Module};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Everything the evaluator needs for one decision.
pub struct AccessRequest<'a> {
    pub course: &'a CourseOutline,
    pub module: &'a Module,
    pub lesson: &'a Lesson,
    pub entitlement: Option<&'a Entitlement>,
    /// Lesson ids the user has completed; consulted only in sequential mode
    pub completed: &'a HashSet<String>,
}

/// Evaluate the unlock rules for one lesson at one instant.
pub fn evaluate(req: &AccessRequest<'_>, now: DateTime<Utc>) -> AccessDecision {
    // Rule 1: preview overrides everything, entitled or not
    if req.lesson.is_preview {
        return AccessDecision::UnlockedPreview;
    }

    // Rule 2: a live entitlement is required from here on
    let entitlement = match req.entitlement {
        Some(ent) if ent.grants_access() => ent,
        _ => return AccessDecision::LockedNotEntitled,
    };

    // Rule 3: an armed drip gate locks until its resolved instant
    if req.module.is_locked {
        let instant = req
            .module
            .unlock_policy
            .as_ref()
            .and_then(|policy| policy.resolve_instant(entitlement.granted_at));
        if let Some(unlocks_at) = instant {
            if now < unlocks_at {
                return AccessDecision::locked_time(unlocks_at);
            }
        }
        // No resolvable instant: the module is not time-gated
    }

    // Rule 4: per-lesson manual lock
    if req.lesson.is_locked {
        return AccessDecision::LockedManual;
    }

    // Rule 5: sequential prerequisite, or plain unlocked
    if req.course.sequential {
        let missing = req
            .course
            .lessons_before(req.module.order, req.lesson.order)
            .into_iter()
            .find(|prior| !req.completed.contains(&prior.id));
        if let Some(prior) = missing {
            return AccessDecision::locked_sequential(prior.id.clone());
        }
    }

    AccessDecision::Unlocked
}
