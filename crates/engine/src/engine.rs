//! The access engine facade
//!
//! Every public operation takes the engine's single lock for its whole
//! duration, so point awards, completion stamps, and the entitlement
//! transition run as one single-writer transaction per call. Concurrent
//! devices reporting the same lesson are serialized here; the ledger's
//! high-water rule makes their interleaving commutative.

use crate::error::{EngineError, EngineResult};
use acadia_access::{evaluate, AccessDecision, AccessRequest};
use acadia_achievements::{
    Achievement, AchievementContext, AchievementEvaluator, AchievementLog, RuleConfig,
};
use acadia_entitlement::{
    Entitlement, EntitlementResolver, EntitlementSource, EntitlementStatus, EntitlementStore,
};
use acadia_outline::{CourseOutline, OutlineStore};
use acadia_progress::{ProgressLedger, ProgressSignal, ProgressSnapshot};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Result of one recorded progress event
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub snapshot: ProgressSnapshot,
    /// Badges earned by this event, for caller-side notification
    pub new_achievements: Vec<Achievement>,
}

struct EngineState {
    outlines: OutlineStore,
    entitlements: EntitlementStore,
    progress: ProgressLedger,
    achievements: AchievementLog,
}

/// The curriculum access & progress engine.
pub struct AccessEngine {
    state: Mutex<EngineState>,
    evaluator: AchievementEvaluator,
}

impl AccessEngine {
    /// Open an engine with journals under `data_dir`, replaying state and
    /// reconciling any interrupted course-completion transition.
    pub fn open(data_dir: impl AsRef<Path>) -> EngineResult<Self> {
        Self::open_with_rules(data_dir, RuleConfig::default())
    }

    /// `open` with custom achievement rule thresholds
    pub fn open_with_rules(
        data_dir: impl AsRef<Path>,
        rules: RuleConfig,
    ) -> EngineResult<Self> {
        let dir = data_dir.as_ref();
        let mut state = EngineState {
            outlines: OutlineStore::new(),
            entitlements: EntitlementStore::open(dir.join("entitlements.jsonl"))?,
            progress: ProgressLedger::open(dir.join("progress.jsonl"))?,
            achievements: AchievementLog::open(dir.join("achievements.jsonl"))?,
        };
        Self::reconcile(&mut state)?;

        Ok(Self {
            state: Mutex::new(state),
            evaluator: AchievementEvaluator::new(rules),
        })
    }

    /// Create an engine with no persistence (for testing)
    pub fn in_memory() -> Self {
        Self::in_memory_with_rules(RuleConfig::default())
    }

    /// `in_memory` with custom achievement rule thresholds
    pub fn in_memory_with_rules(rules: RuleConfig) -> Self {
        Self {
            state: Mutex::new(EngineState {
                outlines: OutlineStore::new(),
                entitlements: EntitlementStore::in_memory(),
                progress: ProgressLedger::in_memory(),
                achievements: AchievementLog::in_memory(),
            }),
            evaluator: AchievementEvaluator::new(rules),
        }
    }

    /// Complete any entitlement left ACTIVE for a course the progress
    /// journal already shows fully complete (a crash between the two
    /// journal appends).
    fn reconcile(state: &mut EngineState) -> EngineResult<()> {
        let stamped: Vec<(String, String, DateTime<Utc>)> = state
            .progress
            .all_course_completions()
            .map(|(user, course, at)| (user.to_string(), course.to_string(), at))
            .collect();

        for (user_id, course_id, completed_at) in stamped {
            let is_active = state
                .entitlements
                .get(&user_id, &course_id)
                .map(|ent| ent.status == EntitlementStatus::Active)
                .unwrap_or(false);
            if is_active {
                tracing::warn!(
                    user_id,
                    course_id,
                    "completed course left with an active entitlement; reconciling"
                );
                state
                    .entitlements
                    .mark_completed(&user_id, &course_id, completed_at)?;
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // A poisoned lock means a panic mid-operation; the journals are the
        // source of truth, so continuing with the in-memory state is safe.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Authoring / enrollment boundary ===

    /// Register (or replace) a course outline. Validates before accepting.
    pub fn register_course(&self, outline: CourseOutline) -> EngineResult<()> {
        let mut state = self.lock();
        state.outlines.insert(outline)?;
        Ok(())
    }

    /// Grant an entitlement, superseding any live prior one
    pub fn grant_entitlement(
        &self,
        user_id: &str,
        course_id: &str,
        source: EntitlementSource,
        now: DateTime<Utc>,
    ) -> EngineResult<Entitlement> {
        let mut state = self.lock();
        Ok(state.entitlements.grant(user_id, course_id, source, now)?)
    }

    /// Pause a live entitlement
    pub fn pause_entitlement(
        &self,
        user_id: &str,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Entitlement> {
        let mut state = self.lock();
        Ok(state.entitlements.pause(user_id, course_id, now)?)
    }

    /// Resume a paused entitlement
    pub fn resume_entitlement(
        &self,
        user_id: &str,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Entitlement> {
        let mut state = self.lock();
        Ok(state.entitlements.resume(user_id, course_id, now)?)
    }

    /// Revoke an entitlement (refund, admin action)
    pub fn revoke_entitlement(
        &self,
        user_id: &str,
        course_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<Entitlement> {
        let mut state = self.lock();
        Ok(state.entitlements.revoke(user_id, course_id, reason, now)?)
    }

    // === Exposed interface ===

    /// Decide whether a lesson is currently accessible to a user.
    ///
    /// Never errors: an unknown lesson or dangling module reference fails
    /// closed to `LockedNotEntitled`.
    pub fn can_access(&self, user_id: &str, lesson_id: &str, now: DateTime<Utc>) -> AccessDecision {
        let state = self.lock();
        Self::decide(&state, user_id, lesson_id, now)
    }

    fn decide(
        state: &EngineState,
        user_id: &str,
        lesson_id: &str,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        let Some(ctx) = state.outlines.lesson_context(lesson_id) else {
            tracing::debug!(user_id, lesson_id, "lesson not found; failing closed");
            return AccessDecision::LockedNotEntitled;
        };

        let entitlement =
            EntitlementResolver::new(&state.entitlements).resolve(user_id, &ctx.course.id);

        let completed = if ctx.course.sequential {
            state.progress.completed_lessons(user_id, ctx.course)
        } else {
            HashSet::new()
        };

        evaluate(
            &AccessRequest {
                course: ctx.course,
                module: ctx.module,
                lesson: ctx.lesson,
                entitlement,
                completed: &completed,
            },
            now,
        )
    }

    /// Record a watch-position report for a lesson.
    ///
    /// Fails with `AccessDenied` (and touches nothing) unless the lesson is
    /// currently unlocked for the user.
    pub fn record_progress(
        &self,
        user_id: &str,
        lesson_id: &str,
        watched_seconds: u32,
        now: DateTime<Utc>,
    ) -> EngineResult<ProgressReport> {
        self.record(user_id, lesson_id, ProgressSignal::Watched(watched_seconds), now)
    }

    /// Record an explicit "mark complete" action for a lesson
    pub fn record_completion(
        &self,
        user_id: &str,
        lesson_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<ProgressReport> {
        self.record(user_id, lesson_id, ProgressSignal::Complete, now)
    }

    fn record(
        &self,
        user_id: &str,
        lesson_id: &str,
        signal: ProgressSignal,
        now: DateTime<Utc>,
    ) -> EngineResult<ProgressReport> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let decision = Self::decide(state, user_id, lesson_id, now);
        if !decision.is_unlocked() {
            return Err(EngineError::AccessDenied { decision });
        }

        let ctx = state
            .outlines
            .lesson_context(lesson_id)
            .ok_or_else(|| EngineError::UnknownLesson(lesson_id.to_string()))?;

        let outcome = state.progress.record(user_id, ctx, signal, now)?;

        // Full completion flips the entitlement in the same locked
        // operation; a preview-only learner has none to flip.
        if outcome.course_just_completed {
            match state.entitlements.mark_completed(user_id, &ctx.course.id, now) {
                Ok(_) => {}
                Err(acadia_entitlement::EntitlementError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let completed = state.progress.completed_lessons(user_id, ctx.course);
        let days = state.progress.completion_days(user_id);
        let codes = self.evaluator.on_progress(&AchievementContext {
            course: ctx.course,
            snapshot: &outcome.snapshot,
            completed_lessons: &completed,
            completion_days: &days,
        });
        let new_achievements = state.achievements.award_all(user_id, codes, now)?;

        Ok(ProgressReport {
            snapshot: outcome.snapshot,
            new_achievements,
        })
    }

    /// Current progress snapshot for a user on a course
    pub fn snapshot(&self, user_id: &str, course_id: &str) -> EngineResult<ProgressSnapshot> {
        let state = self.lock();
        let course = state
            .outlines
            .course(course_id)
            .ok_or_else(|| EngineError::UnknownCourse(course_id.to_string()))?;
        Ok(state.progress.snapshot(user_id, course))
    }

    /// All achievements a user has earned, in earn order
    pub fn achievements(&self, user_id: &str) -> Vec<Achievement> {
        let state = self.lock();
        state.achievements.list(user_id)
    }

    /// The live entitlement for a pair, if any
    pub fn entitlement(&self, user_id: &str, course_id: &str) -> Option<Entitlement> {
        let state = self.lock();
        state.entitlements.get(user_id, course_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acadia_outline::{Lesson, Module};

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn one_lesson_course() -> CourseOutline {
        CourseOutline::new(
            "c1",
            vec![Module::new(
                "m1",
                0,
                vec![Lesson::new("l1", "m1", 0).with_points(10).with_threshold_secs(30)],
            )],
        )
    }

    #[test]
    fn test_unknown_lesson_fails_closed() {
        let engine = AccessEngine::in_memory();
        assert_eq!(
            engine.can_access("alice", "ghost", now()),
            AccessDecision::LockedNotEntitled
        );
    }

    #[test]
    fn test_record_against_locked_lesson_denied() {
        let engine = AccessEngine::in_memory();
        engine.register_course(one_lesson_course()).unwrap();

        let err = engine
            .record_progress("alice", "l1", 30, now())
            .unwrap_err();
        assert!(matches!(
            err.denied_decision(),
            Some(AccessDecision::LockedNotEntitled)
        ));
        // Nothing was recorded
        let snap = engine.snapshot("alice", "c1").unwrap();
        assert_eq!(snap.completed_lesson_count, 0);
    }

    #[test]
    fn test_record_flows_through_to_snapshot() {
        let engine = AccessEngine::in_memory();
        engine.register_course(one_lesson_course()).unwrap();
        engine
            .grant_entitlement("alice", "c1", EntitlementSource::Paid, now())
            .unwrap();

        let report = engine.record_progress("alice", "l1", 45, now()).unwrap();
        assert_eq!(report.snapshot.completed_lesson_count, 1);
        assert!(report.snapshot.is_course_complete());
        assert_eq!(
            engine.entitlement("alice", "c1").unwrap().status,
            EntitlementStatus::Completed
        );
    }

    #[test]
    fn test_snapshot_unknown_course_errors() {
        let engine = AccessEngine::in_memory();
        assert!(matches!(
            engine.snapshot("alice", "nope"),
            Err(EngineError::UnknownCourse(_))
        ));
    }
}
