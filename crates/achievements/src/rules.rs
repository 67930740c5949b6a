//! Deterministic award rules
//!
//! `on_progress` is a pure function of ledger state: it returns every code
//! the state currently warrants. Idempotence lives in the log - codes the
//! user already holds are filtered out at award time.

use crate::achievement::AchievementCode;
use acadia_outline::CourseOutline;
use acadia_progress::ProgressSnapshot;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Tunable rule thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Percent milestones that earn a badge
    #[serde(default = "default_milestone_percents")]
    pub milestone_percents: Vec<u8>,

    /// Consecutive completion days that earn the streak badge
    #[serde(default = "default_streak_days")]
    pub streak_days: u32,
}

fn default_milestone_percents() -> Vec<u8> {
    vec![25, 50, 75, 100]
}

fn default_streak_days() -> u32 {
    3
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            milestone_percents: default_milestone_percents(),
            streak_days: default_streak_days(),
        }
    }
}

/// Ledger state the rules read
pub struct AchievementContext<'a> {
    pub course: &'a CourseOutline,
    pub snapshot: &'a ProgressSnapshot,
    /// Lesson ids completed in this course
    pub completed_lessons: &'a HashSet<String>,
    /// Distinct UTC days with at least one completion, across all courses
    pub completion_days: &'a BTreeSet<NaiveDate>,
}

/// Evaluates rules against a progress context
#[derive(Debug, Clone, Default)]
pub struct AchievementEvaluator {
    config: RuleConfig,
}

impl AchievementEvaluator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Every code the current state warrants, in rule order.
    pub fn on_progress(&self, ctx: &AchievementContext<'_>) -> Vec<AchievementCode> {
        let mut earned = Vec::new();
        let course_id = &ctx.course.id;

        // Module badges: all lessons of a module complete
        for module in &ctx.course.modules {
            if module.lessons.is_empty() {
                continue;
            }
            let all_done = module
                .lessons
                .iter()
                .all(|lesson| ctx.completed_lessons.contains(&lesson.id));
            if all_done {
                earned.push(AchievementCode::ModuleComplete {
                    course_id: course_id.clone(),
                    module_number: module.order + 1,
                });
            }
        }

        // Milestone badges at configured percents
        let percent = ctx.snapshot.percent_complete.value();
        for &milestone in &self.config.milestone_percents {
            if percent >= milestone {
                earned.push(AchievementCode::Milestone {
                    course_id: course_id.clone(),
                    percent: milestone,
                });
            }
        }

        // Course badge once the completion instant is stamped
        if ctx.snapshot.course_completed_at.is_some() {
            earned.push(AchievementCode::CourseComplete {
                course_id: course_id.clone(),
            });
        }

        // Streak badge: any run of N consecutive completion days
        if has_consecutive_run(ctx.completion_days, self.config.streak_days) {
            earned.push(AchievementCode::Streak {
                days: self.config.streak_days,
            });
        }

        earned
    }
}

/// True when the set contains `target` consecutive days anywhere
fn has_consecutive_run(days: &BTreeSet<NaiveDate>, target: u32) -> bool {
    if target == 0 {
        return false;
    }
    let mut run = 1u32;
    let mut prev: Option<NaiveDate> = None;

    for &day in days {
        if let Some(prev) = prev {
            if day - prev == Duration::days(1) {
                run += 1;
            } else {
                run = 1;
            }
        }
        if run >= target {
            return true;
        }
        prev = Some(day);
    }
    false
}
