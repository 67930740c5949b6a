//! Authoring-time outline validation
//!
//! The access engine treats outlines as trusted input; these checks run
//! when a course is registered so that configuration errors surface to
//! course authors instead of being resolved ad hoc at read time.

use crate::course::CourseOutline;
use crate::error::OutlineError;
use std::collections::HashSet;

/// Validate a course outline before it enters the store.
///
/// Checks, in order:
/// - module and lesson ids are unique across the course
/// - module ranks are dense, zero-based, and unique
/// - lesson ranks are dense, zero-based, and unique within each module
/// - every lesson's `module_id` matches its owning module
/// - no module sets both `at_date` and `after_days`
/// - no module has a negative `after_days`
pub fn validate_outline(outline: &CourseOutline) -> Result<(), OutlineError> {
    let mut module_ids = HashSet::new();
    let mut lesson_ids = HashSet::new();

    for module in &outline.modules {
        if !module_ids.insert(module.id.as_str()) {
            return Err(OutlineError::DuplicateModule(module.id.clone()));
        }

        if let Some(policy) = &module.unlock_policy {
            if policy.is_conflicted() {
                return Err(OutlineError::PolicyConflict(module.id.clone()));
            }
            if let Some(days) = policy.after_days {
                if days < 0 {
                    return Err(OutlineError::NegativeDelay {
                        module_id: module.id.clone(),
                        days,
                    });
                }
            }
        }

        for lesson in &module.lessons {
            if !lesson_ids.insert(lesson.id.as_str()) {
                return Err(OutlineError::DuplicateLesson(lesson.id.clone()));
            }
            if lesson.module_id != module.id {
                return Err(OutlineError::ForeignLesson {
                    lesson_id: lesson.id.clone(),
                    claimed: lesson.module_id.clone(),
                    actual: module.id.clone(),
                });
            }
        }

        check_dense_ranks(module.lessons.iter().map(|l| l.order)).map_err(|orders| {
            OutlineError::NonDenseLessonOrder {
                module_id: module.id.clone(),
                orders,
            }
        })?;
    }

    check_dense_ranks(outline.modules.iter().map(|m| m.order)).map_err(|orders| {
        OutlineError::NonDenseModuleOrder {
            course_id: outline.id.clone(),
            orders,
        }
    })?;

    Ok(())
}

/// A rank sequence is valid when sorting it yields exactly 0..n.
fn check_dense_ranks(ranks: impl Iterator<Item = u32>) -> Result<(), Vec<u32>> {
    let mut orders: Vec<u32> = ranks.collect();
    let original = orders.clone();
    orders.sort_unstable();
    let dense = orders
        .iter()
        .enumerate()
        .all(|(i, &order)| order == i as u32);
    if dense {
        Ok(())
    } else {
        Err(original)
    }
}
