//! Course outline - ordered modules and lessons

use crate::policy::UnlockPolicy;
use acadia_core::Points;
use serde::{Deserialize, Serialize};

/// A single lesson within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,

    /// Id of the owning module (must match the module this lesson sits in)
    pub module_id: String,

    /// Zero-based rank within the owning module, dense and unique
    pub order: u32,

    /// Free-preview override: reachable without an entitlement
    #[serde(default)]
    pub is_preview: bool,

    /// Manual instructor lock, independent of the module's gate
    #[serde(default)]
    pub is_locked: bool,

    /// Points awarded the first time the lesson is completed
    #[serde(default)]
    pub points_on_completion: Points,

    /// Watched-seconds mark at which the lesson counts as complete.
    /// Zero means the lesson completes only on an explicit complete signal.
    #[serde(default)]
    pub completion_threshold_secs: u32,
}

impl Lesson {
    /// Create a plain lesson with no flags set
    pub fn new(id: impl Into<String>, module_id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            module_id: module_id.into(),
            order,
            is_preview: false,
            is_locked: false,
            points_on_completion: Points::ZERO,
            completion_threshold_secs: 0,
        }
    }

    /// Set the points awarded on completion
    pub fn with_points(mut self, points: u64) -> Self {
        self.points_on_completion = Points::new(points);
        self
    }

    /// Set the watch-time completion threshold
    pub fn with_threshold_secs(mut self, secs: u32) -> Self {
        self.completion_threshold_secs = secs;
        self
    }

    /// Mark as a free-preview lesson
    pub fn preview(mut self) -> Self {
        self.is_preview = true;
        self
    }

    /// Mark as manually locked by the instructor
    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }
}

/// A module: an ordered group of lessons, optionally drip-gated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,

    /// Zero-based rank within the course, dense and unique
    pub order: u32,

    /// Arms the module's drip gate; without an unlock policy the module
    /// is not time-gated
    #[serde(default)]
    pub is_locked: bool,

    /// Drip-release policy, meaningful only while `is_locked` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_policy: Option<UnlockPolicy>,

    pub lessons: Vec<Lesson>,
}

impl Module {
    pub fn new(id: impl Into<String>, order: u32, lessons: Vec<Lesson>) -> Self {
        Self {
            id: id.into(),
            order,
            is_locked: false,
            unlock_policy: None,
            lessons,
        }
    }

    /// Arm the drip gate with the given policy
    pub fn drip(mut self, policy: UnlockPolicy) -> Self {
        self.is_locked = true;
        self.unlock_policy = Some(policy);
        self
    }
}

/// The full outline of a course: ordered modules owning ordered lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub id: String,

    /// When set, a lesson unlocks only after every lesson with a strictly
    /// lower (module order, lesson order) has been completed
    #[serde(default)]
    pub sequential: bool,

    pub modules: Vec<Module>,
}

impl CourseOutline {
    pub fn new(id: impl Into<String>, modules: Vec<Module>) -> Self {
        Self {
            id: id.into(),
            sequential: false,
            modules,
        }
    }

    /// Enable sequential prerequisite gating for this course
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    /// Total number of lessons across all modules
    pub fn total_lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    /// Find a lesson and its owning module by lesson id
    pub fn find_lesson(&self, lesson_id: &str) -> Option<(&Module, &Lesson)> {
        self.modules.iter().find_map(|module| {
            module
                .lessons
                .iter()
                .find(|lesson| lesson.id == lesson_id)
                .map(|lesson| (module, lesson))
        })
    }

    /// Find a module by id
    pub fn find_module(&self, module_id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    /// All lessons in course order: ascending (module order, lesson order)
    pub fn lessons_in_order(&self) -> Vec<&Lesson> {
        let mut modules: Vec<&Module> = self.modules.iter().collect();
        modules.sort_by_key(|m| m.order);

        let mut out = Vec::with_capacity(self.total_lesson_count());
        for module in modules {
            let mut lessons: Vec<&Lesson> = module.lessons.iter().collect();
            lessons.sort_by_key(|l| l.order);
            out.extend(lessons);
        }
        out
    }

    /// Lessons strictly before the given position in course order
    pub fn lessons_before(&self, module_order: u32, lesson_order: u32) -> Vec<&Lesson> {
        self.lessons_in_order()
            .into_iter()
            .take_while(|l| {
                let m = self
                    .find_module(&l.module_id)
                    .map(|m| m.order)
                    .unwrap_or(u32::MAX);
                (m, l.order) < (module_order, lesson_order)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> CourseOutline {
        CourseOutline::new(
            "rust-101",
            vec![
                Module::new(
                    "m1",
                    0,
                    vec![Lesson::new("l1", "m1", 0), Lesson::new("l2", "m1", 1)],
                ),
                Module::new("m2", 1, vec![Lesson::new("l3", "m2", 0)]),
            ],
        )
    }

    #[test]
    fn test_total_lesson_count() {
        assert_eq!(sample_course().total_lesson_count(), 3);
    }

    #[test]
    fn test_find_lesson() {
        let course = sample_course();
        let (module, lesson) = course.find_lesson("l3").unwrap();
        assert_eq!(module.id, "m2");
        assert_eq!(lesson.order, 0);
        assert!(course.find_lesson("nope").is_none());
    }

    #[test]
    fn test_lessons_in_order() {
        let course = sample_course();
        let ids: Vec<&str> = course
            .lessons_in_order()
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn test_lessons_in_order_sorts_by_rank_not_position() {
        // Modules and lessons stored out of order still iterate by rank
        let course = CourseOutline::new(
            "c",
            vec![
                Module::new("m2", 1, vec![Lesson::new("l3", "m2", 0)]),
                Module::new(
                    "m1",
                    0,
                    vec![Lesson::new("l2", "m1", 1), Lesson::new("l1", "m1", 0)],
                ),
            ],
        );
        let ids: Vec<&str> = course
            .lessons_in_order()
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn test_lessons_before() {
        let course = sample_course();
        let before: Vec<&str> = course
            .lessons_before(1, 0)
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(before, vec!["l1", "l2"]);
        assert!(course.lessons_before(0, 0).is_empty());
    }
}
