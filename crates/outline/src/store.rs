//! In-memory outline registry
//!
//! Holds the validated outlines supplied by course authoring and answers
//! the lesson-to-course resolution the access engine needs per request.
//! The store is read-only from the engine's perspective; re-registering a
//! course replaces its outline wholesale.

use crate::course::{CourseOutline, Lesson, Module};
use crate::error::OutlineError;
use crate::validation::validate_outline;
use std::collections::HashMap;

/// A lesson resolved together with its owning module and course.
#[derive(Debug, Clone, Copy)]
pub struct LessonContext<'a> {
    pub course: &'a CourseOutline,
    pub module: &'a Module,
    pub lesson: &'a Lesson,
}

/// Registry of course outlines with a lesson-id index.
#[derive(Debug, Default)]
pub struct OutlineStore {
    courses: HashMap<String, CourseOutline>,
    /// lesson id -> owning course id
    lesson_index: HashMap<String, String>,
}

impl OutlineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register an outline, replacing any prior version.
    pub fn insert(&mut self, outline: CourseOutline) -> Result<(), OutlineError> {
        validate_outline(&outline)?;

        // Drop index entries of the version being replaced
        if let Some(old) = self.courses.remove(&outline.id) {
            for module in &old.modules {
                for lesson in &module.lessons {
                    self.lesson_index.remove(&lesson.id);
                }
            }
        }

        for module in &outline.modules {
            for lesson in &module.lessons {
                self.lesson_index
                    .insert(lesson.id.clone(), outline.id.clone());
            }
        }
        self.courses.insert(outline.id.clone(), outline);
        Ok(())
    }

    /// Look up a course by id
    pub fn course(&self, course_id: &str) -> Option<&CourseOutline> {
        self.courses.get(course_id)
    }

    /// Look up the course owning a lesson
    pub fn course_for_lesson(&self, lesson_id: &str) -> Option<&CourseOutline> {
        let course_id = self.lesson_index.get(lesson_id)?;
        self.courses.get(course_id)
    }

    /// Resolve a lesson id to its full context, or `None` if the lesson or
    /// its module cannot be found (callers fail closed on `None`).
    pub fn lesson_context(&self, lesson_id: &str) -> Option<LessonContext<'_>> {
        let course = self.course_for_lesson(lesson_id)?;
        let (module, lesson) = course.find_lesson(lesson_id)?;
        Some(LessonContext {
            course,
            module,
            lesson,
        })
    }

    /// Number of registered courses
    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Clear all outlines (for testing)
    pub fn clear(&mut self) {
        self.courses.clear();
        self.lesson_index.clear();
    }
}
