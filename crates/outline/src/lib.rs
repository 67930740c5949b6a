//! Acadia Outline - Course structure
//!
//! The course outline is the read-only curriculum input to the access
//! engine: ordered modules owning ordered lessons, with the preview,
//! manual-lock, and drip-release flags the unlock policy evaluates.
//! Mutation belongs to course authoring, outside this engine.

pub mod course;
pub mod error;
pub mod policy;
pub mod store;
pub mod validation;

pub use course::{CourseOutline, Lesson, Module};
pub use error::OutlineError;
pub use policy::UnlockPolicy;
pub use store::{LessonContext, OutlineStore};
pub use validation::validate_outline;
