//! Acadia Engine - The access facade
//!
//! The single entry point consumed by UI pages, API routes, and mentor
//! dashboards. Composes the entitlement resolver, the unlock policy
//! evaluator, the progress ledger, and the achievement evaluator behind
//! two calls: `can_access` and `record_progress`.

pub mod engine;
pub mod error;

pub use engine::{AccessEngine, ProgressReport};
pub use error::{EngineError, EngineResult};

// The vocabulary callers need alongside the facade
pub use acadia_access::AccessDecision;
pub use acadia_achievements::{Achievement, AchievementCode, RuleConfig};
pub use acadia_core::{Percent, Points};
pub use acadia_entitlement::{Entitlement, EntitlementSource, EntitlementStatus};
pub use acadia_outline::{CourseOutline, Lesson, Module, UnlockPolicy};
pub use acadia_progress::{ModuleProgress, ProgressSignal, ProgressSnapshot};
