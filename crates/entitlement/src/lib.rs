//! Acadia Entitlement - Enrollment state
//!
//! An entitlement grants a user access to a course's content, independent
//! of per-lesson locks. Entitlements are event-sourced: every transition is
//! appended to a JSONL journal and state is rebuilt by replay. Revocation is
//! soft - rows are never deleted, so the audit trail survives refunds and
//! repeat purchases.

pub mod entitlement;
pub mod error;
pub mod journal;
pub mod resolver;
pub mod store;

pub use entitlement::{Entitlement, EntitlementSource, EntitlementStatus};
pub use error::EntitlementError;
pub use journal::{EntitlementEvent, EntitlementJournal};
pub use resolver::EntitlementResolver;
pub use store::EntitlementStore;
