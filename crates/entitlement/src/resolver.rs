//! Entitlement resolver - read-only enrollment lookup
//!
//! Supplies the fact base (status, `granted_at`) the unlock policy
//! evaluator works from. It never grants access by itself, and "not
//! enrolled" is a valid outcome, not an error.

use crate::entitlement::Entitlement;
use crate::store::EntitlementStore;

/// Read-only view over the entitlement store
pub struct EntitlementResolver<'a> {
    store: &'a EntitlementStore,
}

impl<'a> EntitlementResolver<'a> {
    pub fn new(store: &'a EntitlementStore) -> Self {
        Self { store }
    }

    /// Resolve the single non-revoked entitlement for the pair, if any.
    ///
    /// Statuses are explicit events, so resolution needs no clock; drip
    /// arithmetic happens downstream where `granted_at` meets `now`.
    pub fn resolve(&self, user_id: &str, course_id: &str) -> Option<&'a Entitlement> {
        self.store.get(user_id, course_id)
    }
}
