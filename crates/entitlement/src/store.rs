//! Entitlement store - journal-backed enrollment state
//!
//! Holds the live entitlement per `(user, course)` plus the full revoked
//! history, rebuilt from the journal on open. All transitions are guarded;
//! invalid moves return `InvalidTransition` instead of mutating.

use crate::entitlement::{Entitlement, EntitlementSource, EntitlementStatus};
use crate::error::EntitlementError;
use crate::journal::{EntitlementEvent, EntitlementJournal};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

/// Journal-backed entitlement state
pub struct EntitlementStore {
    journal: EntitlementJournal,
    /// Every entitlement ever granted, by id (revoked rows included)
    entitlements: HashMap<String, Entitlement>,
    /// (user_id, course_id) -> id of the single non-revoked entitlement
    live_index: HashMap<(String, String), String>,
}

impl EntitlementStore {
    /// Open a store backed by a journal file, replaying existing events
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EntitlementError> {
        let journal = EntitlementJournal::new(path)?;
        let events = journal.read_all()?;

        let mut store = Self {
            journal,
            entitlements: HashMap::new(),
            live_index: HashMap::new(),
        };
        for event in events {
            store.apply(event);
        }
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Self {
        Self {
            journal: EntitlementJournal::in_memory(),
            entitlements: HashMap::new(),
            live_index: HashMap::new(),
        }
    }

    /// Fold one journal event into state. Events are trusted: they were
    /// validated when first appended.
    fn apply(&mut self, event: EntitlementEvent) {
        match event {
            EntitlementEvent::Granted {
                entitlement,
                superseded,
            } => {
                if let Some(old_id) = superseded {
                    if let Some(old) = self.entitlements.get_mut(&old_id) {
                        old.status = EntitlementStatus::Revoked;
                        old.revoked_at = Some(entitlement.granted_at);
                    }
                }
                let key = (entitlement.user_id.clone(), entitlement.course_id.clone());
                self.live_index.insert(key, entitlement.id.clone());
                self.entitlements
                    .insert(entitlement.id.clone(), entitlement);
            }
            EntitlementEvent::Paused { id, .. } => {
                if let Some(ent) = self.entitlements.get_mut(&id) {
                    ent.status = EntitlementStatus::Paused;
                }
            }
            EntitlementEvent::Resumed { id, .. } => {
                if let Some(ent) = self.entitlements.get_mut(&id) {
                    ent.status = EntitlementStatus::Active;
                }
            }
            EntitlementEvent::Revoked { id, timestamp, .. } => {
                if let Some(ent) = self.entitlements.get_mut(&id) {
                    ent.status = EntitlementStatus::Revoked;
                    ent.revoked_at = Some(timestamp);
                    let key = (ent.user_id.clone(), ent.course_id.clone());
                    self.live_index.remove(&key);
                }
            }
            EntitlementEvent::Completed { id, timestamp } => {
                if let Some(ent) = self.entitlements.get_mut(&id) {
                    ent.status = EntitlementStatus::Completed;
                    ent.completed_at = Some(timestamp);
                }
            }
        }
    }

    /// Get the live (non-revoked) entitlement for a `(user, course)` pair
    pub fn get(&self, user_id: &str, course_id: &str) -> Option<&Entitlement> {
        let key = (user_id.to_string(), course_id.to_string());
        let id = self.live_index.get(&key)?;
        self.entitlements.get(id)
    }

    /// Grant a new entitlement, superseding (revoking) any live prior one.
    ///
    /// The new `granted_at` resets the drip clock base for the course.
    pub fn grant(
        &mut self,
        user_id: &str,
        course_id: &str,
        source: EntitlementSource,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, EntitlementError> {
        let key = (user_id.to_string(), course_id.to_string());

        let superseded = self.live_index.get(&key).cloned();
        if let Some(old_id) = &superseded {
            if let Some(old) = self.entitlements.get_mut(old_id) {
                old.status = EntitlementStatus::Revoked;
                old.revoked_at = Some(now);
            }
            tracing::debug!(user_id, course_id, superseded = %old_id, "repeat grant supersedes prior entitlement");
        }

        let entitlement = Entitlement::new(user_id, course_id, source, now);
        self.journal.append(&EntitlementEvent::Granted {
            entitlement: entitlement.clone(),
            superseded,
        })?;

        self.live_index.insert(key, entitlement.id.clone());
        self.entitlements
            .insert(entitlement.id.clone(), entitlement.clone());
        Ok(entitlement)
    }

    /// Pause a live entitlement (billing hold, mentor action)
    pub fn pause(
        &mut self,
        user_id: &str,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, EntitlementError> {
        self.transition(user_id, course_id, |ent| {
            if ent.status != EntitlementStatus::Active {
                return None;
            }
            ent.status = EntitlementStatus::Paused;
            Some(EntitlementEvent::Paused {
                id: ent.id.clone(),
                timestamp: now,
            })
        })
    }

    /// Resume a paused entitlement
    pub fn resume(
        &mut self,
        user_id: &str,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, EntitlementError> {
        self.transition(user_id, course_id, |ent| {
            if ent.status != EntitlementStatus::Paused {
                return None;
            }
            ent.status = EntitlementStatus::Active;
            Some(EntitlementEvent::Resumed {
                id: ent.id.clone(),
                timestamp: now,
            })
        })
    }

    /// Revoke the live entitlement (refund, admin action). Soft delete:
    /// the row survives for audit, only the live index entry is dropped.
    pub fn revoke(
        &mut self,
        user_id: &str,
        course_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, EntitlementError> {
        let reason = reason.map(|s| s.to_string());
        let revoked = self.transition(user_id, course_id, |ent| {
            ent.status = EntitlementStatus::Revoked;
            ent.revoked_at = Some(now);
            Some(EntitlementEvent::Revoked {
                id: ent.id.clone(),
                reason: reason.clone(),
                timestamp: now,
            })
        })?;

        let key = (user_id.to_string(), course_id.to_string());
        self.live_index.remove(&key);
        Ok(revoked)
    }

    /// Transition an active entitlement to completed, stamping
    /// `completed_at`. Idempotent: an already-completed entitlement is
    /// returned unchanged so re-delivered completion events are no-ops.
    pub fn mark_completed(
        &mut self,
        user_id: &str,
        course_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, EntitlementError> {
        if let Some(ent) = self.get(user_id, course_id) {
            if ent.status == EntitlementStatus::Completed {
                return Ok(ent.clone());
            }
        }

        self.transition(user_id, course_id, |ent| {
            if ent.status != EntitlementStatus::Active {
                return None;
            }
            ent.status = EntitlementStatus::Completed;
            ent.completed_at = Some(now);
            Some(EntitlementEvent::Completed {
                id: ent.id.clone(),
                timestamp: now,
            })
        })
    }

    /// Run a guarded transition on the live entitlement. The closure
    /// mutates the row and returns the journal event, or `None` when the
    /// current status does not permit the move.
    fn transition(
        &mut self,
        user_id: &str,
        course_id: &str,
        f: impl FnOnce(&mut Entitlement) -> Option<EntitlementEvent>,
    ) -> Result<Entitlement, EntitlementError> {
        let key = (user_id.to_string(), course_id.to_string());
        let id = self
            .live_index
            .get(&key)
            .ok_or_else(|| EntitlementError::NotFound {
                user_id: user_id.to_string(),
                course_id: course_id.to_string(),
            })?
            .clone();

        // The index only holds ids present in the map
        let ent = self
            .entitlements
            .get_mut(&id)
            .ok_or_else(|| EntitlementError::NotFound {
                user_id: user_id.to_string(),
                course_id: course_id.to_string(),
            })?;

        let from = ent.status;
        match f(ent) {
            Some(event) => {
                let snapshot = ent.clone();
                self.journal.append(&event)?;
                Ok(snapshot)
            }
            None => Err(EntitlementError::InvalidTransition { id, from }),
        }
    }

    /// Number of entitlements ever granted (revoked included)
    pub fn total_count(&self) -> usize {
        self.entitlements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_grant_and_get() {
        let mut store = EntitlementStore::in_memory();
        let ent = store
            .grant("alice", "c1", EntitlementSource::Paid, now())
            .unwrap();

        let got = store.get("alice", "c1").unwrap();
        assert_eq!(got.id, ent.id);
        assert_eq!(got.status, EntitlementStatus::Active);
        assert!(store.get("alice", "c2").is_none());
        assert!(store.get("bob", "c1").is_none());
    }

    #[test]
    fn test_repeat_grant_supersedes() {
        let mut store = EntitlementStore::in_memory();
        let t1 = now();
        let first = store
            .grant("alice", "c1", EntitlementSource::Free, t1)
            .unwrap();
        let t2 = t1 + chrono::Duration::days(30);
        let second = store
            .grant("alice", "c1", EntitlementSource::Paid, t2)
            .unwrap();

        assert_ne!(first.id, second.id);
        let live = store.get("alice", "c1").unwrap();
        assert_eq!(live.id, second.id);
        assert_eq!(live.granted_at, t2);
        assert_eq!(store.total_count(), 2);
    }

    #[test]
    fn test_pause_resume() {
        let mut store = EntitlementStore::in_memory();
        store
            .grant("alice", "c1", EntitlementSource::Paid, now())
            .unwrap();

        let paused = store.pause("alice", "c1", now()).unwrap();
        assert_eq!(paused.status, EntitlementStatus::Paused);
        assert!(!store.get("alice", "c1").unwrap().grants_access());

        // Pausing twice is an invalid transition
        assert!(matches!(
            store.pause("alice", "c1", now()),
            Err(EntitlementError::InvalidTransition { .. })
        ));

        let resumed = store.resume("alice", "c1", now()).unwrap();
        assert_eq!(resumed.status, EntitlementStatus::Active);
    }

    #[test]
    fn test_revoke_is_soft() {
        let mut store = EntitlementStore::in_memory();
        store
            .grant("alice", "c1", EntitlementSource::Paid, now())
            .unwrap();
        store
            .revoke("alice", "c1", Some("refund"), now())
            .unwrap();

        assert!(store.get("alice", "c1").is_none());
        assert_eq!(store.total_count(), 1);

        // Further transitions find nothing live
        assert!(matches!(
            store.pause("alice", "c1", now()),
            Err(EntitlementError::NotFound { .. })
        ));
    }

    #[test]
    fn test_mark_completed_idempotent() {
        let mut store = EntitlementStore::in_memory();
        store
            .grant("alice", "c1", EntitlementSource::Paid, now())
            .unwrap();

        let t = now();
        let done = store.mark_completed("alice", "c1", t).unwrap();
        assert_eq!(done.status, EntitlementStatus::Completed);
        assert_eq!(done.completed_at, Some(t));

        // Second delivery does not move completed_at
        let later = t + chrono::Duration::hours(1);
        let again = store.mark_completed("alice", "c1", later).unwrap();
        assert_eq!(again.completed_at, Some(t));
    }

    #[test]
    fn test_completed_entitlement_cannot_pause() {
        let mut store = EntitlementStore::in_memory();
        store
            .grant("alice", "c1", EntitlementSource::Paid, now())
            .unwrap();
        store.mark_completed("alice", "c1", now()).unwrap();

        assert!(matches!(
            store.pause("alice", "c1", now()),
            Err(EntitlementError::InvalidTransition {
                from: EntitlementStatus::Completed,
                ..
            })
        ));
    }

    #[test]
    fn test_replay_rebuilds_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entitlements.jsonl");
        let t1 = now();

        let (first_id, second_id) = {
            let mut store = EntitlementStore::open(&path).unwrap();
            let first = store
                .grant("alice", "c1", EntitlementSource::Free, t1)
                .unwrap();
            let second = store
                .grant("alice", "c1", EntitlementSource::Paid, t1)
                .unwrap();
            store.grant("bob", "c1", EntitlementSource::Paid, t1).unwrap();
            store.pause("bob", "c1", t1).unwrap();
            (first.id, second.id)
        };

        let store = EntitlementStore::open(&path).unwrap();
        assert_eq!(store.total_count(), 3);

        let alice = store.get("alice", "c1").unwrap();
        assert_eq!(alice.id, second_id);
        assert_ne!(alice.id, first_id);

        let bob = store.get("bob", "c1").unwrap();
        assert_eq!(bob.status, EntitlementStatus::Paused);
    }
}
