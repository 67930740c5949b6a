//! Hash chain over progress journal entries
//!
//! Each entry carries the hash of its predecessor, so a truncated or edited
//! journal is detectable on replay.

use crate::journal::ProgressEntry;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Sentinel prev_hash for the first entry
pub const GENESIS: &str = "GENESIS";

/// Calculate the SHA256 hash of an entry's content (excluding `hash` itself)
pub fn calculate_entry_hash(entry: &ProgressEntry) -> String {
    let mut hasher = Sha256::new();

    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(entry.timestamp.to_rfc3339().as_bytes());
    hasher.update(entry.user_id.as_bytes());
    hasher.update(entry.course_id.as_bytes());
    if let Some(ref lesson_id) = entry.lesson_id {
        hasher.update(lesson_id.as_bytes());
    }
    hasher.update(format!("{:?}", entry.kind).as_bytes());

    hex::encode(hasher.finalize())
}

/// Errors in chain verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Broken link at seq {sequence}: expected prev_hash '{expected}', got '{actual}'")]
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at seq {sequence}: expected '{expected}', got '{actual}'")]
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },
}

/// Walk the chain, verifying links, hashes, and sequence numbering
pub fn verify_chain(entries: &[ProgressEntry]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS.to_string();

    for (i, entry) in entries.iter().enumerate() {
        if entry.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: entry.sequence,
                expected: prev_hash,
                actual: entry.prev_hash.clone(),
            });
        }

        let calculated = calculate_entry_hash(entry);
        if entry.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: entry.sequence,
                expected: calculated,
                actual: entry.hash.clone(),
            });
        }

        if i > 0 && entry.sequence != entries[i - 1].sequence + 1 {
            return Err(ChainError::InvalidSequence {
                expected: entries[i - 1].sequence + 1,
                actual: entry.sequence,
            });
        }

        prev_hash = entry.hash.clone();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::ProgressEventKind;
    use chrono::Utc;

    fn entry(sequence: u64, prev_hash: &str) -> ProgressEntry {
        let mut e = ProgressEntry {
            sequence,
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
            timestamp: Utc::now(),
            user_id: "alice".to_string(),
            course_id: "c1".to_string(),
            lesson_id: Some("l1".to_string()),
            kind: ProgressEventKind::WatchAdvanced {
                watched_seconds: 60,
            },
        };
        e.hash = calculate_entry_hash(&e);
        e
    }

    #[test]
    fn test_empty_chain_verifies() {
        assert!(verify_chain(&[]).is_ok());
    }

    #[test]
    fn test_valid_chain_verifies() {
        let e0 = entry(0, GENESIS);
        let e1 = entry(1, &e0.hash);
        let e2 = entry(2, &e1.hash);
        assert!(verify_chain(&[e0, e1, e2]).is_ok());
    }

    #[test]
    fn test_tampered_entry_detected() {
        let e0 = entry(0, GENESIS);
        let mut e1 = entry(1, &e0.hash);
        e1.user_id = "mallory".to_string(); // hash no longer matches
        assert!(matches!(
            verify_chain(&[e0, e1]),
            Err(ChainError::InvalidHash { sequence: 1, .. })
        ));
    }

    #[test]
    fn test_broken_link_detected() {
        let e0 = entry(0, GENESIS);
        let e1 = entry(1, "bogus");
        assert!(matches!(
            verify_chain(&[e0, e1]),
            Err(ChainError::BrokenLink { sequence: 1, .. })
        ));
    }

    #[test]
    fn test_sequence_gap_detected() {
        let e0 = entry(0, GENESIS);
        let e2 = entry(2, &e0.hash);
        assert!(matches!(
            verify_chain(&[e0, e2]),
            Err(ChainError::InvalidSequence {
                expected: 1,
                actual: 2
            })
        ));
    }
}
