//! Append-only JSONL entitlement journal
//!
//! Each line is one serialized `EntitlementEvent`. The file is append-only;
//! current state is rebuilt by folding the events in order.

use crate::entitlement::Entitlement;
use crate::error::EntitlementError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Entitlement lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntitlementEvent {
    /// A new entitlement was created; `superseded` names the prior live
    /// entitlement revoked by this grant, if any
    Granted {
        entitlement: Entitlement,
        superseded: Option<String>,
    },
    Paused {
        id: String,
        timestamp: DateTime<Utc>,
    },
    Resumed {
        id: String,
        timestamp: DateTime<Utc>,
    },
    Revoked {
        id: String,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
    Completed {
        id: String,
        timestamp: DateTime<Utc>,
    },
}

/// Append-only JSONL journal with an in-memory mode for tests
pub struct EntitlementJournal {
    path: PathBuf,
    file: Option<File>,
}

impl EntitlementJournal {
    /// Open (creating if needed) a journal at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self, EntitlementError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Create an in-memory journal (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
        }
    }

    /// Append an event
    pub fn append(&mut self, event: &EntitlementEvent) -> Result<(), EntitlementError> {
        let json = serde_json::to_string(event)?;
        if let Some(ref mut file) = self.file {
            writeln!(file, "{}", json)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Read all events in append order
    pub fn read_all(&self) -> Result<Vec<EntitlementEvent>, EntitlementError> {
        if self.file.is_none() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: EntitlementEvent = serde_json::from_str(&line)?;
            events.push(event);
        }

        Ok(events)
    }

    /// Check if this is an in-memory journal
    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}
