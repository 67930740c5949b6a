//! Hash-chained JSONL progress journal

use crate::chain::{calculate_entry_hash, verify_chain, GENESIS};
use crate::error::ProgressError;
use acadia_core::Points;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// What happened, attached to a `ProgressEntry`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// The watch high-water mark for a lesson moved forward
    WatchAdvanced { watched_seconds: u32 },

    /// A lesson crossed its completion threshold (or was explicitly
    /// completed); `points` is what was awarded, zero on a re-completion
    LessonCompleted { points: Points },

    /// Every lesson of the course is complete
    CourseCompleted,
}

/// One journal line. Entries are hash-chained in append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub sequence: u64,
    pub prev_hash: String,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub course_id: String,
    /// None for course-level events
    pub lesson_id: Option<String>,
    pub kind: ProgressEventKind,
}

/// Append-only JSONL journal maintaining the hash chain.
///
/// In-memory mode (tests) keeps chain counters but discards entries.
pub struct ProgressJournal {
    path: PathBuf,
    file: Option<File>,
    next_sequence: u64,
    last_hash: String,
}

impl ProgressJournal {
    /// Open (creating if needed) a journal, scanning existing entries to
    /// restore the chain position. Returns the journal and the replayed
    /// entries so callers can rebuild state in one pass.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<ProgressEntry>), ProgressError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = Self::read_entries(&path)?;
        let (next_sequence, last_hash) = match entries.last() {
            Some(last) => (last.sequence + 1, last.hash.clone()),
            None => (0, GENESIS.to_string()),
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok((
            Self {
                path,
                file: Some(file),
                next_sequence,
                last_hash,
            },
            entries,
        ))
    }

    /// Create an in-memory journal (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
            next_sequence: 0,
            last_hash: GENESIS.to_string(),
        }
    }

    /// Append one event, extending the chain
    pub fn append(
        &mut self,
        user_id: &str,
        course_id: &str,
        lesson_id: Option<&str>,
        kind: ProgressEventKind,
        timestamp: DateTime<Utc>,
    ) -> Result<ProgressEntry, ProgressError> {
        let mut entry = ProgressEntry {
            sequence: self.next_sequence,
            prev_hash: self.last_hash.clone(),
            hash: String::new(),
            timestamp,
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            lesson_id: lesson_id.map(|s| s.to_string()),
            kind,
        };
        entry.hash = calculate_entry_hash(&entry);

        let json = serde_json::to_string(&entry)?;
        if let Some(ref mut file) = self.file {
            writeln!(file, "{}", json)?;
            file.flush()?;
        }

        self.next_sequence += 1;
        self.last_hash = entry.hash.clone();
        Ok(entry)
    }

    /// Read all entries from disk and verify the chain
    pub fn verify(&self) -> Result<usize, ProgressError> {
        if self.file.is_none() {
            return Ok(0);
        }
        let entries = Self::read_entries(&self.path)?;
        verify_chain(&entries)?;
        Ok(entries.len())
    }

    /// Number of entries appended so far (including replayed ones)
    pub fn len(&self) -> u64 {
        self.next_sequence
    }

    pub fn is_empty(&self) -> bool {
        self.next_sequence == 0
    }

    /// Check if this is an in-memory journal
    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }

    fn read_entries(path: &Path) -> Result<Vec<ProgressEntry>, ProgressError> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ProgressEntry = serde_json::from_str(&line)?;
            entries.push(entry);
        }

        Ok(entries)
    }
}
