//! Append-only achievement log
//!
//! Each line is one awarded `Achievement`. `(user_id, code)` is unique;
//! `award_all` silently drops codes the user already holds, which makes
//! awarding idempotent under re-delivered progress events.

use crate::achievement::{Achievement, AchievementCode};
use crate::error::AchievementError;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// JSONL-backed achievement set per user
pub struct AchievementLog {
    path: PathBuf,
    file: Option<File>,
    /// user_id -> awarded achievements in earn order
    awarded: HashMap<String, Vec<Achievement>>,
    /// (user_id, code string) uniqueness guard
    seen: HashSet<(String, String)>,
}

impl AchievementLog {
    /// Open a log backed by a JSONL file, replaying existing awards
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AchievementError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut log = Self {
            file: None,
            path: path.clone(),
            awarded: HashMap::new(),
            seen: HashSet::new(),
        };

        if path.exists() {
            let file = File::open(&path)?;
            let reader = BufReader::new(file);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let achievement: Achievement = serde_json::from_str(&line)?;
                log.insert(achievement);
            }
        }

        log.file = Some(OpenOptions::new().create(true).append(true).open(&path)?);
        Ok(log)
    }

    /// Create an in-memory log (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
            awarded: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    fn insert(&mut self, achievement: Achievement) {
        let key = (achievement.user_id.clone(), achievement.code.as_code());
        if self.seen.insert(key) {
            self.awarded
                .entry(achievement.user_id.clone())
                .or_default()
                .push(achievement);
        }
    }

    /// Award every code the user does not already hold.
    ///
    /// Returns only the newly earned achievements, in input order.
    pub fn award_all(
        &mut self,
        user_id: &str,
        codes: Vec<AchievementCode>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Achievement>, AchievementError> {
        let mut new = Vec::new();

        for code in codes {
            let key = (user_id.to_string(), code.as_code());
            if self.seen.contains(&key) {
                continue;
            }

            let achievement = Achievement::new(user_id, code, now);
            if let Some(ref mut file) = self.file {
                let json = serde_json::to_string(&achievement)?;
                writeln!(file, "{}", json)?;
                file.flush()?;
            }

            self.seen.insert(key);
            self.awarded
                .entry(user_id.to_string())
                .or_default()
                .push(achievement.clone());
            new.push(achievement);
        }

        Ok(new)
    }

    /// Whether the user holds the given code
    pub fn has(&self, user_id: &str, code: &AchievementCode) -> bool {
        self.seen
            .contains(&(user_id.to_string(), code.as_code()))
    }

    /// All achievements for a user, in earn order
    pub fn list(&self, user_id: &str) -> Vec<Achievement> {
        self.awarded.get(user_id).cloned().unwrap_or_default()
    }
}
