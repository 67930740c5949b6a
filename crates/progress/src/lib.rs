//! Acadia Progress - Completion ledger
//!
//! Records watch-time and completion events idempotently and derives the
//! per-course progress aggregates. Raw events land in a hash-chained
//! append-only JSONL journal; current state (high-water marks, completion
//! rows, course stamps) is rebuilt by replay on open.
//!
//! The ledger does not enforce unlock policy - callers must have confirmed
//! an unlocked decision before recording.

pub mod chain;
pub mod completion;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod snapshot;

pub use completion::LessonCompletion;
pub use error::ProgressError;
pub use journal::{ProgressEntry, ProgressEventKind, ProgressJournal};
pub use ledger::{ProgressLedger, ProgressSignal, RecordOutcome};
pub use snapshot::{ModuleProgress, ProgressSnapshot};
