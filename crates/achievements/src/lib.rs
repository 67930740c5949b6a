//! Acadia Achievements - Deterministic badge awarding
//!
//! Badges are a pure function of ledger state: the same completions always
//! produce the same awards, and re-evaluating after a duplicate event
//! awards nothing new. This replaces ad-hoc random congratulation draws
//! with reproducible rules.

pub mod achievement;
pub mod error;
pub mod log;
pub mod rules;

pub use achievement::{Achievement, AchievementCode};
pub use error::AchievementError;
pub use log::AchievementLog;
pub use rules::{AchievementContext, AchievementEvaluator, RuleConfig};
