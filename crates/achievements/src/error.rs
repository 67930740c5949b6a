//! Achievement log errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AchievementError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
