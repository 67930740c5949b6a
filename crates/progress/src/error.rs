//! Progress ledger errors

use crate::chain::ChainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Journal chain error: {0}")]
    Chain(#[from] ChainError),
}
