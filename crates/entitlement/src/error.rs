//! Entitlement errors

use crate::entitlement::EntitlementStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntitlementError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No entitlement for user '{user_id}' on course '{course_id}'")]
    NotFound { user_id: String, course_id: String },

    #[error("Invalid transition from {from} for entitlement '{id}'")]
    InvalidTransition { id: String, from: EntitlementStatus },
}
