//! Acadia Access - Unlock policy evaluation
//!
//! One deterministic answer to "can this learner open this lesson right
//! now". The source pages applied preview, entitlement, drip, and manual
//! locks independently and inconsistently; here they collapse into a single
//! fixed precedence, first match wins.

pub mod decision;
pub mod evaluator;

pub use decision::AccessDecision;
pub use evaluator::{evaluate, AccessRequest};
