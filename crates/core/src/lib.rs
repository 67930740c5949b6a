//! Acadia Core - Domain value types
//!
//! This crate contains the fundamental types used across Acadia:
//! - `Points`: additive learner score awarded on lesson completion
//! - `Percent`: integer progress ratio, always within 0..=100

pub mod percent;
pub mod points;

pub use percent::Percent;
pub use points::Points;
