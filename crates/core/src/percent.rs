//! Percent - integer progress ratio
//!
//! All progress percentages in Acadia are integers within 0..=100.
//! This is enforced at the type level.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when constructing a percentage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PercentError {
    #[error("Percent out of range (0..=100): {0}")]
    OutOfRange(u8),
}

/// An integer percentage, always within 0..=100.
///
/// # Invariant
/// The inner value is always <= 100. This is enforced by the constructor.
///
/// # Example
/// ```
/// use acadia_core::Percent;
///
/// // 3 of 4 lessons complete
/// assert_eq!(Percent::from_ratio(3, 4).value(), 75);
/// // Rounding is half-up
/// assert_eq!(Percent::from_ratio(1, 3).value(), 33);
/// assert_eq!(Percent::from_ratio(2, 3).value(), 67);
/// // Empty courses report zero, not a division error
/// assert_eq!(Percent::from_ratio(0, 0).value(), 0);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percent(u8);

impl Percent {
    /// Zero percent constant
    pub const ZERO: Self = Self(0);

    /// One hundred percent constant
    pub const COMPLETE: Self = Self(100);

    /// Create a new Percent from a raw value.
    ///
    /// Returns an error if the value exceeds 100.
    pub fn new(value: u8) -> Result<Self, PercentError> {
        if value > 100 {
            Err(PercentError::OutOfRange(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Compute `round(100 * completed / total)` with half-up rounding,
    /// clamped to 0..=100. A zero `total` yields zero.
    ///
    /// 100 is reported only when every lesson is complete; a partial course
    /// that would round up to 100 is held at 99 so that a "100%" reading
    /// always means full completion.
    pub fn from_ratio(completed: usize, total: usize) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let completed = completed.min(total) as u64;
        let total = total as u64;
        if completed == total {
            return Self::COMPLETE;
        }
        // Integer half-up rounding: floor((2 * 100 * c + t) / (2 * t))
        let value = (200 * completed + total) / (2 * total);
        Self(value.min(99) as u8)
    }

    /// Get the inner value
    #[inline]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Check whether this represents full completion
    #[inline]
    pub const fn is_complete(&self) -> bool {
        self.0 == 100
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Percent {
    type Error = PercentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Percent::new(value)
    }
}

impl From<Percent> for u8 {
    fn from(percent: Percent) -> u8 {
        percent.0
    }
}
