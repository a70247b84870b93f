//! Core types shared across the chain builder
//!
//! Identifiers, pitch locations, the ordering key used to sequence events,
//! and the library error type. Per-event anomalies never surface here: an
//! event that cannot be mapped simply produces no state. Only problems that
//! must stop a run before it starts (configuration, unreadable feeds) are
//! errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Team identifier as carried by the event feed
pub type TeamId = u64;

/// Result type for chain-building operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors that can occur while configuring or feeding the chain builder
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Reference team is required for reference side framing")]
    MissingReferenceTeam,

    #[error("Smoothing parameter must be finite and >= 0, got {0}")]
    InvalidSmoothing(f64),

    #[error("Failed to parse event feed: {0}")]
    FeedParseError(String),

    #[error("Team not found in events: {0}")]
    TeamNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Pitch length along the x axis
pub const PITCH_LENGTH: f64 = 120.0;

/// Pitch width along the y axis
pub const PITCH_WIDTH: f64 = 80.0;

/// A 2D pitch location on the feed's 120x80 coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: Option<f64>,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y: Some(y) }
    }

    /// Location with only the length-wise coordinate known
    pub fn from_x(x: f64) -> Self {
        Self { x, y: None }
    }

    /// The same spot seen from the opposite attacking direction
    pub fn mirrored(self) -> Self {
        Self {
            x: PITCH_LENGTH - self.x,
            y: self.y.map(|y| PITCH_WIDTH - y),
        }
    }
}

/// Total ordering key of events within one match
///
/// Compared lexicographically: period, minute, second, then the feed's
/// sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OrderKey {
    pub period: u8,
    pub minute: u32,
    pub second: u32,
    pub index: u32,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P{} {:02}:{:02} #{}",
            self.period, self.minute, self.second, self.index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_key_is_lexicographic() {
        let early = OrderKey { period: 1, minute: 44, second: 59, index: 900 };
        let late = OrderKey { period: 2, minute: 0, second: 0, index: 1 };
        assert!(early < late);

        let a = OrderKey { period: 1, minute: 3, second: 10, index: 5 };
        let b = OrderKey { period: 1, minute: 3, second: 10, index: 6 };
        assert!(a < b);
    }

    #[test]
    fn test_order_key_display() {
        let key = OrderKey { period: 2, minute: 5, second: 7, index: 42 };
        assert_eq!(key.to_string(), "P2 05:07 #42");
    }

    #[test]
    fn test_mirrored_location() {
        assert_eq!(Location::new(12.0, 30.0).mirrored(), Location::new(108.0, 50.0));
        assert_eq!(Location::from_x(100.0).mirrored(), Location::from_x(20.0));
        assert_eq!(Location::new(60.0, 40.0).mirrored(), Location::new(60.0, 40.0));
    }

    #[test]
    fn test_error_messages() {
        let err = ChainError::InvalidSmoothing(-1.0);
        assert_eq!(
            err.to_string(),
            "Smoothing parameter must be finite and >= 0, got -1"
        );
    }
}
