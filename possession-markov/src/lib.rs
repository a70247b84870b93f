//! Possession Markov Chain Library
//!
//! Builds a discrete-state Markov chain of ball possession from football
//! event feeds and estimates its smoothed transition matrix.
//!
//! # Architecture
//!
//! The library is a synchronous pipeline of pure steps:
//! - Each event is mapped to zero, one or two states `(side, zone, action)`
//! - Each match's event stream is cut into chains and linked into transitions
//! - Possession flips are tagged with a cause
//! - Per-match counts are summed and normalized into a smoothed matrix,
//!   which can be split into attack/defense blocks
//!
//! The library does NOT:
//! - Download or cache event data
//! - Write reports or plots
//! - Run matches in parallel (callers may, results merge in any order)
//!
//! Report generation lives in the application layer (possession-markov-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use possession_markov::{ChainAnalyzer, ChainConfig, RegistryScope};
//! use std::path::Path;
//!
//! let config = ChainConfig::new()
//!     .with_reference_team(217)
//!     .with_smoothing(0.3);
//! let analyzer = ChainAnalyzer::new(config).unwrap();
//!
//! let matches = vec![
//!     analyzer.analyze_file(Path::new("events/3773386.json")).unwrap(),
//!     analyzer.analyze_file(Path::new("events/3773403.json")).unwrap(),
//! ];
//! let total = analyzer.aggregate(&matches);
//!
//! let model = analyzer.estimate(&total.transitions, RegistryScope::Observed);
//! let blocks = model.blocks();
//! println!("{} states, {} attack", model.len(), blocks.attack.len());
//! ```

// Public modules
pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod config;
pub mod estimator;
pub mod event;
pub mod flip;
pub mod segmentation;
pub mod state;
pub mod types;

// Re-export main types for convenience
pub use aggregate::{FlipCounts, FlipKey, Transition, TransitionCounts, TransitionProbabilities};
pub use analyzer::{ChainAnalyzer, RegistryScope};
pub use config::{ChainConfig, SideFraming, ZoneGranularity};
pub use estimator::{BlockDecomposition, Estimator, StateRegistry, TransitionModel};
pub use event::{Event, EventKind, Outcome, Restart};
pub use feed::{resolve_team_id, EventSource, MatchFeed, StatsBombFeed};
pub use flip::{EventIndex, FlipCause, RelatedEvents};
pub use segmentation::{MatchTransitions, SegmentStats, Segmenter};
pub use state::{Action, Side, Situation, State, Zone};
pub use types::{ChainError, Location, OrderKey, Result, TeamId};

// Internal modules (not exposed in public API)
mod feed;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an analyzer over an empty match yields no transitions
        let analyzer = ChainAnalyzer::new(ChainConfig::new().with_reference_team(1)).unwrap();
        let result = analyzer.analyze_events(&[]);
        assert!(result.transitions.is_empty());
        assert!(!VERSION.is_empty());
    }
}
