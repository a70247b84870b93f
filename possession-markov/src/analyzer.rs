//! Main analyzer API
//!
//! [`ChainAnalyzer`] is the entry point of the library. It validates the
//! configuration once, segments matches (one at a time or in parallel from
//! the caller's side) and estimates the smoothed transition model from the
//! aggregated counts.

use crate::aggregate::TransitionCounts;
use crate::config::ChainConfig;
use crate::estimator::{Estimator, StateRegistry, TransitionModel};
use crate::event::Event;
use crate::feed::{EventSource, MatchFeed, StatsBombFeed};
use crate::segmentation::{MatchTransitions, Segmenter};
use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which states index the estimated matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryScope {
    /// Only states seen in the counts, sorted
    #[default]
    Observed,
    /// The whole state space of the configured schema
    Full,
}

/// Builds possession chains and their transition model
#[derive(Debug, Clone)]
pub struct ChainAnalyzer {
    config: ChainConfig,
    segmenter: Segmenter,
    estimator: Estimator,
}

impl ChainAnalyzer {
    /// Create an analyzer, rejecting invalid configurations up front
    ///
    /// # Example
    /// ```no_run
    /// use possession_markov::{ChainAnalyzer, ChainConfig};
    ///
    /// let config = ChainConfig::new().with_reference_team(217);
    /// let analyzer = ChainAnalyzer::new(config).unwrap();
    /// let result = analyzer.analyze_file(std::path::Path::new("3773386.json")).unwrap();
    /// println!("{} edges", result.stats.edges);
    /// ```
    pub fn new(config: ChainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            segmenter: Segmenter::new(&config),
            estimator: Estimator::from_config(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Segment one match's events
    pub fn analyze_events(&self, events: &[Event]) -> MatchTransitions {
        self.segmenter.segment(events)
    }

    /// Segment a loaded match
    pub fn analyze_match(&self, feed: &MatchFeed) -> MatchTransitions {
        if let Some(team) = self.config.reference_team {
            if !feed.involves(team) {
                log::warn!("Reference team {} does not appear in match {}", team, feed.label());
            }
        }
        let result = self.segmenter.segment(&feed.events);
        log::debug!(
            "Match {}: {} events, {} transitions",
            feed.label(),
            result.stats.events,
            result.transitions.total()
        );
        result
    }

    /// Load a match from `source` and segment it
    pub fn load_and_analyze(&self, source: &dyn EventSource, path: &Path) -> Result<MatchTransitions> {
        let feed = source.load_match(path)?;
        Ok(self.analyze_match(&feed))
    }

    /// Load a StatsBomb match file and segment it
    pub fn analyze_file(&self, path: &Path) -> Result<MatchTransitions> {
        self.load_and_analyze(&StatsBombFeed::new(), path)
    }

    /// Sum per-match results
    pub fn aggregate<'a>(&self, matches: impl IntoIterator<Item = &'a MatchTransitions>) -> MatchTransitions {
        let mut total = MatchTransitions::default();
        let mut count = 0usize;
        for m in matches {
            total.merge(m);
            count += 1;
        }
        log::info!(
            "Aggregated {} matches: {} transitions over {} distinct edges",
            count,
            total.transitions.total(),
            total.transitions.len()
        );
        total
    }

    /// State registry for the counts under the configured schema
    pub fn registry(&self, counts: &TransitionCounts, scope: RegistryScope) -> StateRegistry {
        match scope {
            RegistryScope::Observed => StateRegistry::observed(counts),
            RegistryScope::Full => {
                StateRegistry::full(self.config.zone_granularity, self.config.include_situation)
            }
        }
    }

    /// Estimate the smoothed transition model
    pub fn estimate(&self, counts: &TransitionCounts, scope: RegistryScope) -> TransitionModel {
        self.estimator.estimate(counts, self.registry(counts, scope))
    }
}
