//! Smoothed transition matrix estimation
//!
//! A [`StateRegistry`] fixes the row/column order. The [`Estimator`] turns
//! aggregated counts into a dense count matrix `C` and a row-stochastic
//! matrix `P` with additive smoothing:
//!
//! ```text
//! P[i,j] = (C[i,j] + alpha) / (sum_j C[i,j] + alpha * N)
//! ```
//!
//! Rows with no observations are exactly uniform. The attack/defense block
//! view slices `P` by side without touching its values.

use crate::aggregate::TransitionCounts;
use crate::config::{ChainConfig, ZoneGranularity};
use crate::state::{Side, State};
use crate::types::{ChainError, Result};
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Floor applied to probabilities before taking logarithms
const MIN_PROBABILITY: f64 = 1e-12;

/// Stable state <-> index mapping used for matrix rows and columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateRegistry {
    states: Vec<State>,
    index: HashMap<State, usize>,
}

impl StateRegistry {
    /// Registry over the given states, first occurrence wins
    pub fn from_states(states: impl IntoIterator<Item = State>) -> Self {
        let mut registry = Self::default();
        for state in states {
            if !registry.index.contains_key(&state) {
                registry.index.insert(state, registry.states.len());
                registry.states.push(state);
            }
        }
        registry
    }

    /// Sorted unique states observed as either endpoint of a transition
    pub fn observed(counts: &TransitionCounts) -> Self {
        Self::from_states(counts.states())
    }

    /// The complete state space of a schema
    pub fn full(granularity: ZoneGranularity, include_situation: bool) -> Self {
        Self::from_states(State::enumerate(granularity, include_situation))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn id_of(&self, state: &State) -> Option<usize> {
        self.index.get(state).copied()
    }

    pub fn state(&self, id: usize) -> Option<&State> {
        self.states.get(id)
    }

    /// Ids of every state on the given side, ascending
    pub fn ids_on(&self, side: Side) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.side == side)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Builds smoothed transition models from counts
#[derive(Debug, Clone, Copy)]
pub struct Estimator {
    alpha: f64,
}

impl Estimator {
    /// Create an estimator; alpha must be finite and non-negative
    pub fn new(alpha: f64) -> Result<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ChainError::InvalidSmoothing(alpha));
        }
        Ok(Self { alpha })
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        Self::new(config.smoothing_alpha)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Estimate `P` over `registry` from aggregated counts
    ///
    /// Transitions touching a state outside the registry are ignored.
    pub fn estimate(&self, counts: &TransitionCounts, registry: StateRegistry) -> TransitionModel {
        let n = registry.len();
        let mut count_matrix = DMatrix::<f64>::zeros(n, n);
        let mut skipped = 0u64;

        for (transition, count) in counts.iter() {
            match (registry.id_of(&transition.from), registry.id_of(&transition.to)) {
                (Some(i), Some(j)) => count_matrix[(i, j)] += count as f64,
                _ => skipped += count,
            }
        }
        if skipped > 0 {
            log::warn!("{} transitions fall outside the state registry and were ignored", skipped);
        }

        let probabilities = self.smooth(&count_matrix);
        log::info!(
            "Estimated {}x{} transition matrix (alpha = {})",
            n,
            n,
            self.alpha
        );

        TransitionModel {
            registry,
            counts: count_matrix,
            probabilities,
            alpha: self.alpha,
        }
    }

    fn smooth(&self, counts: &DMatrix<f64>) -> DMatrix<f64> {
        let n = counts.nrows();
        let uniform = if n > 0 { 1.0 / n as f64 } else { 0.0 };
        let mut p = DMatrix::<f64>::zeros(n, n);

        for i in 0..n {
            let total: f64 = counts.row(i).sum();
            if total == 0.0 {
                p.row_mut(i).fill(uniform);
                continue;
            }
            let denom = total + self.alpha * n as f64;
            for j in 0..n {
                p[(i, j)] = (counts[(i, j)] + self.alpha) / denom;
            }
        }
        p
    }
}

/// Dense count and probability matrices over a fixed registry
#[derive(Debug, Clone)]
pub struct TransitionModel {
    registry: StateRegistry,
    counts: DMatrix<f64>,
    probabilities: DMatrix<f64>,
    alpha: f64,
}

impl TransitionModel {
    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn count_matrix(&self) -> &DMatrix<f64> {
        &self.counts
    }

    /// Row-stochastic smoothed matrix
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.probabilities
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn probability(&self, from: &State, to: &State) -> Option<f64> {
        let i = self.registry.id_of(from)?;
        let j = self.registry.id_of(to)?;
        Some(self.probabilities[(i, j)])
    }

    /// Whether the state's row had any observation before smoothing
    pub fn is_observed(&self, state: &State) -> bool {
        self.registry
            .id_of(state)
            .is_some_and(|i| self.counts.row(i).sum() > 0.0)
    }

    /// Total number of transitions counted into the matrix
    pub fn total_count(&self) -> f64 {
        self.counts.sum()
    }

    /// Log-likelihood of the counted transitions under `P`
    pub fn log_likelihood(&self) -> f64 {
        self.counts
            .iter()
            .zip(self.probabilities.iter())
            .filter(|(c, _)| **c > 0.0)
            .map(|(c, p)| c * p.max(MIN_PROBABILITY).ln())
            .sum()
    }

    /// `exp(-LL / total)`, `None` without any counted transition
    pub fn perplexity(&self) -> Option<f64> {
        let total = self.total_count();
        (total > 0.0).then(|| (-self.log_likelihood() / total).exp())
    }

    /// Split `P` into attack/defense sub-blocks
    pub fn blocks(&self) -> BlockDecomposition {
        BlockDecomposition::new(&self.registry, &self.probabilities)
    }
}

/// `P` viewed as attack (Possessor) and defense (NonPossessor) blocks
#[derive(Debug, Clone)]
pub struct BlockDecomposition {
    pub attack: Vec<usize>,
    pub defense: Vec<usize>,
    pub attack_attack: DMatrix<f64>,
    pub attack_defense: DMatrix<f64>,
    pub defense_attack: DMatrix<f64>,
    pub defense_defense: DMatrix<f64>,
}

impl BlockDecomposition {
    pub fn new(registry: &StateRegistry, p: &DMatrix<f64>) -> Self {
        let attack = registry.ids_on(Side::Possessor);
        let defense = registry.ids_on(Side::NonPossessor);

        let block = |rows: &[usize], cols: &[usize]| p.select_rows(rows.iter()).select_columns(cols.iter());

        Self {
            attack_attack: block(&attack, &attack),
            attack_defense: block(&attack, &defense),
            defense_attack: block(&defense, &attack),
            defense_defense: block(&defense, &defense),
            attack,
            defense,
        }
    }
}
