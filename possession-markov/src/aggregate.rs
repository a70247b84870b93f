//! Transition counts, aggregation and row normalization
//!
//! Counts are kept in ordered maps so that folding per-match results gives
//! the same aggregate, iteration order included, whatever order the matches
//! are merged in.

use crate::flip::FlipCause;
use crate::state::State;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An ordered pair of states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition {
    pub from: State,
    pub to: State,
}

impl Transition {
    pub fn new(from: State, to: State) -> Self {
        Self { from, to }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Endpoints are recorded on different sides
    pub fn crosses_sides(&self) -> bool {
        self.from.side != self.to.side
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Multiset of transitions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionCounts {
    counts: BTreeMap<Transition, u64>,
}

impl TransitionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of a transition
    pub fn record(&mut self, transition: Transition) {
        self.add(transition, 1);
    }

    /// Count `count` occurrences of a transition
    pub fn add(&mut self, transition: Transition, count: u64) {
        if count > 0 {
            *self.counts.entry(transition).or_insert(0) += count;
        }
    }

    /// Count for a pair, zero if never observed
    pub fn get(&self, from: &State, to: &State) -> u64 {
        self.counts
            .get(&Transition::new(*from, *to))
            .copied()
            .unwrap_or(0)
    }

    pub fn contains(&self, from: &State, to: &State) -> bool {
        self.get(from, to) > 0
    }

    /// Number of distinct transitions
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Transition, u64)> {
        self.counts.iter().map(|(t, c)| (t, *c))
    }

    /// Add every count of `other` into this multiset
    pub fn merge(&mut self, other: &TransitionCounts) {
        for (transition, count) in other.iter() {
            self.add(*transition, count);
        }
    }

    /// Sum many per-match multisets into one
    pub fn fold<'a>(parts: impl IntoIterator<Item = &'a TransitionCounts>) -> Self {
        let mut total = TransitionCounts::new();
        for part in parts {
            total.merge(part);
        }
        total
    }

    /// Outgoing count per from-state
    pub fn row_totals(&self) -> BTreeMap<State, u64> {
        let mut totals = BTreeMap::new();
        for (transition, count) in self.iter() {
            *totals.entry(transition.from).or_insert(0) += count;
        }
        totals
    }

    /// Every state appearing as either endpoint
    pub fn states(&self) -> BTreeSet<State> {
        self.counts
            .keys()
            .flat_map(|t| [t.from, t.to])
            .collect()
    }

    /// Row-normalized probabilities; rows without observations are absent
    pub fn probabilities(&self) -> TransitionProbabilities {
        let totals = self.row_totals();
        let probs = self
            .iter()
            .filter_map(|(transition, count)| {
                let total = totals.get(&transition.from).copied().unwrap_or(0);
                (total > 0).then(|| (*transition, count as f64 / total as f64))
            })
            .collect();
        TransitionProbabilities { probs }
    }

    /// Transitions by descending count, ties broken by state order
    pub fn sorted_by_count(&self) -> Vec<(Transition, u64)> {
        let mut rows: Vec<(Transition, u64)> = self.iter().map(|(t, c)| (*t, c)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }
}

impl FromIterator<Transition> for TransitionCounts {
    fn from_iter<I: IntoIterator<Item = Transition>>(iter: I) -> Self {
        let mut counts = TransitionCounts::new();
        for transition in iter {
            counts.record(transition);
        }
        counts
    }
}

/// Row-normalized transition probabilities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionProbabilities {
    probs: BTreeMap<Transition, f64>,
}

impl TransitionProbabilities {
    pub fn get(&self, from: &State, to: &State) -> Option<f64> {
        self.probs.get(&Transition::new(*from, *to)).copied()
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Transition, f64)> {
        self.probs.iter().map(|(t, p)| (t, *p))
    }

    /// Probability mass per from-state
    pub fn row_sums(&self) -> BTreeMap<State, f64> {
        let mut sums = BTreeMap::new();
        for (transition, p) in self.iter() {
            *sums.entry(transition.from).or_insert(0.0) += p;
        }
        sums
    }

    /// Transitions by descending probability, ties broken by state order
    pub fn sorted_by_probability(&self) -> Vec<(Transition, f64)> {
        let mut rows: Vec<(Transition, f64)> = self.iter().map(|(t, p)| (*t, p)).collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }
}

/// A flip transition together with its cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlipKey {
    pub transition: Transition,
    pub cause: FlipCause,
}

/// Flip transitions broken down by cause
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlipCounts {
    counts: BTreeMap<FlipKey, u64>,
}

impl FlipCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, transition: Transition, cause: FlipCause) {
        *self.counts.entry(FlipKey { transition, cause }).or_insert(0) += 1;
    }

    pub fn get(&self, transition: &Transition, cause: FlipCause) -> u64 {
        self.counts
            .get(&FlipKey {
                transition: *transition,
                cause,
            })
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlipKey, u64)> {
        self.counts.iter().map(|(k, c)| (k, *c))
    }

    pub fn merge(&mut self, other: &FlipCounts) {
        for (key, count) in other.iter() {
            *self.counts.entry(*key).or_insert(0) += count;
        }
    }

    /// Total flips per cause
    pub fn by_cause(&self) -> BTreeMap<FlipCause, u64> {
        let mut totals = BTreeMap::new();
        for (key, count) in self.iter() {
            *totals.entry(key.cause).or_insert(0) += count;
        }
        totals
    }

    /// Flips that did not start from a restart
    pub fn open_play(&self) -> impl Iterator<Item = (&FlipKey, u64)> {
        self.iter().filter(|(key, _)| !key.cause.is_restart())
    }
}
