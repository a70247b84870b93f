//! Chain segmentation over one match's event stream
//!
//! The segmenter walks the ordered events once, keeping a cursor on the last
//! emitted state. Every state produced by an event is linked to the cursor,
//! subject to two policies:
//!
//! - `cut_on_stop`: stoppages clear the cursor, so nothing links across a
//!   dead ball. The next restart (or first live event) opens a new chain.
//! - `coerce_turnovers`: when the possession-owning team changes in live play
//!   the pair is forced to read `LOSS -> RECOVERY`, keeping `SHOT` intact.
//!
//! With `treat_shot_as_terminal` nothing links out of a `SHOT` state, and
//! with `include_ball_receipts` off ball receipts are dropped before any
//! state is composed.
//!
//! Flip transitions (acting team changed between the two linked events) are
//! also tagged with a cause for the per-cause breakdown.

use crate::aggregate::{FlipCounts, Transition, TransitionCounts};
use crate::classify::StateComposer;
use crate::config::ChainConfig;
use crate::event::{Event, EventKind};
use crate::flip::{classify_flip, is_flip, EventIndex, RelatedEvents};
use crate::state::{Action, Situation, State};
use crate::types::TeamId;
use serde::Serialize;
use std::collections::HashMap;

/// Bookkeeping counters for one segmentation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentStats {
    /// Events seen, stoppages included
    pub events: u64,
    pub stoppages: u64,
    pub restarts: u64,
    /// Events that produced no state (unknown side, zone or action)
    pub stateless_events: u64,
    pub coerced_turnovers: u64,
    /// Ball receipts dropped from the chains
    pub skipped_receipts: u64,
    /// Links out of a shot left unrecorded
    pub terminal_shots: u64,
    /// Transitions emitted
    pub edges: u64,
    pub flips: u64,
    /// Whether the input had to be re-sorted
    pub reordered: bool,
}

impl SegmentStats {
    /// Add another run's counters into these
    pub fn merge(&mut self, other: &SegmentStats) {
        self.events += other.events;
        self.stoppages += other.stoppages;
        self.restarts += other.restarts;
        self.stateless_events += other.stateless_events;
        self.coerced_turnovers += other.coerced_turnovers;
        self.skipped_receipts += other.skipped_receipts;
        self.terminal_shots += other.terminal_shots;
        self.edges += other.edges;
        self.flips += other.flips;
        self.reordered |= other.reordered;
    }
}

/// Everything segmentation extracts from one match
#[derive(Debug, Clone, Default)]
pub struct MatchTransitions {
    pub transitions: TransitionCounts,
    pub flips: FlipCounts,
    pub stats: SegmentStats,
}

impl MatchTransitions {
    /// Add another match's results into this one
    pub fn merge(&mut self, other: &MatchTransitions) {
        self.transitions.merge(&other.transitions);
        self.flips.merge(&other.flips);
        self.stats.merge(&other.stats);
    }
}

/// Running goal tally used for the scoreline situation
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    goals: HashMap<TeamId, u32>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit the goal carried by `event`, if any
    pub fn record(&mut self, event: &Event) {
        if let Some(team) = event.goal_for() {
            *self.goals.entry(team).or_insert(0) += 1;
        }
    }

    pub fn goals(&self, team: TeamId) -> u32 {
        self.goals.get(&team).copied().unwrap_or(0)
    }

    /// Scoreline from `team`'s point of view; every other team counts against it
    pub fn situation_for(&self, team: TeamId) -> Situation {
        let own = self.goals(team);
        let against = self
            .goals
            .iter()
            .filter(|(t, _)| **t != team)
            .map(|(_, g)| *g)
            .sum();
        Situation::from_score(own, against)
    }
}

/// Last emitted state and the event that produced it
#[derive(Debug, Clone, Copy)]
struct Cursor<'e> {
    state: State,
    event: &'e Event,
}

/// Turns one match's events into transitions
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    composer: StateComposer,
    cut_on_stop: bool,
    coerce_turnovers: bool,
    shot_terminal: bool,
    ball_receipts: bool,
}

impl Segmenter {
    pub fn new(config: &ChainConfig) -> Self {
        Self {
            composer: StateComposer::new(config),
            cut_on_stop: config.cut_on_stop,
            coerce_turnovers: config.coerce_turnovers,
            shot_terminal: config.treat_shot_as_terminal,
            ball_receipts: config.include_ball_receipts,
        }
    }

    /// Segment a match, resolving related events within the same slice
    pub fn segment(&self, events: &[Event]) -> MatchTransitions {
        let index = EventIndex::new(events);
        self.segment_with(events, &index)
    }

    /// Segment a match with an explicit related-event lookup
    pub fn segment_with(&self, events: &[Event], related: &dyn RelatedEvents) -> MatchTransitions {
        let (ordered, reordered) = order_events(events);

        let mut out = MatchTransitions::default();
        out.stats.reordered = reordered;

        let mut scoreboard = ScoreBoard::new();
        let mut cursor: Option<Cursor<'_>> = None;
        let mut live = false;
        let mut last_possession: Option<TeamId> = None;

        for &event in &ordered {
            out.stats.events += 1;
            scoreboard.record(event);

            if !self.ball_receipts && matches!(event.kind, EventKind::BallReceipt { .. }) {
                out.stats.skipped_receipts += 1;
                continue;
            }

            if event.is_stoppage() {
                out.stats.stoppages += 1;
                last_possession = event.possession_team;
                if self.cut_on_stop {
                    cursor = None;
                    live = false;
                }
                continue;
            }

            if event.restart().is_some() {
                out.stats.restarts += 1;
                if self.cut_on_stop {
                    cursor = None;
                }
                live = true;
            } else if !live {
                if self.cut_on_stop {
                    cursor = None;
                }
                live = true;
            }

            let situation = if self.composer.includes_situation() {
                event.team.map(|team| scoreboard.situation_for(team))
            } else {
                None
            };

            let states = self.composer.compose(event, situation);
            if states.is_empty() {
                log::trace!("No state for event at {}", event.order);
                out.stats.stateless_events += 1;
                continue;
            }

            for candidate in states.iter() {
                let mut candidate = candidate;
                let terminal =
                    self.shot_terminal && cursor.is_some_and(|prev| prev.state.action == Action::Shot);
                if terminal {
                    out.stats.terminal_shots += 1;
                } else if let Some(prev) = cursor.as_mut() {
                    let turnover = last_possession.is_some() && event.possession_team != last_possession;
                    if self.coerce_turnovers && turnover {
                        prev.state = coerce_from(prev.state);
                        candidate = coerce_to(candidate);
                        out.stats.coerced_turnovers += 1;
                    }

                    let transition = Transition::new(prev.state, candidate);
                    out.transitions.record(transition);
                    out.stats.edges += 1;

                    if is_flip(prev.event, event) {
                        out.flips.record(transition, classify_flip(prev.event, event, related));
                        out.stats.flips += 1;
                    }
                }
                cursor = Some(Cursor {
                    state: candidate,
                    event,
                });
                last_possession = event.possession_team;
            }
        }

        log::debug!(
            "Segmented {} events: {} edges, {} flips, {} stoppages, {} coerced turnovers, {} without state",
            out.stats.events,
            out.stats.edges,
            out.stats.flips,
            out.stats.stoppages,
            out.stats.coerced_turnovers,
            out.stats.stateless_events
        );

        out
    }
}

/// The losing side of a turnover reads `LOSS`, unless it was a shot
fn coerce_from(state: State) -> State {
    match state.action {
        Action::Loss | Action::Shot => state,
        _ => state.with_action(Action::Loss),
    }
}

/// The winning side of a turnover reads `RECOVERY`, unless it shot
fn coerce_to(state: State) -> State {
    match state.action {
        Action::Shot => state,
        _ => state.with_action(Action::Recovery),
    }
}

/// Events in match order; input already in order is used as is
fn order_events(events: &[Event]) -> (Vec<&Event>, bool) {
    let mut ordered: Vec<&Event> = events.iter().collect();
    let sorted = ordered.windows(2).all(|w| w[0].order <= w[1].order);
    if !sorted {
        log::debug!("Events out of order, sorting {} events", ordered.len());
        ordered.sort_by_key(|e| e.order);
    }
    (ordered, !sorted)
}
