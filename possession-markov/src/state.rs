//! Discrete chain states
//!
//! A state is `(side, zone, action[, situation])`. States are small `Copy`
//! values; their string key joins the field codes with `_` in that order,
//! e.g. `P_M_PASS`, `S_A_SHOT_FAV` or `P_D-L_LOSS` on the 3x3 grid.

use crate::config::ZoneGranularity;
use serde::{Serialize, Serializer};
use std::fmt;

/// Whose perspective a state is recorded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Possessor,
    NonPossessor,
}

impl Side {
    pub fn code(&self) -> &'static str {
        match self {
            Side::Possessor => "P",
            Side::NonPossessor => "S",
        }
    }
}

/// Length-wise third of the pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Third {
    Defensive,
    Middle,
    Attacking,
}

impl Third {
    pub const ALL: [Third; 3] = [Third::Defensive, Third::Middle, Third::Attacking];

    pub fn code(&self) -> &'static str {
        match self {
            Third::Defensive => "D",
            Third::Middle => "M",
            Third::Attacking => "A",
        }
    }
}

/// Width-wise lane of the pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lane {
    Left,
    Center,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    pub fn code(&self) -> &'static str {
        match self {
            Lane::Left => "L",
            Lane::Center => "C",
            Lane::Right => "R",
        }
    }
}

/// A pitch zone: a third, optionally refined by a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Zone {
    pub third: Third,
    pub lane: Option<Lane>,
}

impl Zone {
    pub fn third(third: Third) -> Self {
        Self { third, lane: None }
    }

    pub fn cell(third: Third, lane: Lane) -> Self {
        Self {
            third,
            lane: Some(lane),
        }
    }

    /// Every zone of the given granularity, in stable order
    pub fn all(granularity: ZoneGranularity) -> Vec<Zone> {
        match granularity {
            ZoneGranularity::Thirds => Third::ALL.iter().map(|t| Zone::third(*t)).collect(),
            ZoneGranularity::Grid => Third::ALL
                .iter()
                .flat_map(|t| Lane::ALL.iter().map(move |l| Zone::cell(*t, *l)))
                .collect(),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lane {
            Some(lane) => write!(f, "{}-{}", self.third.code(), lane.code()),
            None => write!(f, "{}", self.third.code()),
        }
    }
}

/// What happened in a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Pass,
    Shot,
    Loss,
    Recovery,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Pass, Action::Shot, Action::Loss, Action::Recovery];

    pub fn code(&self) -> &'static str {
        match self {
            Action::Pass => "PASS",
            Action::Shot => "SHOT",
            Action::Loss => "LOSS",
            Action::Recovery => "RECOVERY",
        }
    }
}

/// Scoreline context relative to the acting team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Situation {
    Favorable,
    Neutral,
    Unfavorable,
}

impl Situation {
    pub const ALL: [Situation; 3] = [
        Situation::Favorable,
        Situation::Neutral,
        Situation::Unfavorable,
    ];

    pub fn from_score(own_goals: u32, opponent_goals: u32) -> Self {
        match own_goals.cmp(&opponent_goals) {
            std::cmp::Ordering::Greater => Situation::Favorable,
            std::cmp::Ordering::Less => Situation::Unfavorable,
            std::cmp::Ordering::Equal => Situation::Neutral,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Situation::Favorable => "FAV",
            Situation::Neutral => "NEU",
            Situation::Unfavorable => "UNF",
        }
    }
}

/// A discrete chain state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    pub side: Side,
    pub zone: Zone,
    pub action: Action,
    pub situation: Option<Situation>,
}

impl State {
    pub fn new(side: Side, zone: Zone, action: Action) -> Self {
        Self {
            side,
            zone,
            action,
            situation: None,
        }
    }

    pub fn with_situation(mut self, situation: Situation) -> Self {
        self.situation = Some(situation);
        self
    }

    /// Same state with a different action
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Stable string key, e.g. `P_M_PASS_NEU`
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// The complete state space for a schema, in stable order
    pub fn enumerate(granularity: ZoneGranularity, include_situation: bool) -> Vec<State> {
        let mut states = Vec::new();
        for side in [Side::Possessor, Side::NonPossessor] {
            for zone in Zone::all(granularity) {
                for action in Action::ALL {
                    let base = State::new(side, zone, action);
                    if include_situation {
                        states.extend(Situation::ALL.iter().map(|s| base.with_situation(*s)));
                    } else {
                        states.push(base);
                    }
                }
            }
        }
        states
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.side.code(), self.zone, self.action.code())?;
        if let Some(situation) = self.situation {
            write!(f, "_{}", situation.code())?;
        }
        Ok(())
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Zero, one or two items produced from a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fanout<T> {
    #[default]
    Empty,
    One(T),
    Two(T, T),
}

impl<T: Copy> Fanout<T> {
    pub fn len(&self) -> usize {
        match self {
            Fanout::Empty => 0,
            Fanout::One(_) => 1,
            Fanout::Two(_, _) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Fanout::Empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = T> {
        let (first, second) = match *self {
            Fanout::Empty => (None, None),
            Fanout::One(a) => (Some(a), None),
            Fanout::Two(a, b) => (Some(a), Some(b)),
        };
        first.into_iter().chain(second)
    }

    pub fn map<U: Copy>(self, f: impl Fn(T) -> U) -> Fanout<U> {
        match self {
            Fanout::Empty => Fanout::Empty,
            Fanout::One(a) => Fanout::One(f(a)),
            Fanout::Two(a, b) => Fanout::Two(f(a), f(b)),
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_keys() {
        let state = State::new(Side::Possessor, Zone::third(Third::Middle), Action::Pass);
        assert_eq!(state.key(), "P_M_PASS");

        let state = State::new(Side::NonPossessor, Zone::third(Third::Attacking), Action::Shot)
            .with_situation(Situation::Favorable);
        assert_eq!(state.key(), "S_A_SHOT_FAV");

        let state = State::new(
            Side::Possessor,
            Zone::cell(Third::Defensive, Lane::Left),
            Action::Loss,
        );
        assert_eq!(state.key(), "P_D-L_LOSS");
    }

    #[test]
    fn test_state_equality_covers_all_fields() {
        let base = State::new(Side::Possessor, Zone::third(Third::Middle), Action::Pass);
        assert_eq!(base, base.with_action(Action::Pass));
        assert_ne!(base, base.with_action(Action::Loss));
        assert_ne!(base, base.with_situation(Situation::Neutral));
    }

    #[test]
    fn test_situation_from_score() {
        assert_eq!(Situation::from_score(2, 1), Situation::Favorable);
        assert_eq!(Situation::from_score(1, 1), Situation::Neutral);
        assert_eq!(Situation::from_score(0, 3), Situation::Unfavorable);
    }

    #[test]
    fn test_enumerate_state_space() {
        assert_eq!(State::enumerate(ZoneGranularity::Thirds, false).len(), 2 * 3 * 4);
        assert_eq!(State::enumerate(ZoneGranularity::Grid, false).len(), 2 * 9 * 4);
        assert_eq!(State::enumerate(ZoneGranularity::Thirds, true).len(), 2 * 3 * 4 * 3);
    }

    #[test]
    fn test_fanout() {
        let empty: Fanout<u8> = Fanout::Empty;
        assert!(empty.is_empty());
        assert_eq!(empty.to_vec(), Vec::<u8>::new());

        let two = Fanout::Two(1u8, 2u8);
        assert_eq!(two.len(), 2);
        assert_eq!(two.map(|v| v * 10).to_vec(), vec![10, 20]);
    }
}
