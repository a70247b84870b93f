//! Typed match events
//!
//! The feed's free-text vocabulary (event type names, pass types, duel types,
//! outcome labels) is turned into closed enums once, when a feed is read.
//! Everything downstream matches on these enums and never inspects strings.

use crate::types::{Location, OrderKey, TeamId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single match event, already deserialized and typed
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Feed-assigned event identifier (referenced by `related_events`)
    pub id: Option<String>,
    /// Position of the event in the match
    pub order: OrderKey,
    /// What happened, with the type-specific payload
    pub kind: EventKind,
    /// Team performing the action
    pub team: Option<TeamId>,
    /// Team owning the current possession sequence
    pub possession_team: Option<TeamId>,
    /// Where the event happened
    pub location: Option<Location>,
    /// Actor was under pressure
    pub under_pressure: bool,
    /// Ball went out of play as a result of the event
    pub out: bool,
    /// Identifiers of events linked to this one
    pub related_events: Vec<String>,
}

/// Event type with its type-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Pass(PassDetail),
    BallReceipt { outcome: Option<Outcome> },
    Carry,
    Shot { outcome: Option<Outcome> },
    Dispossessed,
    Miscontrol,
    Dribble { outcome: Option<Outcome> },
    Interception { outcome: Option<Outcome> },
    Duel {
        duel_type: Option<DuelType>,
        outcome: Option<Outcome>,
    },
    BallRecovery,
    FiftyFifty { outcome: Option<Outcome> },
    Goalkeeper { action: Option<GoalkeeperAction> },
    Clearance,
    FoulWon,
    OwnGoalFor,
    /// Dead-ball event that interrupts play
    Stoppage(Stoppage),
    /// Any event type the chain builder has no rule for
    Other(String),
}

/// Pass payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PassDetail {
    pub pass_type: Option<PassType>,
    /// Absent for completed passes
    pub outcome: Option<Outcome>,
}

/// Pass sub-types the chain builder distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PassType {
    FreeKick,
    Corner,
    ThrowIn,
    GoalKick,
    KickOff,
    Interception,
    Recovery,
    Other(String),
}

impl PassType {
    pub fn from_label(label: &str) -> Self {
        match normalize(label).as_str() {
            "free kick" => PassType::FreeKick,
            "corner" => PassType::Corner,
            "throw-in" => PassType::ThrowIn,
            "goal kick" => PassType::GoalKick,
            "kick off" => PassType::KickOff,
            "interception" => PassType::Interception,
            "recovery" => PassType::Recovery,
            _ => PassType::Other(label.to_string()),
        }
    }

    /// The dead-ball restart this pass type represents, if any
    pub fn restart(&self) -> Option<Restart> {
        match self {
            PassType::FreeKick => Some(Restart::FreeKick),
            PassType::Corner => Some(Restart::Corner),
            PassType::ThrowIn => Some(Restart::ThrowIn),
            PassType::GoalKick => Some(Restart::GoalKick),
            PassType::KickOff => Some(Restart::KickOff),
            _ => None,
        }
    }
}

/// Dead-ball restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Restart {
    ThrowIn,
    GoalKick,
    Corner,
    FreeKick,
    KickOff,
}

/// Events that stop play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stoppage {
    FoulCommitted,
    BallOut,
    Offside,
    HalfEnd,
    PeriodEnd,
    InjuryStoppage,
    RefereeBallDrop,
    Substitution,
}

impl Stoppage {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Foul Committed" => Some(Stoppage::FoulCommitted),
            "Out" => Some(Stoppage::BallOut),
            "Offside" => Some(Stoppage::Offside),
            "Half End" => Some(Stoppage::HalfEnd),
            "Period End" => Some(Stoppage::PeriodEnd),
            "Injury Stoppage" => Some(Stoppage::InjuryStoppage),
            "Referee Ball-Drop" => Some(Stoppage::RefereeBallDrop),
            "Substitution" => Some(Stoppage::Substitution),
            _ => None,
        }
    }
}

/// Duel sub-types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DuelType {
    Tackle,
    Aerial,
    AerialLost,
    FiftyFifty,
    Other(String),
}

impl DuelType {
    pub fn from_label(label: &str) -> Self {
        match normalize(label).as_str() {
            "tackle" => DuelType::Tackle,
            "aerial" => DuelType::Aerial,
            "aerial lost" => DuelType::AerialLost,
            "50/50" => DuelType::FiftyFifty,
            _ => DuelType::Other(label.to_string()),
        }
    }
}

/// Goalkeeper actions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GoalkeeperAction {
    Save,
    Claim,
    Punch,
    Smother,
    Other(String),
}

impl GoalkeeperAction {
    pub fn from_label(label: &str) -> Self {
        match normalize(label).as_str() {
            "save" | "shot saved" => GoalkeeperAction::Save,
            "claim" | "collected" => GoalkeeperAction::Claim,
            "punch" => GoalkeeperAction::Punch,
            "smother" => GoalkeeperAction::Smother,
            _ => GoalkeeperAction::Other(label.to_string()),
        }
    }
}

/// Outcome labels used by the feed across event types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    Won,
    Success,
    SuccessInPlay,
    SuccessOut,
    SuccessToTeam,
    SuccessToOpposition,
    Lost,
    LostInPlay,
    LostOut,
    Complete,
    Incomplete,
    Out,
    PassOffside,
    Unknown,
    InjuryClearance,
    Goal,
    Saved,
    Blocked,
    OffTarget,
    Post,
    Wayward,
    /// Unrecognized label, kept verbatim
    Other(String),
}

impl Outcome {
    pub fn from_label(label: &str) -> Self {
        match normalize(label).as_str() {
            "won" => Outcome::Won,
            "success" => Outcome::Success,
            "success in play" => Outcome::SuccessInPlay,
            "success out" => Outcome::SuccessOut,
            "success to team" => Outcome::SuccessToTeam,
            "success to opposition" => Outcome::SuccessToOpposition,
            "lost" => Outcome::Lost,
            "lost in play" => Outcome::LostInPlay,
            "lost out" => Outcome::LostOut,
            "complete" => Outcome::Complete,
            "incomplete" => Outcome::Incomplete,
            "out" => Outcome::Out,
            "pass offside" | "offside" => Outcome::PassOffside,
            "unknown" => Outcome::Unknown,
            "injury clearance" => Outcome::InjuryClearance,
            "goal" => Outcome::Goal,
            "saved" => Outcome::Saved,
            "blocked" => Outcome::Blocked,
            "off t" | "off target" => Outcome::OffTarget,
            "post" => Outcome::Post,
            "wayward" => Outcome::Wayward,
            _ => Outcome::Other(label.to_string()),
        }
    }

    /// Whether the outcome reads as a success for the acting team
    ///
    /// Known labels are classified explicitly. Unknown labels fall back to a
    /// case-insensitive search for `success`, `won`, `wins` or `successful`.
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Won
            | Outcome::Success
            | Outcome::SuccessInPlay
            | Outcome::SuccessOut
            | Outcome::SuccessToTeam
            | Outcome::SuccessToOpposition => true,
            Outcome::Other(label) => {
                let label = label.to_lowercase();
                ["success", "won", "wins", "successful"]
                    .iter()
                    .any(|token| label.contains(token))
            }
            _ => false,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        match self {
            Outcome::Incomplete => true,
            Outcome::Other(label) => label.to_lowercase().contains("incomplete"),
            _ => false,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Other(label) => write!(f, "{}", label),
            other => write!(f, "{:?}", other),
        }
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

impl Event {
    /// Create an event of the given kind with no team, location or flags
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: None,
            order: OrderKey::default(),
            kind,
            team: None,
            possession_team: None,
            location: None,
            under_pressure: false,
            out: false,
            related_events: Vec::new(),
        }
    }

    /// Builder method: set acting and possession teams
    pub fn with_teams(mut self, team: TeamId, possession_team: TeamId) -> Self {
        self.team = Some(team);
        self.possession_team = Some(possession_team);
        self
    }

    /// Builder method: set location
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.location = Some(Location::new(x, y));
        self
    }

    /// Builder method: set the ordering key
    pub fn with_order(mut self, order: OrderKey) -> Self {
        self.order = order;
        self
    }

    /// Builder method: set the event identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: link related events
    pub fn with_related(mut self, ids: Vec<String>) -> Self {
        self.related_events = ids;
        self
    }

    /// Builder method: mark as under pressure
    pub fn under_pressure(mut self) -> Self {
        self.under_pressure = true;
        self
    }

    /// Builder method: mark as having gone out of play
    pub fn went_out(mut self) -> Self {
        self.out = true;
        self
    }

    pub fn is_stoppage(&self) -> bool {
        matches!(self.kind, EventKind::Stoppage(_))
    }

    /// Restart represented by this event (restart-typed passes only)
    pub fn restart(&self) -> Option<Restart> {
        match &self.kind {
            EventKind::Pass(PassDetail {
                pass_type: Some(pass_type),
                ..
            }) => pass_type.restart(),
            _ => None,
        }
    }

    /// Team credited with a goal by this event, if any
    pub fn goal_for(&self) -> Option<TeamId> {
        match &self.kind {
            EventKind::Shot {
                outcome: Some(Outcome::Goal),
            }
            | EventKind::OwnGoalFor => self.team,
            _ => None,
        }
    }

    pub fn is_offside(&self) -> bool {
        match &self.kind {
            EventKind::Stoppage(Stoppage::Offside) => true,
            EventKind::Pass(detail) => detail.outcome == Some(Outcome::PassOffside),
            _ => false,
        }
    }

    pub fn is_successful_tackle(&self) -> bool {
        matches!(
            &self.kind,
            EventKind::Duel {
                duel_type: Some(DuelType::Tackle),
                outcome: Some(outcome),
            } if outcome.is_success()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success_vocabulary() {
        assert!(Outcome::from_label("Won").is_success());
        assert!(Outcome::from_label("Success In Play").is_success());
        assert!(Outcome::from_label("success out").is_success());
        assert!(!Outcome::from_label("Lost In Play").is_success());
        assert!(!Outcome::from_label("Incomplete").is_success());

        // Unknown labels use the substring fallback
        assert!(Outcome::from_label("Team Wins Ball").is_success());
        assert!(Outcome::from_label("Was SUCCESSFUL").is_success());
        assert!(!Outcome::from_label("Neutral").is_success());
    }

    #[test]
    fn test_outcome_incomplete() {
        assert!(Outcome::from_label("Incomplete").is_incomplete());
        assert!(Outcome::from_label("Dribble incomplete").is_incomplete());
        assert!(!Outcome::from_label("Complete").is_incomplete());
    }

    #[test]
    fn test_restart_pass_types() {
        assert_eq!(PassType::from_label("Throw-in").restart(), Some(Restart::ThrowIn));
        assert_eq!(PassType::from_label("Kick Off").restart(), Some(Restart::KickOff));
        assert_eq!(PassType::from_label("Interception").restart(), None);
        assert_eq!(PassType::from_label("Recovery").restart(), None);
    }

    #[test]
    fn test_stoppage_vocabulary() {
        assert_eq!(Stoppage::from_type_name("Out"), Some(Stoppage::BallOut));
        assert_eq!(
            Stoppage::from_type_name("Referee Ball-Drop"),
            Some(Stoppage::RefereeBallDrop)
        );
        assert_eq!(Stoppage::from_type_name("Pass"), None);
    }

    #[test]
    fn test_goal_credit() {
        let goal = Event::new(EventKind::Shot { outcome: Some(Outcome::Goal) }).with_teams(7, 7);
        assert_eq!(goal.goal_for(), Some(7));

        let saved = Event::new(EventKind::Shot { outcome: Some(Outcome::Saved) }).with_teams(7, 7);
        assert_eq!(saved.goal_for(), None);

        let own_goal = Event::new(EventKind::OwnGoalFor).with_teams(3, 9);
        assert_eq!(own_goal.goal_for(), Some(3));
    }

    #[test]
    fn test_offside_detection() {
        let stoppage = Event::new(EventKind::Stoppage(Stoppage::Offside));
        assert!(stoppage.is_offside());

        let pass = Event::new(EventKind::Pass(PassDetail {
            pass_type: None,
            outcome: Some(Outcome::from_label("Pass Offside")),
        }));
        assert!(pass.is_offside());
    }
}
