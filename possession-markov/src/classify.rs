//! Event classification: zone, actions, side, and state composition
//!
//! Zones use half-open intervals; a coordinate on a boundary belongs to the
//! upper bucket. Actions come from an ordered rule table where the first rule
//! that recognizes the event type decides the outcome.

use crate::config::{ChainConfig, SideFraming, ZoneGranularity};
use crate::event::{DuelType, Event, EventKind, PassType};
use crate::state::{Action, Fanout, Lane, Side, Situation, State, Third, Zone};
use crate::types::{Location, TeamId};

/// Upper bounds of the defensive and middle thirds on the x axis
pub const THIRD_BOUNDS: [f64; 2] = [40.0, 80.0];

/// Upper bounds of the left and center lanes on the y axis
pub const LANE_BOUNDS: [f64; 2] = [80.0 / 3.0, 160.0 / 3.0];

/// Third for a length-wise coordinate, `None` if not a finite number
pub fn third_for_x(x: f64) -> Option<Third> {
    if !x.is_finite() {
        return None;
    }
    Some(if x < THIRD_BOUNDS[0] {
        Third::Defensive
    } else if x < THIRD_BOUNDS[1] {
        Third::Middle
    } else {
        Third::Attacking
    })
}

/// Lane for a width-wise coordinate, `None` if not a finite number
pub fn lane_for_y(y: f64) -> Option<Lane> {
    if !y.is_finite() {
        return None;
    }
    Some(if y < LANE_BOUNDS[0] {
        Lane::Left
    } else if y < LANE_BOUNDS[1] {
        Lane::Center
    } else {
        Lane::Right
    })
}

/// Zone of a location at the requested granularity
pub fn zone_for(location: Option<Location>, granularity: ZoneGranularity) -> Option<Zone> {
    let location = location?;
    let third = third_for_x(location.x)?;
    match granularity {
        ZoneGranularity::Thirds => Some(Zone::third(third)),
        ZoneGranularity::Grid => {
            let lane = lane_for_y(location.y?)?;
            Some(Zone::cell(third, lane))
        }
    }
}

/// Location used for zoning an event
///
/// Feed coordinates follow the acting team's attacking direction. Under role
/// framing zones are read from the possessing team's direction, so an event
/// by the team without the ball is mirrored.
pub fn framed_location(event: &Event, framing: SideFraming) -> Option<Location> {
    let location = event.location?;
    match (framing, event.team, event.possession_team) {
        (SideFraming::Role, Some(team), Some(possession)) if team != possession => {
            Some(location.mirrored())
        }
        _ => Some(location),
    }
}

/// A rule returns `Some` when it recognizes the event type
type ActionRule = fn(&Event) -> Option<Fanout<Action>>;

/// Action rules in evaluation order
const ACTION_RULES: &[(&str, ActionRule)] = &[
    ("pass", pass_actions),
    ("ball_receipt", ball_receipt_actions),
    ("carry", carry_actions),
    ("shot", shot_actions),
    ("ball_loss", ball_loss_actions),
    ("dribble", dribble_actions),
    ("interception", interception_actions),
    ("duel", duel_actions),
    ("ball_recovery", ball_recovery_actions),
];

fn pass_actions(event: &Event) -> Option<Fanout<Action>> {
    let EventKind::Pass(detail) = &event.kind else {
        return None;
    };
    Some(if detail.pass_type == Some(PassType::Interception) {
        Fanout::Two(Action::Recovery, Action::Pass)
    } else if detail.outcome.is_none() {
        Fanout::One(Action::Pass)
    } else {
        Fanout::One(Action::Loss)
    })
}

fn ball_receipt_actions(event: &Event) -> Option<Fanout<Action>> {
    match &event.kind {
        EventKind::BallReceipt { outcome: None } => Some(Fanout::One(Action::Pass)),
        EventKind::BallReceipt { outcome: Some(_) } => Some(Fanout::One(Action::Loss)),
        _ => None,
    }
}

fn carry_actions(event: &Event) -> Option<Fanout<Action>> {
    matches!(event.kind, EventKind::Carry).then_some(Fanout::One(Action::Pass))
}

fn shot_actions(event: &Event) -> Option<Fanout<Action>> {
    matches!(event.kind, EventKind::Shot { .. }).then_some(Fanout::One(Action::Shot))
}

fn ball_loss_actions(event: &Event) -> Option<Fanout<Action>> {
    matches!(event.kind, EventKind::Dispossessed | EventKind::Miscontrol)
        .then_some(Fanout::One(Action::Loss))
}

fn dribble_actions(event: &Event) -> Option<Fanout<Action>> {
    let EventKind::Dribble { outcome } = &event.kind else {
        return None;
    };
    Some(match outcome {
        Some(outcome) if outcome.is_incomplete() => Fanout::One(Action::Loss),
        _ => Fanout::Empty,
    })
}

fn interception_actions(event: &Event) -> Option<Fanout<Action>> {
    let EventKind::Interception { outcome } = &event.kind else {
        return None;
    };
    Some(match outcome {
        None => Fanout::One(Action::Recovery),
        Some(outcome) if outcome.is_success() => Fanout::One(Action::Recovery),
        Some(_) => Fanout::Empty,
    })
}

fn duel_actions(event: &Event) -> Option<Fanout<Action>> {
    let EventKind::Duel { duel_type, outcome } = &event.kind else {
        return None;
    };
    let contested = matches!(
        duel_type,
        Some(DuelType::Tackle | DuelType::Aerial | DuelType::FiftyFifty)
    );
    let won = outcome.as_ref().is_some_and(|o| o.is_success());
    Some(if contested && won {
        Fanout::One(Action::Recovery)
    } else {
        Fanout::Empty
    })
}

fn ball_recovery_actions(event: &Event) -> Option<Fanout<Action>> {
    matches!(event.kind, EventKind::BallRecovery).then_some(Fanout::One(Action::Recovery))
}

/// Discrete actions for an event
///
/// Goalkeeper events and every type without a rule produce nothing.
pub fn actions_for(event: &Event) -> Fanout<Action> {
    for (name, rule) in ACTION_RULES {
        if let Some(actions) = rule(event) {
            log::trace!("action rule '{}' matched at {}", name, event.order);
            return actions;
        }
    }
    Fanout::Empty
}

/// Side of an event's state, `None` when the deciding teams are unknown
pub fn side_for(event: &Event, framing: SideFraming, reference_team: Option<TeamId>) -> Option<Side> {
    let team = event.team?;
    let anchor = match framing {
        SideFraming::Reference => reference_team?,
        SideFraming::Role => event.possession_team?,
    };
    Some(if team == anchor {
        Side::Possessor
    } else {
        Side::NonPossessor
    })
}

/// Builds the states of an event from zone, side, actions and situation
#[derive(Debug, Clone, Copy)]
pub struct StateComposer {
    granularity: ZoneGranularity,
    framing: SideFraming,
    reference_team: Option<TeamId>,
    include_situation: bool,
}

impl StateComposer {
    pub fn new(config: &ChainConfig) -> Self {
        Self {
            granularity: config.zone_granularity,
            framing: config.side_framing,
            reference_team: config.reference_team,
            include_situation: config.include_situation,
        }
    }

    pub fn includes_situation(&self) -> bool {
        self.include_situation
    }

    /// Compose the event's states in chain order
    ///
    /// `situation` is only used when the schema includes it.
    pub fn compose(&self, event: &Event, situation: Option<Situation>) -> Fanout<State> {
        let Some(side) = side_for(event, self.framing, self.reference_team) else {
            return Fanout::Empty;
        };
        let Some(zone) = zone_for(framed_location(event, self.framing), self.granularity) else {
            return Fanout::Empty;
        };
        let situation = if self.include_situation { situation } else { None };
        actions_for(event).map(|action| State {
            side,
            zone,
            action,
            situation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Outcome, PassDetail};

    fn pass(pass_type: Option<&str>, outcome: Option<&str>) -> Event {
        Event::new(EventKind::Pass(PassDetail {
            pass_type: pass_type.map(PassType::from_label),
            outcome: outcome.map(Outcome::from_label),
        }))
    }

    fn duel(duel_type: &str, outcome: Option<&str>) -> Event {
        Event::new(EventKind::Duel {
            duel_type: Some(DuelType::from_label(duel_type)),
            outcome: outcome.map(Outcome::from_label),
        })
    }

    #[test]
    fn test_third_boundaries() {
        assert_eq!(third_for_x(0.0), Some(Third::Defensive));
        assert_eq!(third_for_x(39.9), Some(Third::Defensive));
        assert_eq!(third_for_x(40.0), Some(Third::Middle));
        assert_eq!(third_for_x(79.9), Some(Third::Middle));
        assert_eq!(third_for_x(80.0), Some(Third::Attacking));
        assert_eq!(third_for_x(120.0), Some(Third::Attacking));
        assert_eq!(third_for_x(f64::NAN), None);
    }

    #[test]
    fn test_grid_zone_needs_y() {
        let loc = Location::new(85.0, 40.0);
        assert_eq!(
            zone_for(Some(loc), ZoneGranularity::Grid),
            Some(Zone::cell(Third::Attacking, Lane::Center))
        );
        assert_eq!(
            zone_for(Some(Location::new(10.0, 0.0)), ZoneGranularity::Grid),
            Some(Zone::cell(Third::Defensive, Lane::Left))
        );
        assert_eq!(zone_for(Some(Location::from_x(85.0)), ZoneGranularity::Grid), None);
        assert_eq!(
            zone_for(Some(Location::from_x(85.0)), ZoneGranularity::Thirds),
            Some(Zone::third(Third::Attacking))
        );
        assert_eq!(zone_for(None, ZoneGranularity::Thirds), None);
    }

    #[test]
    fn test_pass_actions() {
        assert_eq!(actions_for(&pass(None, None)).to_vec(), vec![Action::Pass]);
        assert_eq!(actions_for(&pass(None, Some("Out"))).to_vec(), vec![Action::Loss]);
        assert_eq!(actions_for(&pass(None, Some("Incomplete"))).to_vec(), vec![Action::Loss]);
        assert_eq!(
            actions_for(&pass(Some("Interception"), None)).to_vec(),
            vec![Action::Recovery, Action::Pass]
        );
        // Restart passes are ordinary passes for classification
        assert_eq!(actions_for(&pass(Some("Throw-in"), None)).to_vec(), vec![Action::Pass]);
    }

    #[test]
    fn test_continuation_and_loss_actions() {
        let receipt = Event::new(EventKind::BallReceipt { outcome: None });
        assert_eq!(actions_for(&receipt).to_vec(), vec![Action::Pass]);

        let failed = Event::new(EventKind::BallReceipt { outcome: Some(Outcome::Incomplete) });
        assert_eq!(actions_for(&failed).to_vec(), vec![Action::Loss]);

        assert_eq!(actions_for(&Event::new(EventKind::Carry)).to_vec(), vec![Action::Pass]);
        assert_eq!(
            actions_for(&Event::new(EventKind::Shot { outcome: None })).to_vec(),
            vec![Action::Shot]
        );
        assert_eq!(actions_for(&Event::new(EventKind::Miscontrol)).to_vec(), vec![Action::Loss]);
        assert_eq!(actions_for(&Event::new(EventKind::Dispossessed)).to_vec(), vec![Action::Loss]);
    }

    #[test]
    fn test_dribble_actions() {
        let lost = Event::new(EventKind::Dribble { outcome: Some(Outcome::Incomplete) });
        assert_eq!(actions_for(&lost).to_vec(), vec![Action::Loss]);

        let complete = Event::new(EventKind::Dribble { outcome: Some(Outcome::Complete) });
        assert!(actions_for(&complete).is_empty());
    }

    #[test]
    fn test_recovery_actions() {
        let plain = Event::new(EventKind::Interception { outcome: None });
        assert_eq!(actions_for(&plain).to_vec(), vec![Action::Recovery]);

        let won = Event::new(EventKind::Interception {
            outcome: Some(Outcome::from_label("Success In Play")),
        });
        assert_eq!(actions_for(&won).to_vec(), vec![Action::Recovery]);

        let lost = Event::new(EventKind::Interception {
            outcome: Some(Outcome::from_label("Lost Out")),
        });
        assert!(actions_for(&lost).is_empty());

        assert_eq!(actions_for(&duel("Tackle", Some("Won"))).to_vec(), vec![Action::Recovery]);
        assert_eq!(actions_for(&duel("Aerial", Some("Success"))).to_vec(), vec![Action::Recovery]);
        assert_eq!(actions_for(&duel("50/50", Some("Won"))).to_vec(), vec![Action::Recovery]);
        assert!(actions_for(&duel("Tackle", Some("Lost In Play"))).is_empty());
        assert!(actions_for(&duel("Aerial Lost", Some("Won"))).is_empty());
        assert!(actions_for(&duel("Tackle", None)).is_empty());

        assert_eq!(
            actions_for(&Event::new(EventKind::BallRecovery)).to_vec(),
            vec![Action::Recovery]
        );
    }

    #[test]
    fn test_goalkeeper_events_produce_no_state() {
        let keeper = Event::new(EventKind::Goalkeeper {
            action: Some(crate::event::GoalkeeperAction::Claim),
        });
        assert!(actions_for(&keeper).is_empty());
        assert!(actions_for(&Event::new(EventKind::Other("Pressure".into()))).is_empty());
    }

    #[test]
    fn test_side_framings() {
        let event = Event::new(EventKind::Carry).with_teams(1, 2);
        assert_eq!(side_for(&event, SideFraming::Reference, Some(1)), Some(Side::Possessor));
        assert_eq!(side_for(&event, SideFraming::Reference, Some(2)), Some(Side::NonPossessor));
        assert_eq!(side_for(&event, SideFraming::Role, None), Some(Side::NonPossessor));

        let anonymous = Event::new(EventKind::Carry);
        assert_eq!(side_for(&anonymous, SideFraming::Reference, Some(1)), None);
    }

    #[test]
    fn test_role_framing_mirrors_defending_events() {
        let tackle = duel("Tackle", Some("Won")).with_teams(2, 1).at(12.0, 20.0);

        let role = StateComposer::new(&ChainConfig::new().with_side_framing(SideFraming::Role));
        assert_eq!(role.compose(&tackle, None).to_vec()[0].key(), "S_A_RECOVERY");
        assert_eq!(
            framed_location(&tackle, SideFraming::Role),
            Some(Location::new(108.0, 60.0))
        );

        // Reference framing keeps the acting team's coordinates
        let reference = StateComposer::new(&ChainConfig::new().with_reference_team(1));
        assert_eq!(reference.compose(&tackle, None).to_vec()[0].key(), "S_D_RECOVERY");

        let own = pass(None, None).with_teams(1, 1).at(12.0, 20.0);
        assert_eq!(framed_location(&own, SideFraming::Role), Some(Location::new(12.0, 20.0)));
    }

    #[test]
    fn test_compose_interception_pass() {
        let config = ChainConfig::new().with_reference_team(1);
        let composer = StateComposer::new(&config);
        let event = pass(Some("Interception"), None).with_teams(1, 1).at(72.0, 40.0);

        let states = composer.compose(&event, None).to_vec();
        let keys: Vec<String> = states.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["P_M_RECOVERY", "P_M_PASS"]);
    }

    #[test]
    fn test_compose_requires_zone_and_side() {
        let config = ChainConfig::new().with_reference_team(1);
        let composer = StateComposer::new(&config);

        let no_location = pass(None, None).with_teams(1, 1);
        assert!(composer.compose(&no_location, None).is_empty());

        let no_team = pass(None, None).at(50.0, 40.0);
        assert!(composer.compose(&no_team, None).is_empty());
    }

    #[test]
    fn test_compose_situation_only_when_enabled() {
        let event = pass(None, None).with_teams(1, 1).at(50.0, 40.0);

        let plain = StateComposer::new(&ChainConfig::new().with_reference_team(1));
        assert_eq!(plain.compose(&event, Some(Situation::Favorable)).to_vec()[0].key(), "P_M_PASS");

        let with_score =
            StateComposer::new(&ChainConfig::new().with_reference_team(1).with_situation(true));
        assert_eq!(
            with_score.compose(&event, Some(Situation::Favorable)).to_vec()[0].key(),
            "P_M_PASS_FAV"
        );
    }
}
