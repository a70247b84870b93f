//! Possession flip causes
//!
//! A flip is a transition whose two boundary events were performed by
//! different teams. Every flip gets exactly one cause from an ordered
//! decision table: restarts first, then what the new team did, then linked
//! events, then what the old team did wrong, then pressure, then `other`.

use crate::event::{DuelType, Event, EventKind, GoalkeeperAction, Outcome, Restart};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Why possession changed hands across a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlipCause {
    Restart(Restart),
    Interception,
    BallRecovery,
    Tackle,
    FoulWon,
    FiftyFifty,
    GoalkeeperAction,
    Offside,
    Miscontrol,
    Dispossessed,
    Out,
    BadPass,
    ClearanceConceded,
    PressureLoss,
    Other,
}

impl FlipCause {
    pub fn label(&self) -> &'static str {
        match self {
            FlipCause::Restart(Restart::ThrowIn) => "restart_throw_in",
            FlipCause::Restart(Restart::GoalKick) => "restart_goal_kick",
            FlipCause::Restart(Restart::Corner) => "restart_corner",
            FlipCause::Restart(Restart::FreeKick) => "restart_free_kick",
            FlipCause::Restart(Restart::KickOff) => "restart_kickoff",
            FlipCause::Interception => "interception",
            FlipCause::BallRecovery => "ball_recovery",
            FlipCause::Tackle => "tackle",
            FlipCause::FoulWon => "foul_won",
            FlipCause::FiftyFifty => "fifty_fifty",
            FlipCause::GoalkeeperAction => "gk_action",
            FlipCause::Offside => "offside",
            FlipCause::Miscontrol => "miscontrol",
            FlipCause::Dispossessed => "dispossessed",
            FlipCause::Out => "out",
            FlipCause::BadPass => "bad_pass",
            FlipCause::ClearanceConceded => "clearance_conceded",
            FlipCause::PressureLoss => "pressure_loss",
            FlipCause::Other => "other",
        }
    }

    pub fn is_restart(&self) -> bool {
        matches!(self, FlipCause::Restart(_))
    }
}

impl fmt::Display for FlipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for FlipCause {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Lookup from event identifier to event
pub trait RelatedEvents {
    fn resolve(&self, id: &str) -> Option<&Event>;
}

/// Identifier index over one match's events
#[derive(Debug, Default)]
pub struct EventIndex<'a> {
    by_id: HashMap<&'a str, &'a Event>,
}

impl<'a> EventIndex<'a> {
    pub fn new(events: &'a [Event]) -> Self {
        let by_id = events
            .iter()
            .filter_map(|event| event.id.as_deref().map(|id| (id, event)))
            .collect();
        Self { by_id }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl RelatedEvents for EventIndex<'_> {
    fn resolve(&self, id: &str) -> Option<&Event> {
        self.by_id.get(id).copied()
    }
}

impl RelatedEvents for HashMap<String, Event> {
    fn resolve(&self, id: &str) -> Option<&Event> {
        self.get(id)
    }
}

/// The two boundary events of a flip plus the related-event lookup
pub struct FlipContext<'a> {
    pub pre: &'a Event,
    pub post: &'a Event,
    pub related: &'a dyn RelatedEvents,
}

type FlipRule = fn(&FlipContext<'_>) -> Option<FlipCause>;

/// Flip rules in evaluation order
const FLIP_RULES: &[(&str, FlipRule)] = &[
    ("restart", restart_cause),
    ("interception", interception_cause),
    ("ball_recovery", ball_recovery_cause),
    ("tackle", tackle_cause),
    ("foul_won", foul_won_cause),
    ("fifty_fifty", fifty_fifty_cause),
    ("gk_action", goalkeeper_cause),
    ("related_events", related_event_cause),
    ("offside", offside_cause),
    ("miscontrol", miscontrol_cause),
    ("dispossessed", dispossessed_cause),
    ("failed_pass", failed_pass_cause),
    ("clearance", clearance_cause),
    ("pressure", pressure_cause),
];

fn restart_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    ctx.post.restart().map(FlipCause::Restart)
}

fn interception_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    matches!(ctx.post.kind, EventKind::Interception { .. }).then_some(FlipCause::Interception)
}

fn ball_recovery_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    matches!(ctx.post.kind, EventKind::BallRecovery).then_some(FlipCause::BallRecovery)
}

fn tackle_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    ctx.post.is_successful_tackle().then_some(FlipCause::Tackle)
}

fn foul_won_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    matches!(ctx.post.kind, EventKind::FoulWon).then_some(FlipCause::FoulWon)
}

fn fifty_fifty_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    is_successful_fifty_fifty(ctx.post).then_some(FlipCause::FiftyFifty)
}

fn goalkeeper_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    matches!(
        ctx.post.kind,
        EventKind::Goalkeeper {
            action: Some(
                GoalkeeperAction::Save
                    | GoalkeeperAction::Claim
                    | GoalkeeperAction::Punch
                    | GoalkeeperAction::Smother
            )
        }
    )
    .then_some(FlipCause::GoalkeeperAction)
}

fn offside_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    ctx.pre.is_offside().then_some(FlipCause::Offside)
}

fn miscontrol_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    matches!(ctx.pre.kind, EventKind::Miscontrol).then_some(FlipCause::Miscontrol)
}

fn dispossessed_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    matches!(ctx.pre.kind, EventKind::Dispossessed).then_some(FlipCause::Dispossessed)
}

fn clearance_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    matches!(ctx.pre.kind, EventKind::Clearance).then_some(FlipCause::ClearanceConceded)
}

fn pressure_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    ctx.pre.under_pressure.then_some(FlipCause::PressureLoss)
}

fn is_successful_fifty_fifty(event: &Event) -> bool {
    match &event.kind {
        EventKind::FiftyFifty { outcome: Some(outcome) } => outcome.is_success(),
        EventKind::Duel {
            duel_type: Some(DuelType::FiftyFifty),
            outcome: Some(outcome),
        } => outcome.is_success(),
        _ => false,
    }
}

/// Linked interceptions win over linked tackles; unresolved ids are skipped
fn related_event_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    let linked: Vec<&Event> = ctx
        .post
        .related_events
        .iter()
        .filter_map(|id| {
            let resolved = ctx.related.resolve(id);
            if resolved.is_none() {
                log::trace!("related event {} not found, ignoring", id);
            }
            resolved
        })
        .collect();

    if linked
        .iter()
        .any(|event| matches!(event.kind, EventKind::Interception { .. }))
    {
        return Some(FlipCause::Interception);
    }
    if linked.iter().any(|event| event.is_successful_tackle()) {
        return Some(FlipCause::Tackle);
    }
    None
}

fn failed_pass_cause(ctx: &FlipContext<'_>) -> Option<FlipCause> {
    match &ctx.pre.kind {
        EventKind::Pass(detail)
            if matches!(detail.outcome, Some(Outcome::Incomplete | Outcome::Out)) =>
        {
            Some(if ctx.pre.out {
                FlipCause::Out
            } else {
                FlipCause::BadPass
            })
        }
        _ => None,
    }
}

/// Whether the transition between two events crosses the possession boundary
pub fn is_flip(pre: &Event, post: &Event) -> bool {
    match (pre.team, post.team) {
        (Some(before), Some(after)) => before != after,
        _ => false,
    }
}

/// Cause of a flip between `pre` and `post`
pub fn classify_flip(pre: &Event, post: &Event, related: &dyn RelatedEvents) -> FlipCause {
    let ctx = FlipContext { pre, post, related };
    for (name, rule) in FLIP_RULES {
        if let Some(cause) = rule(&ctx) {
            log::trace!("flip rule '{}' matched at {}", name, post.order);
            return cause;
        }
    }
    FlipCause::Other
}
