//! StatsBomb open-data event reader
//!
//! One JSON array of events per match file. Only the fields the chain
//! builder looks at are deserialized; everything else is ignored.
//!
//! ## Outcomes
//! Outcomes normally live in the type-specific object (`pass.outcome`,
//! `duel.outcome`, `50_50.outcome`, ...). A top-level `outcome` object is
//! accepted as a fallback for flattened exports.

use super::{EventSource, MatchFeed, LAST_PLAYED_PERIOD};
use crate::event::{
    DuelType, Event, EventKind, GoalkeeperAction, Outcome, PassDetail, PassType, Stoppage,
};
use crate::types::{ChainError, Location, OrderKey, Result, TeamId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// `{ "id": .., "name": .. }` reference used throughout the feed
#[derive(Debug, Default, Deserialize)]
struct Named {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
}

/// Type-specific payload: only its `type` and `outcome` matter here
#[derive(Debug, Default, Deserialize)]
struct Detail {
    #[serde(rename = "type", default)]
    kind: Option<Named>,
    #[serde(default)]
    outcome: Option<Named>,
}

impl Detail {
    fn type_name(&self) -> Option<&str> {
        self.kind.as_ref().and_then(|k| k.name.as_deref())
    }

    fn outcome_name(&self) -> Option<&str> {
        self.outcome.as_ref().and_then(|o| o.name.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    period: Option<u8>,
    #[serde(default)]
    minute: Option<u32>,
    #[serde(default)]
    second: Option<u32>,
    #[serde(rename = "type", default)]
    event_type: Option<Named>,
    #[serde(default)]
    team: Option<Named>,
    #[serde(default)]
    possession_team: Option<Named>,
    #[serde(default)]
    location: Option<Vec<f64>>,
    #[serde(default)]
    under_pressure: Option<bool>,
    #[serde(default)]
    out: Option<bool>,
    #[serde(default)]
    related_events: Option<Vec<String>>,
    #[serde(default)]
    outcome: Option<Named>,

    #[serde(default)]
    pass: Option<Detail>,
    #[serde(default)]
    ball_receipt: Option<Detail>,
    #[serde(default)]
    shot: Option<Detail>,
    #[serde(default)]
    dribble: Option<Detail>,
    #[serde(default)]
    interception: Option<Detail>,
    #[serde(default)]
    duel: Option<Detail>,
    #[serde(rename = "50_50", default)]
    fifty_fifty: Option<Detail>,
    #[serde(default)]
    goalkeeper: Option<Detail>,
}

impl RawEvent {
    /// Outcome from the nested payload, falling back to the top level
    fn outcome(&self, detail: &Option<Detail>) -> Option<Outcome> {
        detail
            .as_ref()
            .and_then(Detail::outcome_name)
            .or_else(|| self.outcome.as_ref().and_then(|o| o.name.as_deref()))
            .map(Outcome::from_label)
    }

    fn kind(&self) -> EventKind {
        let type_name = self
            .event_type
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or("");

        match type_name {
            "Pass" => EventKind::Pass(PassDetail {
                pass_type: self
                    .pass
                    .as_ref()
                    .and_then(Detail::type_name)
                    .map(PassType::from_label),
                // Only the nested outcome counts: a missing pass outcome means completed
                outcome: self
                    .pass
                    .as_ref()
                    .and_then(Detail::outcome_name)
                    .map(Outcome::from_label),
            }),
            "Ball Receipt" | "Ball Receipt*" => EventKind::BallReceipt {
                outcome: self.outcome(&self.ball_receipt),
            },
            "Carry" => EventKind::Carry,
            "Shot" => EventKind::Shot {
                outcome: self.outcome(&self.shot),
            },
            "Dispossessed" => EventKind::Dispossessed,
            "Miscontrol" => EventKind::Miscontrol,
            "Dribble" => EventKind::Dribble {
                outcome: self.outcome(&self.dribble),
            },
            "Interception" => EventKind::Interception {
                outcome: self.outcome(&self.interception),
            },
            "Duel" => EventKind::Duel {
                duel_type: self
                    .duel
                    .as_ref()
                    .and_then(Detail::type_name)
                    .map(DuelType::from_label),
                outcome: self.outcome(&self.duel),
            },
            "Ball Recovery" => EventKind::BallRecovery,
            "50/50" => EventKind::FiftyFifty {
                outcome: self.outcome(&self.fifty_fifty),
            },
            "Goal Keeper" => EventKind::Goalkeeper {
                action: self
                    .goalkeeper
                    .as_ref()
                    .and_then(Detail::type_name)
                    .map(GoalkeeperAction::from_label),
            },
            "Clearance" => EventKind::Clearance,
            "Foul Won" => EventKind::FoulWon,
            "Own Goal For" => EventKind::OwnGoalFor,
            other => match Stoppage::from_type_name(other) {
                Some(stoppage) => EventKind::Stoppage(stoppage),
                None => EventKind::Other(other.to_string()),
            },
        }
    }

    fn location(&self) -> Option<Location> {
        match self.location.as_deref() {
            Some([x, y, ..]) => Some(Location::new(*x, *y)),
            Some([x]) => Some(Location::from_x(*x)),
            _ => None,
        }
    }

    /// Typed event, or `None` for events outside regular play periods
    fn into_event(self) -> Option<Event> {
        let period = self.period?;
        if period == 0 || period > LAST_PLAYED_PERIOD {
            return None;
        }

        Some(Event {
            order: OrderKey {
                period,
                minute: self.minute.unwrap_or(0),
                second: self.second.unwrap_or(0),
                index: self.index.unwrap_or(0),
            },
            kind: self.kind(),
            team: self.team.as_ref().and_then(|t| t.id),
            possession_team: self.possession_team.as_ref().and_then(|t| t.id),
            location: self.location(),
            under_pressure: self.under_pressure.unwrap_or(false),
            out: self.out.unwrap_or(false),
            related_events: self.related_events.unwrap_or_default(),
            id: self.id,
        })
    }
}

/// Reader for StatsBomb-style per-match event files
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsBombFeed;

impl StatsBombFeed {
    pub fn new() -> Self {
        Self
    }

    /// Parse a match from a JSON string
    pub fn parse_str(&self, json: &str) -> Result<MatchFeed> {
        let raw: Vec<RawEvent> =
            serde_json::from_str(json).map_err(|e| ChainError::FeedParseError(e.to_string()))?;
        Ok(build_match(raw))
    }

    /// Parse a match from an already decoded JSON value
    pub fn parse_value(&self, value: serde_json::Value) -> Result<MatchFeed> {
        let raw: Vec<RawEvent> =
            serde_json::from_value(value).map_err(|e| ChainError::FeedParseError(e.to_string()))?;
        Ok(build_match(raw))
    }
}

impl EventSource for StatsBombFeed {
    fn load_match(&self, path: &Path) -> Result<MatchFeed> {
        log::debug!("Reading event feed: {:?}", path);

        let file = File::open(path)?;
        let raw: Vec<RawEvent> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ChainError::FeedParseError(format!("{:?}: {}", path, e)))?;
        let mut feed = build_match(raw);

        feed.match_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok());
        feed.source = Some(path.to_path_buf());
        Ok(feed)
    }
}

fn build_match(raw: Vec<RawEvent>) -> MatchFeed {
    let total = raw.len();
    let mut teams: BTreeMap<TeamId, String> = BTreeMap::new();
    for named in raw
        .iter()
        .flat_map(|e| [e.team.as_ref(), e.possession_team.as_ref()])
        .flatten()
    {
        if let (Some(id), Some(name)) = (named.id, named.name.as_ref()) {
            teams.entry(id).or_insert_with(|| name.clone());
        }
    }

    let mut events: Vec<Event> = raw.into_iter().filter_map(RawEvent::into_event).collect();
    if events.len() < total {
        log::trace!("Dropped {} events outside periods 1-{}", total - events.len(), LAST_PLAYED_PERIOD);
    }
    events.sort_by_key(|e| e.order);

    MatchFeed {
        source: None,
        match_id: None,
        events,
        teams,
    }
}
