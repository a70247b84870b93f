//! Event feed readers
//!
//! A feed reader turns one match file into typed [`Event`]s, ordered and
//! with penalty-shootout events removed. Team names are kept alongside so a
//! reference team can be chosen by name.

use crate::event::Event;
use crate::types::{ChainError, Result, TeamId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod statsbomb;

pub use statsbomb::StatsBombFeed;

/// Highest period kept; later periods are penalty shootouts
pub const LAST_PLAYED_PERIOD: u8 = 4;

/// Source of per-match event lists
pub trait EventSource {
    /// Load one match, events in match order
    fn load_match(&self, path: &Path) -> Result<MatchFeed>;
}

/// One match as read from a feed
#[derive(Debug, Clone, Default)]
pub struct MatchFeed {
    /// File the match was read from, if any
    pub source: Option<PathBuf>,
    /// Match identifier, taken from the file stem when numeric
    pub match_id: Option<u64>,
    /// Events in match order
    pub events: Vec<Event>,
    /// Team names seen in the events
    pub teams: BTreeMap<TeamId, String>,
}

impl MatchFeed {
    /// Whether `team` acts in any event of this match
    pub fn involves(&self, team: TeamId) -> bool {
        self.teams.contains_key(&team) || self.events.iter().any(|e| e.team == Some(team))
    }

    /// Short label for log messages
    pub fn label(&self) -> String {
        match (&self.match_id, &self.source) {
            (Some(id), _) => id.to_string(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => "<memory>".to_string(),
        }
    }
}

/// Find a team id by name across loaded matches
///
/// Names are compared case-insensitively after trimming.
pub fn resolve_team_id<'a>(
    matches: impl IntoIterator<Item = &'a MatchFeed>,
    name: &str,
) -> Result<TeamId> {
    let wanted = normalize_name(name);
    matches
        .into_iter()
        .flat_map(|m| m.teams.iter())
        .find(|(_, team_name)| normalize_name(team_name) == wanted)
        .map(|(id, _)| *id)
        .ok_or_else(|| ChainError::TeamNotFound(name.trim().to_string()))
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(teams: &[(TeamId, &str)]) -> MatchFeed {
        MatchFeed {
            teams: teams.iter().map(|(id, n)| (*id, n.to_string())).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_team_by_name() {
        let matches = vec![feed(&[(217, "Barcelona"), (206, "Deportivo Alavés")]), feed(&[(220, "Celta Vigo")])];
        assert_eq!(resolve_team_id(&matches, "  barcelona ").unwrap(), 217);
        assert_eq!(resolve_team_id(&matches, "CELTA VIGO").unwrap(), 220);
        assert!(matches!(
            resolve_team_id(&matches, "Real Madrid"),
            Err(ChainError::TeamNotFound(_))
        ));
    }

    #[test]
    fn test_involves() {
        let m = feed(&[(217, "Barcelona")]);
        assert!(m.involves(217));
        assert!(!m.involves(1));
    }
}
