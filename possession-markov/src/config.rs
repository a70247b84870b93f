//! Chain builder configuration
//!
//! A flat set of named options. Everything here is checked once by
//! [`ChainConfig::validate`] before any match is processed; segmentation
//! itself never fails on configuration.

use crate::types::{ChainError, Result, TeamId};
use serde::{Deserialize, Serialize};

/// Configuration for state composition, segmentation and estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Whether a stoppage severs the running chain
    #[serde(default = "default_true")]
    pub cut_on_stop: bool,

    /// Whether a live possession change is forced to read as Loss -> Recovery
    #[serde(default = "default_true")]
    pub coerce_turnovers: bool,

    /// Team whose perspective defines the Possessor side (reference framing)
    #[serde(default)]
    pub reference_team: Option<TeamId>,

    /// Additive smoothing pseudo-count
    #[serde(default = "default_alpha")]
    pub smoothing_alpha: f64,

    /// Pitch discretization: 3 thirds or a 3x3 grid
    #[serde(default)]
    pub zone_granularity: ZoneGranularity,

    /// How the side of a state is decided
    #[serde(default)]
    pub side_framing: SideFraming,

    /// Append the scoreline situation to every state
    #[serde(default)]
    pub include_situation: bool,

    /// Whether a shot ends its chain instead of linking to the next state
    #[serde(default)]
    pub treat_shot_as_terminal: bool,

    /// Whether ball receipts take part in chains
    #[serde(default = "default_true")]
    pub include_ball_receipts: bool,
}

fn default_true() -> bool {
    true
}

fn default_alpha() -> f64 {
    0.3
}

/// Number of pitch zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ZoneGranularity {
    /// Defensive / Middle / Attacking thirds
    #[default]
    Thirds,
    /// Thirds split into Left / Center / Right lanes
    Grid,
}

impl TryFrom<u8> for ZoneGranularity {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            3 => Ok(ZoneGranularity::Thirds),
            9 => Ok(ZoneGranularity::Grid),
            other => Err(format!("zone granularity must be 3 or 9, got {}", other)),
        }
    }
}

impl From<ZoneGranularity> for u8 {
    fn from(value: ZoneGranularity) -> Self {
        match value {
            ZoneGranularity::Thirds => 3,
            ZoneGranularity::Grid => 9,
        }
    }
}

/// Perspective from which a state's side is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideFraming {
    /// Possessor iff the acting team is the reference team
    #[default]
    Reference,
    /// Possessor (attacking) iff the acting team owns the possession
    Role,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            cut_on_stop: true,
            coerce_turnovers: true,
            reference_team: None,
            smoothing_alpha: default_alpha(),
            zone_granularity: ZoneGranularity::default(),
            side_framing: SideFraming::default(),
            include_situation: false,
            treat_shot_as_terminal: false,
            include_ball_receipts: true,
        }
    }
}

impl ChainConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the reference team
    pub fn with_reference_team(mut self, team: TeamId) -> Self {
        self.reference_team = Some(team);
        self
    }

    /// Builder method: cut chains on stoppages
    pub fn with_cut_on_stop(mut self, enabled: bool) -> Self {
        self.cut_on_stop = enabled;
        self
    }

    /// Builder method: coerce live turnovers
    pub fn with_coerce_turnovers(mut self, enabled: bool) -> Self {
        self.coerce_turnovers = enabled;
        self
    }

    /// Builder method: set the smoothing pseudo-count
    pub fn with_smoothing(mut self, alpha: f64) -> Self {
        self.smoothing_alpha = alpha;
        self
    }

    /// Builder method: set the zone granularity
    pub fn with_zones(mut self, granularity: ZoneGranularity) -> Self {
        self.zone_granularity = granularity;
        self
    }

    /// Builder method: set the side framing
    pub fn with_side_framing(mut self, framing: SideFraming) -> Self {
        self.side_framing = framing;
        self
    }

    /// Builder method: include scoreline situation in states
    pub fn with_situation(mut self, enabled: bool) -> Self {
        self.include_situation = enabled;
        self
    }

    /// Builder method: end chains at shots
    pub fn with_shot_terminal(mut self, enabled: bool) -> Self {
        self.treat_shot_as_terminal = enabled;
        self
    }

    /// Builder method: keep or drop ball receipts
    pub fn with_ball_receipts(mut self, enabled: bool) -> Self {
        self.include_ball_receipts = enabled;
        self
    }

    /// Check the configuration before any processing starts
    pub fn validate(&self) -> Result<()> {
        if !self.smoothing_alpha.is_finite() || self.smoothing_alpha < 0.0 {
            return Err(ChainError::InvalidSmoothing(self.smoothing_alpha));
        }
        if self.side_framing == SideFraming::Reference && self.reference_team.is_none() {
            return Err(ChainError::MissingReferenceTeam);
        }
        Ok(())
    }
}
