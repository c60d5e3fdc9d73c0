//! Domain types shared by the resolver, the reconciler and the stores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name -> value mapping of a game projection.
///
/// Values are kept as strings so a projection maps one-to-one onto a Redis hash.
pub type GameFields = BTreeMap<String, String>;

/// Canonical team code (e.g. `ATL`), independent of source vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamCode(String);

impl TeamCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic identity of one real-world game.
///
/// Built by [`crate::identity::GameKeyBuilder`] from `(home, away, date)`; never mutated.
/// Keys read back from the upcoming index are rewrapped with [`GameKey::from_stored`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameKey(String);

impl GameKey {
    pub(crate) fn from_parts(home: &TeamCode, away: &TeamCode, date: &str) -> Self {
        Self(format!("{} {} {}", home, away, date))
    }

    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fact categories, one consumer each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Tickets,
    Odds,
    Injuries,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Tickets, Topic::Odds, Topic::Injuries];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Tickets => "tickets",
            Topic::Odds => "odds",
            Topic::Injuries => "injuries",
        }
    }

    /// Only schedule-authoritative feeds may create a projection.
    pub fn is_seeding(&self) -> bool {
        matches!(self, Topic::Tickets)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projection field names
pub mod fields {
    pub const HOME_TEAM: &str = "home_team";
    pub const AWAY_TEAM: &str = "away_team";
    pub const START_TIME: &str = "start_time";
    pub const VENUE: &str = "venue";
    pub const LOWEST_TICKET_PRICE: &str = "lowest_ticket_price";
    pub const HOME_TEAM_ODDS: &str = "home_team_odds";
    pub const AWAY_TEAM_ODDS: &str = "away_team_odds";
}
