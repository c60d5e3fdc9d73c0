//! Ticket facts: the seeding feed.
//!
//! Wire format:
//! `{"event_name":"Atlanta Hawks vs Miami Heat","start_date_time":"2025-02-25T00:30:00Z",
//!   "min_ticket_price":25,"venue_name":"State Farm Arena"}`
//!
//! `home_team`/`away_team` may be sent instead of `event_name`.

use super::ResolvedFact;
use crate::error::IngestError;
use crate::identity::GameKeyBuilder;
use crate::matching::TeamResolver;
use crate::models::{fields, GameFields, Topic};
use chrono::SecondsFormat;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TicketMessage {
    event_name: Option<String>,
    home_team: Option<String>,
    away_team: Option<String>,
    start_date_time: String,
    min_ticket_price: f64,
    venue_name: Option<String>,
}

/// How a ticket message names its teams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamReference {
    /// Combined event title, read as "HOME vs AWAY"
    Title(String),
    Explicit { home: String, away: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketFact {
    pub teams: TeamReference,
    pub start_time: String,
    pub min_price: f64,
    pub venue: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TicketFact {
    pub fn decode(payload: &[u8]) -> Result<Self, IngestError> {
        let msg: TicketMessage = serde_json::from_slice(payload)
            .map_err(|e| IngestError::decode(Topic::Tickets, e.to_string()))?;

        let teams = match (
            non_empty(msg.home_team),
            non_empty(msg.away_team),
            non_empty(msg.event_name),
        ) {
            (Some(home), Some(away), _) => TeamReference::Explicit { home, away },
            (_, _, Some(title)) => TeamReference::Title(title),
            _ => {
                return Err(IngestError::decode(
                    Topic::Tickets,
                    "missing event_name or home_team/away_team",
                ))
            }
        };

        if !msg.min_ticket_price.is_finite() || msg.min_ticket_price < 0.0 {
            return Err(IngestError::decode(
                Topic::Tickets,
                format!("invalid min_ticket_price {}", msg.min_ticket_price),
            ));
        }

        Ok(Self {
            teams,
            start_time: msg.start_date_time,
            min_price: msg.min_ticket_price,
            venue: non_empty(msg.venue_name),
        })
    }

    pub fn resolve(
        &self,
        resolver: &TeamResolver,
        keys: &GameKeyBuilder,
    ) -> Result<ResolvedFact, IngestError> {
        let (home, away) = match &self.teams {
            TeamReference::Title(title) => {
                let matchup = resolver.extract_matchup(title)?;
                (matchup.home, matchup.away)
            }
            TeamReference::Explicit { home, away } => {
                let matchup = resolver.resolve_pair(home, away)?;
                (matchup.home, matchup.away)
            }
        };

        let start = keys.parse_start(&self.start_time)?;
        let key = keys.build(&home, &away, start);

        let mut game_fields = GameFields::new();
        game_fields.insert(fields::HOME_TEAM.to_string(), home.to_string());
        game_fields.insert(fields::AWAY_TEAM.to_string(), away.to_string());
        game_fields.insert(
            fields::START_TIME.to_string(),
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        game_fields.insert(
            fields::LOWEST_TICKET_PRICE.to_string(),
            format!("${:.2}", self.min_price),
        );
        if let Some(venue) = &self.venue {
            game_fields.insert(fields::VENUE.to_string(), venue.clone());
        }

        Ok(ResolvedFact {
            topic: Topic::Tickets,
            key,
            home,
            start,
            fields: game_fields,
        })
    }
}
