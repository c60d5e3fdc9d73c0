//! Typed facts, one decoder per topic.
//!
//! Decoding fails closed: a missing or mistyped field is an [`IngestError::Decode`],
//! never a panic. Resolution then turns a decoded fact into a [`ResolvedFact`]: a game
//! key plus the projection fields this fact asserts.

pub mod injuries;
pub mod odds;
pub mod tickets;

pub use odds::OddsFact;
pub use tickets::{TeamReference, TicketFact};

use crate::error::IngestError;
use crate::identity::GameKeyBuilder;
use crate::matching::TeamResolver;
use crate::models::{GameFields, GameKey, TeamCode, Topic};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    Ticket(TicketFact),
    Odds(OddsFact),
}

impl Fact {
    pub fn topic(&self) -> Topic {
        match self {
            Fact::Ticket(_) => Topic::Tickets,
            Fact::Odds(_) => Topic::Odds,
        }
    }

    pub fn resolve(
        &self,
        resolver: &TeamResolver,
        keys: &GameKeyBuilder,
    ) -> Result<ResolvedFact, IngestError> {
        match self {
            Fact::Ticket(fact) => fact.resolve(resolver, keys),
            Fact::Odds(fact) => fact.resolve(resolver, keys),
        }
    }
}

/// Decode a raw payload from `topic` into a typed fact.
pub fn decode(topic: Topic, payload: &[u8]) -> Result<Fact, IngestError> {
    match topic {
        Topic::Tickets => TicketFact::decode(payload).map(Fact::Ticket),
        Topic::Odds => OddsFact::decode(payload).map(Fact::Odds),
        Topic::Injuries => injuries::decode(payload),
    }
}

/// A fact whose teams and start time have been resolved to a game identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFact {
    pub topic: Topic,
    pub key: GameKey,
    pub home: TeamCode,
    pub start: DateTime<Utc>,
    pub fields: GameFields,
}

impl ResolvedFact {
    pub fn is_seeding(&self) -> bool {
        self.topic.is_seeding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_dispatches_by_topic() {
        let ticket = br#"{"event_name":"Atlanta Hawks vs Miami Heat","start_date_time":"2025-02-25T00:30:00Z","min_ticket_price":25,"venue_name":"State Farm Arena"}"#;
        assert_eq!(decode(Topic::Tickets, ticket).unwrap().topic(), Topic::Tickets);

        // A ticket payload is not a valid odds payload
        assert!(matches!(
            decode(Topic::Odds, ticket),
            Err(IngestError::Decode { topic: Topic::Odds, .. })
        ));
    }

    #[test]
    fn test_injuries_not_yet_supported() {
        assert!(matches!(
            decode(Topic::Injuries, br#"{"player":"someone"}"#),
            Err(IngestError::NotYetSupported(Topic::Injuries))
        ));
    }
}
