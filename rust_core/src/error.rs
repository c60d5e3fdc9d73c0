//! Error taxonomy for the ingestion pipeline.
//!
//! Every variant of [`IngestError`] is per-message: the consumer logs it and moves on.
//! Only [`IngestError::StoreUnavailable`] is worth a redelivery.

use crate::models::{GameKey, Topic};
use std::path::PathBuf;
use thiserror::Error;

/// Game Store / Upcoming Index collaborator failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Why a team reference did not resolve
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("unknown team")]
    UnknownTeam,
    #[error("expected exactly two teams, matched {matched}")]
    AmbiguousOrMissingTeams { matched: usize },
    #[error("both sides resolved to {code}")]
    SameTeamTwice { code: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed {topic} message: {reason}")]
    Decode { topic: Topic, reason: String },

    #[error("could not resolve teams from `{text}`: {failure}")]
    TeamResolution {
        text: String,
        failure: ResolutionFailure,
    },

    #[error("unparseable timestamp `{value}`")]
    InvalidTimestamp { value: String },

    #[error("game {0} has not been seeded")]
    GameNotFound(GameKey),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("{0} facts are not supported yet")]
    NotYetSupported(Topic),
}

impl IngestError {
    pub fn decode(topic: Topic, reason: impl Into<String>) -> Self {
        IngestError::Decode {
            topic,
            reason: reason.into(),
        }
    }

    /// Transient failures whose message should stay unacknowledged for redelivery.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::StoreUnavailable(_))
    }
}

/// Team vocabulary loading and validation failures
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to read team vocabulary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse team vocabulary: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("team code must not be empty")]
    EmptyCode,

    #[error("alias `{alias}` of {code} is empty after normalization")]
    EmptyAlias { code: String, alias: String },

    #[error("alias `{alias}` maps to both {first} and {second}")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_errors_are_retryable() {
        assert!(IngestError::StoreUnavailable(StoreError::Unavailable("down".into())).is_retryable());
        assert!(!IngestError::decode(Topic::Odds, "bad json").is_retryable());
        assert!(!IngestError::GameNotFound(GameKey::from_stored("ATL MIA 02.25.2025")).is_retryable());
        assert!(!IngestError::NotYetSupported(Topic::Injuries).is_retryable());
        assert!(!IngestError::InvalidTimestamp { value: "soon".into() }.is_retryable());
    }

    #[test]
    fn test_messages_carry_offending_text() {
        let err = IngestError::TeamResolution {
            text: "Hawks vs Somebody".to_string(),
            failure: ResolutionFailure::AmbiguousOrMissingTeams { matched: 1 },
        };
        let msg = err.to_string();
        assert!(msg.contains("Hawks vs Somebody"));
        assert!(msg.contains("matched 1"));
    }
}
