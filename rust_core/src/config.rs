//! Runtime configuration loaded from the environment.

use crate::identity::GameKeyBuilder;
use crate::models::Topic;
use crate::redis::store::DEFAULT_GAME_KEY_PREFIX;
use crate::redis::ReconnectConfig;
use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

pub const DEFAULT_CONSUMER_GROUP: &str = "homecourt";

/// Blocking read timeout for stream reads
pub const DEFAULT_STREAM_BLOCK_MS: usize = 5000;

pub const DEFAULT_STREAM_BATCH_SIZE: usize = 16;

/// Upcoming index pruning period; 0 disables the pruner
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub redis_url: String,
    pub tickets_stream: String,
    pub odds_stream: String,
    pub injuries_stream: String,
    pub consumer_group: String,
    pub consumer_name: String,
    pub stream_block_ms: usize,
    pub stream_batch_size: usize,
    /// Reference timezone for game key dates, minutes east of UTC
    pub reference_utc_offset_minutes: i32,
    pub prune_interval: Duration,
    pub team_vocabulary_path: Option<PathBuf>,
    pub game_key_prefix: String,
    pub reconnect: ReconnectConfig,
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn string_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn default_consumer_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| format!("ingestion-{}", std::process::id()))
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            tickets_stream: Topic::Tickets.as_str().to_string(),
            odds_stream: Topic::Odds.as_str().to_string(),
            injuries_stream: Topic::Injuries.as_str().to_string(),
            consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
            consumer_name: default_consumer_name(),
            stream_block_ms: DEFAULT_STREAM_BLOCK_MS,
            stream_batch_size: DEFAULT_STREAM_BATCH_SIZE,
            reference_utc_offset_minutes: 0,
            prune_interval: Duration::from_secs(DEFAULT_PRUNE_INTERVAL_SECS),
            team_vocabulary_path: None,
            game_key_prefix: DEFAULT_GAME_KEY_PREFIX.to_string(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: string_or("REDIS_URL", &defaults.redis_url),
            tickets_stream: string_or("TICKETS_STREAM", &defaults.tickets_stream),
            odds_stream: string_or("ODDS_STREAM", &defaults.odds_stream),
            injuries_stream: string_or("INJURIES_STREAM", &defaults.injuries_stream),
            consumer_group: string_or("CONSUMER_GROUP", &defaults.consumer_group),
            consumer_name: string_or("CONSUMER_NAME", &defaults.consumer_name),
            stream_block_ms: parse_or("STREAM_BLOCK_MS", defaults.stream_block_ms),
            stream_batch_size: parse_or("STREAM_BATCH_SIZE", defaults.stream_batch_size).max(1),
            reference_utc_offset_minutes: parse_or("REFERENCE_UTC_OFFSET_MINUTES", 0),
            prune_interval: Duration::from_secs(parse_or(
                "PRUNE_INTERVAL_SECS",
                DEFAULT_PRUNE_INTERVAL_SECS,
            )),
            team_vocabulary_path: env::var("TEAM_VOCABULARY_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            game_key_prefix: string_or("GAME_KEY_PREFIX", &defaults.game_key_prefix),
            reconnect: ReconnectConfig::from_env(),
        }
    }

    pub fn stream_for(&self, topic: Topic) -> &str {
        match topic {
            Topic::Tickets => &self.tickets_stream,
            Topic::Odds => &self.odds_stream,
            Topic::Injuries => &self.injuries_stream,
        }
    }

    /// Key builder for the configured reference timezone
    pub fn key_builder(&self) -> Result<GameKeyBuilder> {
        GameKeyBuilder::with_offset_minutes(self.reference_utc_offset_minutes).ok_or_else(|| {
            anyhow!(
                "REFERENCE_UTC_OFFSET_MINUTES out of range: {}",
                self.reference_utc_offset_minutes
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
        assert_eq!(config.stream_for(Topic::Tickets), "tickets");
        assert_eq!(config.stream_for(Topic::Injuries), "injuries");
        assert_eq!(config.consumer_group, "homecourt");
        assert_eq!(config.prune_interval, Duration::from_secs(300));
        assert_eq!(config.game_key_prefix, "game:");
        assert!(!config.consumer_name.is_empty());
        assert!(config.key_builder().is_ok());
    }

    #[test]
    fn test_key_builder_rejects_bad_offset() {
        let config = IngestConfig {
            reference_utc_offset_minutes: 24 * 60,
            ..IngestConfig::default()
        };
        assert!(config.key_builder().is_err());

        let eastern = IngestConfig {
            reference_utc_offset_minutes: -300,
            ..IngestConfig::default()
        };
        assert_eq!(eastern.key_builder().unwrap().reference().local_minus_utc(), -300 * 60);
    }
}
