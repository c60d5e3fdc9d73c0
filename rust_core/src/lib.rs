//! HomeCourt Core - event-ingestion reconciliation for per-game projections.
//!
//! This crate provides:
//! - Team resolution from free text and exact names against a fixed vocabulary
//! - Deterministic game keys from `(home, away, date)`
//! - Typed fact decoders per topic (tickets, odds, injuries)
//! - Existence-gated, field-granular merge into a shared game projection
//! - Per-home-team upcoming games index with pruning
//! - Cancellable per-topic consumers over in-memory channels or Redis Streams
//! - Read-side queries for callers outside the pipeline

pub mod config;
pub mod consumer;
pub mod error;
pub mod facts;
pub mod identity;
pub mod logging;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod queries;
pub mod reconcile;
pub mod redis;
pub mod store;
pub mod transport;
pub mod upcoming;

pub use config::IngestConfig;
pub use consumer::{ConsumerReport, TopicConsumer};
pub use error::{IngestError, ResolutionFailure, StoreError, VocabularyError};
pub use identity::GameKeyBuilder;
pub use matching::{Matchup, TeamResolver, TeamVocabulary};
pub use models::{GameFields, GameKey, TeamCode, Topic};
pub use pipeline::Pipeline;
pub use queries::{GameQueries, UpcomingGame};
pub use reconcile::{Applied, Reconciler};
pub use store::{GameStore, UpcomingIndex};
pub use transport::{ChannelSource, Delivery, MessageSource};
pub use upcoming::{Clock, FixedClock, SystemClock, UpcomingGames};
