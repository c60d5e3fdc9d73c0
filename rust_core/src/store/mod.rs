//! Game Store and Upcoming Index collaborators.
//!
//! The pipeline only relies on single-operation atomicity: one `seed_or_update` writes
//! all of its fields at once, but two facts for the same game are never combined into
//! a transaction. Implementations:
//! - `memory`: in-process maps, used by tests and embedded runs
//! - [`crate::redis::store`]: Redis hashes and sorted sets

pub mod memory;

pub use memory::{MemoryGameStore, MemoryUpcomingIndex};

use crate::error::StoreError;
use crate::models::{GameFields, GameKey, TeamCode};
use async_trait::async_trait;

/// Per-game projection storage
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Overwrite the given fields, creating the projection if absent.
    /// Fields not named are left untouched.
    async fn seed_or_update(&self, key: &GameKey, fields: &GameFields) -> Result<(), StoreError>;

    async fn exists(&self, key: &GameKey) -> Result<bool, StoreError>;

    /// `None` when no projection exists for `key`.
    async fn read(&self, key: &GameKey) -> Result<Option<GameFields>, StoreError>;
}

/// Per-home-team ordered index of `(game key, start epoch seconds)`
#[async_trait]
pub trait UpcomingIndex: Send + Sync {
    /// Insert, or move an existing key to `epoch`.
    async fn add(&self, team: &TeamCode, key: &GameKey, epoch: i64) -> Result<(), StoreError>;

    /// Up to `limit` keys with start >= `now`, ascending by start.
    async fn query_from(
        &self,
        team: &TeamCode,
        now: i64,
        limit: usize,
    ) -> Result<Vec<GameKey>, StoreError>;

    /// Remove keys with start strictly before `now`; returns how many were removed.
    async fn prune_before(&self, team: &TeamCode, now: i64) -> Result<u64, StoreError>;
}
