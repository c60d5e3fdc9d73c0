//! Redis-backed Game Store and Upcoming Index.
//!
//! Projections are hashes at `{prefix}{game key}`; each team's upcoming home games live in
//! a sorted set `team:{CODE}:upcoming_home_games` scored by start epoch seconds.

use crate::error::StoreError;
use crate::models::{GameFields, GameKey, TeamCode};
use crate::store::{GameStore, UpcomingIndex};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;

pub const DEFAULT_GAME_KEY_PREFIX: &str = "game:";

pub fn upcoming_index_key(team: &TeamCode) -> String {
    format!("team:{}:upcoming_home_games", team)
}

/// Open a managed connection shared by the store and the index.
pub async fn connect(client: &Client) -> Result<ConnectionManager, StoreError> {
    Ok(ConnectionManager::new(client.clone()).await?)
}

#[derive(Clone)]
pub struct RedisGameStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisGameStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self::with_prefix(conn, DEFAULT_GAME_KEY_PREFIX)
    }

    pub fn with_prefix(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn hash_key(&self, key: &GameKey) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl GameStore for RedisGameStore {
    async fn seed_or_update(&self, key: &GameKey, fields: &GameFields) -> Result<(), StoreError> {
        // HSET with no field/value pairs is a syntax error
        if fields.is_empty() {
            return Ok(());
        }
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let mut conn = self.conn.clone();
        conn.hset_multiple::<_, _, _, ()>(self.hash_key(key), &items)
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &GameKey) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(self.hash_key(key)).await?)
    }

    async fn read(&self, key: &GameKey) -> Result<Option<GameFields>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn.hgetall(self.hash_key(key)).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(raw.into_iter().collect()))
    }
}

#[derive(Clone)]
pub struct RedisUpcomingIndex {
    conn: ConnectionManager,
}

impl RedisUpcomingIndex {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl UpcomingIndex for RedisUpcomingIndex {
    async fn add(&self, team: &TeamCode, key: &GameKey, epoch: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(upcoming_index_key(team), key.as_str(), epoch)
            .await?;
        Ok(())
    }

    async fn query_from(
        &self,
        team: &TeamCode,
        now: i64,
        limit: usize,
    ) -> Result<Vec<GameKey>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .zrangebyscore_limit(upcoming_index_key(team), now, "+inf", 0, limit as isize)
            .await?;
        Ok(keys.into_iter().map(GameKey::from_stored).collect())
    }

    async fn prune_before(&self, team: &TeamCode, now: i64) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        // Exclusive upper bound: a game starting exactly now is kept
        let removed: u64 = conn
            .zrembyscore(upcoming_index_key(team), "-inf", format!("({}", now))
            .await?;
        Ok(removed)
    }
}
