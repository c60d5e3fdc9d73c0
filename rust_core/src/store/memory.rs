//! In-process Game Store and Upcoming Index.
//!
//! Each operation takes one short `parking_lot` lock, which gives the same
//! per-operation atomicity as a single Redis command.

use super::{GameStore, UpcomingIndex};
use crate::error::StoreError;
use crate::models::{GameFields, GameKey, TeamCode};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct MemoryGameStore {
    games: RwLock<HashMap<GameKey, GameFields>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.read().is_empty()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn seed_or_update(&self, key: &GameKey, fields: &GameFields) -> Result<(), StoreError> {
        let mut games = self.games.write();
        let projection = games.entry(key.clone()).or_default();
        for (name, value) in fields {
            projection.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    async fn exists(&self, key: &GameKey) -> Result<bool, StoreError> {
        Ok(self.games.read().contains_key(key))
    }

    async fn read(&self, key: &GameKey) -> Result<Option<GameFields>, StoreError> {
        Ok(self.games.read().get(key).cloned())
    }
}

#[derive(Debug, Default)]
struct TeamIndex {
    /// Ordered by (epoch, key); key order breaks ties
    ordered: BTreeSet<(i64, GameKey)>,
    /// key -> epoch, so re-adding a key moves it instead of duplicating it
    scores: HashMap<GameKey, i64>,
}

#[derive(Debug, Default)]
pub struct MemoryUpcomingIndex {
    teams: RwLock<HashMap<TeamCode, TeamIndex>>,
}

impl MemoryUpcomingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry for `team`, including past ones, ascending by start.
    pub fn entries(&self, team: &TeamCode) -> Vec<(GameKey, i64)> {
        self.teams
            .read()
            .get(team)
            .map(|index| {
                index
                    .ordered
                    .iter()
                    .map(|(epoch, key)| (key.clone(), *epoch))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl UpcomingIndex for MemoryUpcomingIndex {
    async fn add(&self, team: &TeamCode, key: &GameKey, epoch: i64) -> Result<(), StoreError> {
        let mut teams = self.teams.write();
        let index = teams.entry(team.clone()).or_default();
        if let Some(previous) = index.scores.insert(key.clone(), epoch) {
            index.ordered.remove(&(previous, key.clone()));
        }
        index.ordered.insert((epoch, key.clone()));
        Ok(())
    }

    async fn query_from(
        &self,
        team: &TeamCode,
        now: i64,
        limit: usize,
    ) -> Result<Vec<GameKey>, StoreError> {
        let teams = self.teams.read();
        let Some(index) = teams.get(team) else {
            return Ok(Vec::new());
        };
        Ok(index
            .ordered
            .iter()
            .filter(|(epoch, _)| *epoch >= now)
            .take(limit)
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn prune_before(&self, team: &TeamCode, now: i64) -> Result<u64, StoreError> {
        let mut teams = self.teams.write();
        let Some(index) = teams.get_mut(team) else {
            return Ok(0);
        };

        let TeamIndex { ordered, scores } = index;
        let before = ordered.len();
        ordered.retain(|(epoch, key)| {
            let keep = *epoch >= now;
            if !keep {
                scores.remove(key);
            }
            keep
        });
        Ok((before - ordered.len()) as u64)
    }
}
