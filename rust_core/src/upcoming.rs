//! Upcoming-games facade: the index collaborator plus a notion of "now".

use crate::error::StoreError;
use crate::models::{GameKey, TeamCode};
use crate::store::UpcomingIndex;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

#[derive(Clone)]
pub struct UpcomingGames {
    index: Arc<dyn UpcomingIndex>,
    clock: Arc<dyn Clock>,
}

impl UpcomingGames {
    pub fn new(index: Arc<dyn UpcomingIndex>, clock: Arc<dyn Clock>) -> Self {
        Self { index, clock }
    }

    /// Insert or move `key` in `home`'s index.
    pub async fn register(
        &self,
        home: &TeamCode,
        key: &GameKey,
        start: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.index.add(home, key, start.timestamp()).await
    }

    /// Next `limit` games for `home` starting at or after now.
    pub async fn query(&self, home: &TeamCode, limit: usize) -> Result<Vec<GameKey>, StoreError> {
        self.index
            .query_from(home, self.clock.now().timestamp(), limit)
            .await
    }

    /// Drop `home`'s games that started before now. Projections are left alone.
    pub async fn prune(&self, home: &TeamCode) -> Result<u64, StoreError> {
        let removed = self
            .index
            .prune_before(home, self.clock.now().timestamp())
            .await?;
        if removed > 0 {
            debug!(team = %home, removed, "Pruned past games");
        }
        Ok(removed)
    }

    /// Prune every team, stopping at the first store failure.
    pub async fn prune_all(&self, teams: &[TeamCode]) -> Result<u64, StoreError> {
        let mut total = 0;
        for team in teams {
            total += self.prune(team).await?;
        }
        Ok(total)
    }
}
