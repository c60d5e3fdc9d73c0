//! Decode, resolve, gate and merge one fact into the shared projection.
//!
//! Seeding facts (tickets) create the projection and register the game in the home
//! team's upcoming index. Update-only facts (odds) must find an existing projection,
//! otherwise they are discarded as [`IngestError::GameNotFound`].

use crate::error::IngestError;
use crate::facts::{self, ResolvedFact};
use crate::identity::GameKeyBuilder;
use crate::matching::TeamResolver;
use crate::models::{GameKey, Topic};
use crate::store::GameStore;
use crate::upcoming::UpcomingGames;
use std::sync::Arc;
use tracing::debug;

/// Outcome of a successfully applied fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub topic: Topic,
    pub key: GameKey,
    pub fields_written: usize,
}

#[derive(Clone)]
pub struct Reconciler {
    resolver: TeamResolver,
    keys: GameKeyBuilder,
    store: Arc<dyn GameStore>,
    upcoming: UpcomingGames,
}

impl Reconciler {
    pub fn new(
        resolver: TeamResolver,
        keys: GameKeyBuilder,
        store: Arc<dyn GameStore>,
        upcoming: UpcomingGames,
    ) -> Self {
        Self {
            resolver,
            keys,
            store,
            upcoming,
        }
    }

    pub fn resolver(&self) -> &TeamResolver {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    pub fn upcoming(&self) -> &UpcomingGames {
        &self.upcoming
    }

    /// Apply one raw message from `topic`.
    pub async fn apply(&self, topic: Topic, payload: &[u8]) -> Result<Applied, IngestError> {
        let fact = facts::decode(topic, payload)?;
        let resolved = fact.resolve(&self.resolver, &self.keys)?;
        self.merge(resolved).await
    }

    /// Gate and merge an already resolved fact.
    pub async fn merge(&self, fact: ResolvedFact) -> Result<Applied, IngestError> {
        if !fact.is_seeding() && !self.store.exists(&fact.key).await? {
            return Err(IngestError::GameNotFound(fact.key));
        }

        self.store.seed_or_update(&fact.key, &fact.fields).await?;

        if fact.is_seeding() {
            self.upcoming
                .register(&fact.home, &fact.key, fact.start)
                .await?;
        }

        debug!(
            topic = %fact.topic,
            game_key = %fact.key,
            fields = fact.fields.len(),
            "Fact applied"
        );

        Ok(Applied {
            topic: fact.topic,
            key: fact.key,
            fields_written: fact.fields.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::matching::TeamVocabulary;
    use crate::models::{GameFields, TeamCode};
    use crate::store::{MemoryGameStore, MemoryUpcomingIndex};
    use crate::upcoming::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    const TICKET: &[u8] = br#"{"event_name":"Atlanta Hawks vs Miami Heat","start_date_time":"2025-02-25T00:30:00Z","min_ticket_price":25,"venue_name":"State Farm Arena"}"#;
    const ODDS: &[u8] = br#"{"away_team":"Miami Heat","home_team":"Atlanta Hawks","start_time":"2025-02-25T00:30:00Z","betting_prices":{"Atlanta Hawks":"-110"}}"#;

    struct Harness {
        reconciler: Reconciler,
        store: Arc<MemoryGameStore>,
        index: Arc<MemoryUpcomingIndex>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryGameStore::new());
        let index = Arc::new(MemoryUpcomingIndex::new());
        let clock = Arc::new(FixedClock::new(Utc.timestamp_opt(1_740_000_000, 0).unwrap()));
        let reconciler = Reconciler::new(
            TeamResolver::new(Arc::new(TeamVocabulary::nba())),
            GameKeyBuilder::utc(),
            store.clone(),
            UpcomingGames::new(index.clone(), clock),
        );
        Harness {
            reconciler,
            store,
            index,
        }
    }

    #[tokio::test]
    async fn test_ticket_seeds_and_registers() {
        let h = harness();
        let applied = h.reconciler.apply(Topic::Tickets, TICKET).await.unwrap();
        assert_eq!(applied.key.as_str(), "ATL MIA 02.25.2025");
        assert_eq!(applied.fields_written, 5);

        assert!(h.store.exists(&applied.key).await.unwrap());
        assert_eq!(
            h.index.entries(&TeamCode::new("ATL")),
            vec![(applied.key.clone(), 1_740_443_400)]
        );
    }

    #[tokio::test]
    async fn test_odds_without_seed_is_gated() {
        let h = harness();
        let err = h.reconciler.apply(Topic::Odds, ODDS).await.unwrap_err();
        assert!(matches!(err, IngestError::GameNotFound(ref key) if key.as_str() == "ATL MIA 02.25.2025"));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_odds_merge_into_seeded_game() {
        let h = harness();
        h.reconciler.apply(Topic::Tickets, TICKET).await.unwrap();
        let applied = h.reconciler.apply(Topic::Odds, ODDS).await.unwrap();

        let projection = h.store.read(&applied.key).await.unwrap().unwrap();
        assert_eq!(projection["home_team_odds"], "-110");
        assert_eq!(projection["venue"], "State Farm Arena");
        // Odds do not touch the index
        assert_eq!(h.index.entries(&TeamCode::new("ATL")).len(), 1);
    }

    #[tokio::test]
    async fn test_not_yet_supported_is_returned() {
        let h = harness();
        assert!(matches!(
            h.reconciler.apply(Topic::Injuries, b"{}").await,
            Err(IngestError::NotYetSupported(Topic::Injuries))
        ));
    }

    struct DownStore;

    #[async_trait]
    impl GameStore for DownStore {
        async fn seed_or_update(&self, _: &GameKey, _: &GameFields) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn exists(&self, _: &GameKey) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn read(&self, _: &GameKey) -> Result<Option<GameFields>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_retryable() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let reconciler = Reconciler::new(
            TeamResolver::new(Arc::new(TeamVocabulary::nba())),
            GameKeyBuilder::utc(),
            Arc::new(DownStore),
            UpcomingGames::new(Arc::new(MemoryUpcomingIndex::new()), clock),
        );
        let err = reconciler.apply(Topic::Tickets, TICKET).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
