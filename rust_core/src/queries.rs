//! Read side for callers outside the pipeline (an HTTP layer, a CLI).
//!
//! Thin pass-throughs over the store and the upcoming index.

use crate::error::{IngestError, StoreError};
use crate::matching::TeamResolver;
use crate::models::{GameFields, GameKey};
use crate::reconcile::Reconciler;
use crate::store::GameStore;
use crate::upcoming::UpcomingGames;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingGame {
    pub key: GameKey,
    pub fields: GameFields,
}

#[derive(Clone)]
pub struct GameQueries {
    resolver: TeamResolver,
    store: Arc<dyn GameStore>,
    upcoming: UpcomingGames,
}

impl GameQueries {
    pub fn new(resolver: TeamResolver, store: Arc<dyn GameStore>, upcoming: UpcomingGames) -> Self {
        Self {
            resolver,
            store,
            upcoming,
        }
    }

    /// Share the reconciler's collaborators.
    pub fn from_reconciler(reconciler: &Reconciler) -> Self {
        Self::new(
            reconciler.resolver().clone(),
            reconciler.store().clone(),
            reconciler.upcoming().clone(),
        )
    }

    /// Next `limit` home games for `team` (any known alias), with their projections.
    ///
    /// Index entries whose projection has disappeared are skipped.
    pub async fn upcoming_games(
        &self,
        team: &str,
        limit: usize,
    ) -> Result<Vec<UpcomingGame>, IngestError> {
        let code = self.resolver.resolve_exact(team)?;
        let keys = self.upcoming.query(&code, limit).await?;

        let mut games = Vec::with_capacity(keys.len());
        for key in keys {
            match self.store.read(&key).await? {
                Some(fields) => games.push(UpcomingGame { key, fields }),
                None => debug!(game_key = %key, "Index entry without projection"),
            }
        }
        Ok(games)
    }

    pub async fn game_exists(&self, key: &GameKey) -> Result<bool, StoreError> {
        self.store.exists(key).await
    }
}
