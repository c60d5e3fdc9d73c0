//! Pipeline driver: one task per topic plus the periodic index pruner.
//!
//! Everything observes a single [`CancellationToken`]. `run` returns only after every
//! task has exited.

use crate::consumer::{ConsumerReport, TopicConsumer};
use crate::models::Topic;
use crate::reconcile::Reconciler;
use crate::transport::MessageSource;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct Pipeline {
    reconciler: Arc<Reconciler>,
    sources: Vec<(Topic, Box<dyn MessageSource>)>,
    prune_interval: Option<Duration>,
}

impl Pipeline {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self {
            reconciler,
            sources: Vec::new(),
            prune_interval: None,
        }
    }

    /// Attach the source for `topic`. One consumer task runs per attached source.
    pub fn with_source(mut self, topic: Topic, source: Box<dyn MessageSource>) -> Self {
        self.sources.push((topic, source));
        self
    }

    /// Prune every team's upcoming index on this period. Zero disables pruning.
    pub fn with_prune_interval(mut self, interval: Duration) -> Self {
        self.prune_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Run until `cancel` fires (or every source closes) and return per-topic reports.
    pub async fn run(self, cancel: CancellationToken) -> Vec<ConsumerReport> {
        info!(
            topics = self.sources.len(),
            prune_interval = ?self.prune_interval,
            "Starting ingestion pipeline"
        );

        let pruner = self
            .prune_interval
            .map(|interval| spawn_pruner(self.reconciler.clone(), interval, cancel.clone()));

        let consumers: Vec<JoinHandle<ConsumerReport>> = self
            .sources
            .into_iter()
            .map(|(topic, source)| {
                let consumer = TopicConsumer::new(topic, source, self.reconciler.clone());
                tokio::spawn(consumer.run(cancel.clone()))
            })
            .collect();

        let mut reports = Vec::with_capacity(consumers.len());
        for result in join_all(consumers).await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => error!("Consumer task failed: {}", e),
            }
        }

        // Consumers can also stop because their sources closed; the pruner only stops on cancel
        cancel.cancel();
        if let Some(pruner) = pruner {
            if let Err(e) = pruner.await {
                error!("Pruner task failed: {}", e);
            }
        }

        info!("Ingestion pipeline stopped");
        reports
    }
}

fn spawn_pruner(
    reconciler: Arc<Reconciler>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let teams = reconciler.resolver().vocabulary().codes().to_vec();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match reconciler.upcoming().prune_all(&teams).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Pruned past games from upcoming index"),
                Err(e) => warn!("Upcoming index prune failed: {}", e),
            }
        }
    })
}
