//! Per-topic consumer loop.
//!
//! Pulls deliveries from one [`MessageSource`], applies each through the
//! [`Reconciler`] and settles it with the transport:
//! - applied, or failed for a reason redelivery cannot fix: ack
//! - store unavailable: reject, so the transport can redeliver
//!
//! No per-message outcome stops the loop. Only cancellation or a closed source does.
//! Cancellation is checked before every receive, so nothing new is taken after it.

use crate::error::IngestError;
use crate::models::Topic;
use crate::reconcile::Reconciler;
use crate::transport::{Delivery, MessageSource};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pause after the source itself fails, before asking it again
const SOURCE_ERROR_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct ConsumerStats {
    pub received: AtomicU64,
    pub applied: AtomicU64,
    /// Permanently unprocessable messages (acked)
    pub skipped: AtomicU64,
    /// Transient failures (rejected)
    pub failed: AtomicU64,
}

impl ConsumerStats {
    pub fn snapshot(&self, topic: Topic) -> ConsumerReport {
        ConsumerReport {
            topic,
            received: self.received.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    pub topic: Topic,
    pub received: u64,
    pub applied: u64,
    pub skipped: u64,
    pub failed: u64,
}

pub struct TopicConsumer {
    topic: Topic,
    source: Box<dyn MessageSource>,
    reconciler: Arc<Reconciler>,
    stats: ConsumerStats,
}

impl TopicConsumer {
    pub fn new(topic: Topic, source: Box<dyn MessageSource>, reconciler: Arc<Reconciler>) -> Self {
        Self {
            topic,
            source,
            reconciler,
            stats: ConsumerStats::default(),
        }
    }

    /// Consume until `cancel` fires or the source closes.
    pub async fn run(mut self, cancel: CancellationToken) -> ConsumerReport {
        info!(topic = %self.topic, "Consumer started");

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = self.source.next() => next,
            };

            match next {
                Ok(Some(delivery)) => self.handle(delivery).await,
                Ok(None) => {
                    info!(topic = %self.topic, "Source closed");
                    break;
                }
                Err(e) => {
                    error!(topic = %self.topic, "Source error: {:#}", e);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(SOURCE_ERROR_PAUSE) => {}
                    }
                }
            }
        }

        let report = self.stats.snapshot(self.topic);
        info!(
            topic = %self.topic,
            received = report.received,
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            "Consumer stopped"
        );
        report
    }

    async fn handle(&mut self, delivery: Delivery) {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let settle = match self.reconciler.apply(self.topic, &delivery.payload).await {
            Ok(applied) => {
                self.stats.applied.fetch_add(1, Ordering::Relaxed);
                debug!(
                    topic = %self.topic,
                    id = %delivery.id,
                    game_key = %applied.key,
                    "Message applied"
                );
                self.source.ack(&delivery.id).await
            }
            Err(e) if e.is_retryable() => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(topic = %self.topic, id = %delivery.id, "Message not applied: {}", e);
                self.source.reject(&delivery.id).await
            }
            Err(e) => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                self.log_skip(&delivery, &e);
                self.source.ack(&delivery.id).await
            }
        };

        if let Err(e) = settle {
            warn!(topic = %self.topic, id = %delivery.id, "Failed to settle message: {:#}", e);
        }
    }

    fn log_skip(&self, delivery: &Delivery, err: &IngestError) {
        match err {
            IngestError::GameNotFound(key) => {
                info!(topic = %self.topic, id = %delivery.id, game_key = %key, "Skipped fact for untracked game");
            }
            IngestError::NotYetSupported(_) => {
                info!(topic = %self.topic, id = %delivery.id, "Skipped: {}", err);
            }
            IngestError::TeamResolution { text, .. } => {
                match self.reconciler.resolver().closest_alias(text) {
                    Some((alias, code)) => warn!(
                        topic = %self.topic,
                        id = %delivery.id,
                        text = %text,
                        suggestion = %alias,
                        suggested_code = %code,
                        "Skipped: {}",
                        err
                    ),
                    None => warn!(topic = %self.topic, id = %delivery.id, text = %text, "Skipped: {}", err),
                }
            }
            _ => {
                warn!(topic = %self.topic, id = %delivery.id, "Skipped: {}", err);
            }
        }
    }
}
