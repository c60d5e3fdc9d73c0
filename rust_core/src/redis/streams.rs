//! Redis Streams transport with consumer groups and reconnect backoff.
//!
//! Each topic is a stream read through `XREADGROUP`. On start a source first replays
//! its own pending entries (delivered before a crash or rejected, never acked), then
//! switches to new entries. `ack` is `XACK`; `reject` leaves the entry pending so it is
//! replayed on the next start.

use crate::transport::{Delivery, MessageSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client};
use std::collections::VecDeque;
use rand::Rng;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Field of each stream entry holding the raw message
pub const PAYLOAD_FIELD: &str = "payload";

/// How long a stream source waits after a failed `XREADGROUP` before reading again.
///
/// The wait doubles with each consecutive failure and resets on the first good read.
/// Set through `REDIS_RECONNECT_BASE_DELAY_MS`, `REDIS_RECONNECT_MAX_DELAY_MS` and
/// `REDIS_RECONNECT_JITTER_PCT`.
#[derive(Clone, Debug)]
pub struct ReconnectConfig {
    /// Wait after the first failure
    pub base_delay_ms: u64,
    /// Upper bound on the doubled wait
    pub max_delay_ms: u64,
    /// Share of the wait randomized up or down
    pub jitter_pct: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_pct: 0.1,
        }
    }
}

impl ReconnectConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_delay_ms: std::env::var("REDIS_RECONNECT_BASE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.base_delay_ms),
            max_delay_ms: std::env::var("REDIS_RECONNECT_MAX_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_delay_ms),
            jitter_pct: std::env::var("REDIS_RECONNECT_JITTER_PCT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.jitter_pct),
        }
    }

    /// Wait before the next read after `attempt` failures in a row (1-based).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(30);
        let wait_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << doublings)
            .min(self.max_delay_ms);

        let spread = (wait_ms as f64 * self.jitter_pct.clamp(0.0, 1.0)) as i64;
        let offset = if spread > 0 {
            rand::thread_rng().gen_range(-spread..=spread)
        } else {
            0
        };

        Duration::from_millis(wait_ms.saturating_add_signed(offset))
    }
}

#[derive(Debug, Default)]
pub struct ReadStats {
    pub failed_reads: AtomicU64,
    pub recoveries: AtomicU64,
    pub consecutive_failures: AtomicU32,
}

impl ReadStats {
    /// Returns the new consecutive failure count
    fn record_failure(&self) -> u32 {
        self.failed_reads.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns true if this success ended a failure streak
    fn record_success(&self) -> bool {
        let streak = self.consecutive_failures.swap(0, Ordering::Relaxed);
        if streak > 0 {
            self.recoveries.fetch_add(1, Ordering::Relaxed);
        }
        streak > 0
    }
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub stream: String,
    pub group: String,
    pub consumer: String,
    pub block_ms: usize,
    pub batch_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReadCursor {
    /// Replaying this consumer's pending entries after the given id
    Pending(String),
    /// Reading entries never delivered to the group (`>`)
    New,
}

impl ReadCursor {
    fn id(&self) -> &str {
        match self {
            ReadCursor::Pending(id) => id,
            ReadCursor::New => ">",
        }
    }
}

pub struct RedisStreamSource {
    conn: ConnectionManager,
    settings: StreamSettings,
    reconnect: ReconnectConfig,
    stats: ReadStats,
    cursor: ReadCursor,
    buffered: VecDeque<Delivery>,
}

impl RedisStreamSource {
    /// Open a dedicated connection and make sure the consumer group exists.
    ///
    /// The connection is not shared: `XREADGROUP ... BLOCK` would stall other commands
    /// multiplexed on it.
    pub async fn connect(
        client: &Client,
        settings: StreamSettings,
        reconnect: ReconnectConfig,
    ) -> Result<Self> {
        let mut conn = ConnectionManager::new(client.clone())
            .await
            .with_context(|| format!("Failed to connect stream source for {}", settings.stream))?;

        ensure_group(&mut conn, &settings.stream, &settings.group).await?;
        info!(
            stream = %settings.stream,
            group = %settings.group,
            consumer = %settings.consumer,
            "Stream source ready"
        );

        Ok(Self {
            conn,
            settings,
            reconnect,
            stats: ReadStats::default(),
            cursor: ReadCursor::Pending("0".to_string()),
            buffered: VecDeque::new(),
        })
    }

    async fn read_batch(&mut self) -> redis::RedisResult<Vec<Delivery>> {
        let mut options = StreamReadOptions::default()
            .group(&self.settings.group, &self.settings.consumer)
            .count(self.settings.batch_size);
        if self.cursor == ReadCursor::New {
            options = options.block(self.settings.block_ms);
        }

        let reply: Option<StreamReadReply> = self
            .conn
            .xread_options(&[&self.settings.stream], &[self.cursor.id()], &options)
            .await?;

        let deliveries = reply
            .map(|reply| {
                reply
                    .keys
                    .into_iter()
                    .flat_map(|key| key.ids)
                    .map(|entry| Delivery {
                        // Trimmed entries come back without fields; they decode as malformed and get acked
                        payload: entry.get::<Vec<u8>>(PAYLOAD_FIELD).unwrap_or_default(),
                        id: entry.id,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(deliveries)
    }

    fn advance_cursor(&mut self, batch: &[Delivery]) {
        if let ReadCursor::Pending(_) = self.cursor {
            match batch.last() {
                Some(last) => self.cursor = ReadCursor::Pending(last.id.clone()),
                None => {
                    debug!(stream = %self.settings.stream, "Pending entries replayed");
                    self.cursor = ReadCursor::New;
                }
            }
        }
    }
}

async fn ensure_group(conn: &mut ConnectionManager, stream: &str, group: &str) -> Result<()> {
    let created: redis::RedisResult<()> = conn.xgroup_create_mkstream(stream, group, "0").await;
    match created {
        Ok(()) => {
            info!(stream, group, "Created consumer group");
            Ok(())
        }
        Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to create group {} on {}", group, stream)),
    }
}

#[async_trait]
impl MessageSource for RedisStreamSource {
    async fn next(&mut self) -> Result<Option<Delivery>> {
        loop {
            if let Some(delivery) = self.buffered.pop_front() {
                return Ok(Some(delivery));
            }

            match self.read_batch().await {
                Ok(batch) => {
                    if self.stats.record_success() {
                        info!(stream = %self.settings.stream, "Stream reads recovered");
                    }
                    self.advance_cursor(&batch);
                    self.buffered.extend(batch);
                }
                Err(e) => {
                    let attempt = self.stats.record_failure();
                    let delay = self.reconnect.calculate_delay(attempt);
                    warn!(
                        stream = %self.settings.stream,
                        attempt,
                        "Stream read failed: {}. Retrying in {:?}",
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn ack(&mut self, id: &str) -> Result<()> {
        let _: u64 = self
            .conn
            .xack(&self.settings.stream, &self.settings.group, &[id])
            .await
            .with_context(|| format!("Failed to ack {} on {}", id, self.settings.stream))?;
        Ok(())
    }

    async fn reject(&mut self, id: &str) -> Result<()> {
        debug!(stream = %self.settings.stream, id, "Left pending for redelivery");
        Ok(())
    }
}
