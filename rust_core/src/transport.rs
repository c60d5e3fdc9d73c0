//! Message transport seam: one [`MessageSource`] per topic.
//!
//! A source yields opaque payloads with a transport id and takes an explicit
//! acknowledge or reject for each one. Redelivery of rejected messages is up to the
//! transport (see [`crate::redis::streams`]).

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message. `Ok(None)` means the source is closed for good.
    ///
    /// Must be cancel-safe: the consumer drops this future on shutdown.
    async fn next(&mut self) -> Result<Option<Delivery>>;

    /// Processing finished (applied or permanently skipped)
    async fn ack(&mut self, id: &str) -> Result<()>;

    /// Processing failed transiently; leave the message for redelivery.
    async fn reject(&mut self, id: &str) -> Result<()>;
}

/// Acks and rejects recorded by a [`ChannelSource`].
#[derive(Debug, Clone, Default)]
pub struct AckLedger {
    inner: Arc<Mutex<LedgerEntries>>,
}

#[derive(Debug, Default)]
struct LedgerEntries {
    acked: Vec<String>,
    rejected: Vec<String>,
}

impl AckLedger {
    pub fn acked(&self) -> Vec<String> {
        self.inner.lock().acked.clone()
    }

    pub fn rejected(&self) -> Vec<String> {
        self.inner.lock().rejected.clone()
    }
}

/// In-process source over a tokio mpsc channel.
///
/// Ids are the 1-based delivery sequence number. The source closes once every sender
/// has been dropped and the buffer is drained.
pub struct ChannelSource {
    receiver: mpsc::Receiver<Vec<u8>>,
    sequence: u64,
    ledger: AckLedger,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            sender,
            Self {
                receiver,
                sequence: 0,
                ledger: AckLedger::default(),
            },
        )
    }

    pub fn ledger(&self) -> AckLedger {
        self.ledger.clone()
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    async fn next(&mut self) -> Result<Option<Delivery>> {
        Ok(self.receiver.recv().await.map(|payload| {
            self.sequence += 1;
            Delivery {
                id: self.sequence.to_string(),
                payload,
            }
        }))
    }

    async fn ack(&mut self, id: &str) -> Result<()> {
        self.ledger.inner.lock().acked.push(id.to_string());
        Ok(())
    }

    async fn reject(&mut self, id: &str) -> Result<()> {
        self.ledger.inner.lock().rejected.push(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_sequence_and_close() {
        let (sender, mut source) = ChannelSource::new(4);
        sender.send(b"first".to_vec()).await.unwrap();
        sender.send(b"second".to_vec()).await.unwrap();
        drop(sender);

        let first = source.next().await.unwrap().unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(first.payload, b"first");
        let second = source.next().await.unwrap().unwrap();
        assert_eq!(second.id, "2");
        assert!(source.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_channel_source_ledger() {
        let (_sender, mut source) = ChannelSource::new(1);
        let ledger = source.ledger();

        source.ack("1").await.unwrap();
        source.reject("2").await.unwrap();
        source.ack("3").await.unwrap();

        assert_eq!(ledger.acked(), vec!["1", "3"]);
        assert_eq!(ledger.rejected(), vec!["2"]);
    }
}
