//! Market-data feed: subscriber registry and the periodic snapshot publisher.
//!
//! The registry is an explicit object owned by the transport layer and
//! injected into both the WebSocket handler and [`run_publisher`]; the
//! publisher carries a shutdown signal so it stops deterministically instead
//! of dying with the process.

use crate::aggregator::BookSnapshot;
use crate::engine::Exchange;
use crate::types::InstrumentId;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// One message pushed to book subscribers: a tagged depth snapshot.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FeedMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub snapshot: BookSnapshot,
}

impl FeedMessage {
    pub fn snapshot(snapshot: BookSnapshot) -> Self {
        Self {
            kind: "snapshot".into(),
            snapshot,
        }
    }
}

/// Registry of market-data subscribers, keyed by instrument.
///
/// Clones share the same backing map. Subscribers whose receiving end has
/// gone away are pruned on the next broadcast.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<HashMap<InstrumentId, Vec<mpsc::UnboundedSender<String>>>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber for one instrument and returns its stream.
    pub fn subscribe(&self, instrument_id: InstrumentId) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .lock()
            .expect("lock")
            .entry(instrument_id)
            .or_default()
            .push(tx);
        rx
    }

    /// Sends `message` to every live subscriber of `instrument_id`, dropping
    /// the dead ones. Returns the number of live subscribers after the send.
    pub fn broadcast(&self, instrument_id: InstrumentId, message: &str) -> usize {
        let mut inner = self.inner.lock().expect("lock");
        let Some(subscribers) = inner.get_mut(&instrument_id) else {
            return 0;
        };
        subscribers.retain(|tx| tx.send(message.to_string()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self, instrument_id: InstrumentId) -> usize {
        self.inner
            .lock()
            .expect("lock")
            .get(&instrument_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Serializes one snapshot message for an instrument, or None if the
/// instrument is unknown.
pub fn snapshot_message(
    exchange: &Exchange,
    instrument_id: InstrumentId,
    depth: usize,
) -> Option<String> {
    let snapshot = exchange.snapshot(instrument_id, depth).ok()?;
    serde_json::to_string(&FeedMessage::snapshot(snapshot)).ok()
}

/// Periodic publisher: every `interval`, snapshots each instrument that has
/// at least one subscriber and broadcasts the result. Runs until `shutdown`
/// flips to true (or its sender is dropped).
pub async fn run_publisher(
    exchange: Arc<Exchange>,
    registry: SubscriberRegistry,
    interval: Duration,
    depth: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for instrument in exchange.instruments() {
                    if registry.subscriber_count(instrument.id) == 0 {
                        continue;
                    }
                    if let Some(message) = snapshot_message(&exchange, instrument.id, depth) {
                        registry.broadcast(instrument.id, &message);
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("book publisher stopped");
                    break;
                }
            }
        }
    }
}
