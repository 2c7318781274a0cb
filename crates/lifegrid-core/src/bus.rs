//! Per-session fan-out of snapshots.
//!
//! Each session id is a topic backed by its own `tokio::sync::broadcast`
//! channel. Delivery is at-most-once per subscriber per publish and there
//! is no replay: a subscriber that lags must fetch the current state to
//! resynchronize.
//!
//! Only the publisher side opens topics. Subscribing to a topic that is
//! not open yields a stream that is already at its end, so a late
//! subscriber of an ended session never leaves a topic behind.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use lifegrid_types::{SessionId, Snapshot};
use tokio::sync::broadcast;

/// Topic registry shared by actors (publishers) and observers (subscribers).
///
/// Cloning is cheap and every clone addresses the same topics.
#[derive(Debug, Clone)]
pub struct SnapshotBus {
    topics: Arc<RwLock<BTreeMap<SessionId, broadcast::Sender<Snapshot>>>>,
    capacity: usize,
}

impl SnapshotBus {
    /// A bus whose topics each buffer up to `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(BTreeMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Open a topic for publishing. Existing subscribers of an already
    /// open topic keep their stream.
    pub fn open(&self, topic: SessionId) {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        topics
            .entry(topic)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
    }

    /// Subscribe to an open topic.
    ///
    /// For a topic that is not open the returned receiver reports
    /// `Closed` on its first `recv`.
    pub fn subscribe(&self, topic: SessionId) -> broadcast::Receiver<Snapshot> {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics.get(&topic).map_or_else(
            || broadcast::channel(1).1,
            broadcast::Sender::subscribe,
        )
    }

    /// Deliver a snapshot to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers reached; zero when the topic has
    /// none or does not exist.
    pub fn publish(&self, topic: SessionId, snapshot: Snapshot) -> usize {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics
            .get(&topic)
            .and_then(|sender| sender.send(snapshot).ok())
            .unwrap_or(0)
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: SessionId) -> usize {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        topics
            .get(&topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Number of open topics.
    pub fn topic_count(&self) -> usize {
        self.topics.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop a topic. Its subscribers observe end-of-stream once they have
    /// drained buffered snapshots. Returns whether the topic existed.
    pub fn close(&self, topic: SessionId) -> bool {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        topics.remove(&topic).is_some()
    }
}
