//! Latest-value snapshot broadcast.
//!
//! The snapshot lives inside a `tokio::sync::watch` channel: every tick
//! applies its update with a single `send_modify`, so pulls see it as soon as
//! the tick returns and subscribers are woken in tick-completion order. A
//! subscriber that falls behind skips straight to the newest snapshot.

use std::sync::Arc;

use fleet_domain::{Snapshot, TruckFeature};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

/// Receiver half handed to pull/await consumers.
pub type SnapshotReceiver = watch::Receiver<Snapshot>;

/// Shared handle to the fleet snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotBroadcaster {
    tx: Arc<watch::Sender<Snapshot>>,
}

impl SnapshotBroadcaster {
    #[must_use]
    pub fn new(initial: Snapshot) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Point-in-time copy of the snapshot.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Write one truck's feature and wake subscribers.
    pub fn publish(&self, feature: TruckFeature) {
        let truck_id = feature.id;
        self.tx.send_modify(|snapshot| snapshot.upsert(feature));
        trace!(truck_id, subscribers = self.tx.receiver_count(), "Snapshot published");
    }

    /// Receiver that observes every snapshot published from now on.
    #[must_use]
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.tx.subscribe()
    }

    /// Run `callback` on the runtime for every new snapshot until the
    /// returned [`Subscription`] is dropped or unsubscribed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe_with<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&Snapshot) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                callback(&snapshot);
            }
        });
        Subscription { handle }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Unsubscribe handle for [`SnapshotBroadcaster::subscribe_with`].
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivering snapshots to the callback.
    pub fn unsubscribe(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
