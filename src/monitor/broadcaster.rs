//! Snapshot fan-out to connected observers
//!
//! One registry for every observer; no per-observer timers. The latest
//! snapshot is replaced atomically and every subscriber receives the same
//! `Arc`, so all observers see an identical inventory per cycle. Subscribe
//! and publish hold the same registry lock, so a joining observer either
//! gets the current snapshot immediately or is already registered for the
//! publish that races with the join, never both and never neither.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::debug;

use super::inventory::Inventory;

pub struct Subscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<Arc<Inventory>>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<Arc<Inventory>> {
        self.receiver.recv().await
    }

    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<Arc<Inventory>> {
        self.receiver.try_recv().ok()
    }
}

pub struct Broadcaster {
    latest: RwLock<Option<Arc<Inventory>>>,
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<Arc<Inventory>>>>,
    next_id: AtomicU64,
    // Weak so the poller task (which owns this broadcaster through the
    // poller) does not keep its own refresh channel open forever.
    refresh_tx: mpsc::WeakUnboundedSender<()>,
}

impl Broadcaster {
    pub fn new(refresh_tx: mpsc::WeakUnboundedSender<()>) -> Self {
        Self {
            latest: RwLock::new(None),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            refresh_tx,
        }
    }

    /// Register an observer. If a snapshot already exists it is delivered
    /// immediately; otherwise an on-demand poll is requested so the observer
    /// receives the first successful snapshot instead of waiting for the
    /// next periodic tick.
    pub async fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscribers = self.subscribers.lock().await;
        match self.latest.read().await.as_ref() {
            Some(inventory) => {
                let _ = sender.send(inventory.clone());
            }
            None => {
                self.request_refresh();
            }
        }
        subscribers.insert(id, sender);
        debug!(subscriber_id = id, "observer subscribed");

        Subscription { id, receiver }
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.lock().await.remove(&subscription.id);
        debug!(subscriber_id = subscription.id, "observer unsubscribed");
    }

    /// Replace the latest snapshot and fan it out. Subscribers whose channel
    /// has closed are pruned here.
    pub async fn publish(&self, inventory: Arc<Inventory>) {
        let mut subscribers = self.subscribers.lock().await;
        *self.latest.write().await = Some(inventory.clone());
        subscribers.retain(|_, sender| sender.send(inventory.clone()).is_ok());
    }

    pub async fn latest(&self) -> Option<Arc<Inventory>> {
        self.latest.read().await.clone()
    }

    /// Ask the poller for an out-of-band cycle. A no-op once the poller has
    /// shut down.
    pub fn request_refresh(&self) {
        if let Some(sender) = self.refresh_tx.upgrade() {
            let _ = sender.send(());
        }
    }
}
