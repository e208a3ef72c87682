//! Subscriptions for published snapshot notifications.
//!
//! The distribution boundary lets a protocol layer subscribe to a
//! node and learn whenever a new snapshot is deposited for it:
//! - Unique subscription identifiers ([`SubscriptionId`])
//! - Subscriptions ([`Subscription`]) for receiving deposits
//! - Subscription bookkeeping ([`SubscriptionSet`]) used by the sink

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use fnv::FnvHashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use strato_core::NodeId;

use crate::snapshot::NodeSnapshot;

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Create a new unique subscription ID.
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric value of this subscription ID.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A subscription to one node's published snapshots.
///
/// Every snapshot deposited for the node after the subscription was
/// created is delivered through the channel, in deposit order. If the
/// subscriber falls behind the channel buffer, intermediate snapshots
/// are dropped and only newer ones are delivered.
#[derive(Debug)]
pub struct Subscription {
    /// Unique identifier for this subscription.
    id: SubscriptionId,
    /// Node this subscription is attached to.
    node: NodeId,
    /// Receiver for deposited snapshots.
    receiver: mpsc::Receiver<Arc<NodeSnapshot>>,
}

impl Subscription {
    /// Get the unique identifier for this subscription.
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Get the node this subscription is attached to.
    #[inline]
    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// Receive the next published snapshot.
    ///
    /// Returns `None` if the subscription has been cancelled.
    pub async fn recv(&mut self) -> Option<Arc<NodeSnapshot>> {
        self.receiver.recv().await
    }

    /// Try to receive a published snapshot without waiting.
    pub fn try_recv(&mut self) -> Result<Arc<NodeSnapshot>, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Sender half of a subscription, held by the sink.
#[derive(Debug, Clone)]
pub(crate) struct SubscriptionSender {
    id: SubscriptionId,
    sender: mpsc::Sender<Arc<NodeSnapshot>>,
}

impl SubscriptionSender {
    /// Try to deliver a snapshot without blocking.
    ///
    /// A full channel drops this delivery (the subscriber will see the
    /// next deposit instead). Returns `false` if the subscription is
    /// closed and should be reaped.
    fn try_send(&self, snapshot: Arc<NodeSnapshot>) -> bool {
        match self.sender.try_send(snapshot) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!(subscription = %self.id, "subscription channel full, skipping deposit");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Bookkeeping for active subscriptions.
///
/// Uses a `Mutex` internally but operations are fast (no I/O).
#[derive(Debug)]
pub(crate) struct SubscriptionSet {
    /// Map of node identity to active subscription senders.
    subscriptions: Mutex<FnvHashMap<NodeId, Vec<SubscriptionSender>>>,
    /// Channel buffer size for new subscriptions.
    channel_buffer: usize,
}

impl Default for SubscriptionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionSet {
    const DEFAULT_BUFFER: usize = 16;

    /// Create a new subscription set with default settings.
    pub(crate) fn new() -> Self {
        Self::with_buffer_size(Self::DEFAULT_BUFFER)
    }

    /// Create a new subscription set with a custom channel buffer size.
    pub(crate) fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            subscriptions: Mutex::new(FnvHashMap::default()),
            channel_buffer: buffer_size,
        }
    }

    /// Create a new subscription for a node.
    pub(crate) fn subscribe(&self, node: NodeId) -> Subscription {
        let id = SubscriptionId::next();
        let (sender, receiver) = mpsc::channel(self.channel_buffer);

        // Lock is held briefly, no I/O.
        {
            let mut subs = self.subscriptions.lock().expect("subscription lock poisoned");
            subs.entry(node.clone())
                .or_default()
                .push(SubscriptionSender { id, sender });
        }

        debug!(subscription = %id, node = %node, "created subscription");

        Subscription { id, node, receiver }
    }

    /// Cancel a subscription; it will receive no further deposits.
    pub(crate) fn cancel(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.lock().expect("subscription lock poisoned");

        for senders in subs.values_mut() {
            if let Some(pos) = senders.iter().position(|s| s.id == id) {
                senders.swap_remove(pos);
                debug!(subscription = %id, "cancelled subscription");
                return;
            }
        }

        warn!(subscription = %id, "attempted to cancel unknown subscription");
    }

    /// Deliver a deposited snapshot to all subscriptions for a node.
    ///
    /// Closed subscriptions are reaped automatically. Returns the
    /// number of deliveries attempted.
    pub(crate) fn notify(&self, node: &NodeId, snapshot: Arc<NodeSnapshot>) -> usize {
        // Clone senders while holding the lock briefly.
        let senders: Vec<SubscriptionSender> = {
            let subs = self.subscriptions.lock().expect("subscription lock poisoned");
            subs.get(node).cloned().unwrap_or_default()
        };

        if senders.is_empty() {
            return 0;
        }

        let mut closed_ids = Vec::new();
        for sender in &senders {
            if !sender.try_send(Arc::clone(&snapshot)) {
                closed_ids.push(sender.id);
            }
        }

        if !closed_ids.is_empty() {
            let mut subs = self.subscriptions.lock().expect("subscription lock poisoned");
            if let Some(senders) = subs.get_mut(node) {
                senders.retain(|s| !closed_ids.contains(&s.id));
            }
            debug!(count = closed_ids.len(), "reaped closed subscriptions");
        }

        let delivered = senders.len() - closed_ids.len();
        trace!(node = %node, delivered, "notified subscriptions of deposit");
        delivered
    }

    /// Get the number of active subscriptions for a node.
    pub(crate) fn count_for(&self, node: &NodeId) -> usize {
        let subs = self.subscriptions.lock().expect("subscription lock poisoned");
        subs.get(node).map(Vec::len).unwrap_or(0)
    }

    /// Get the total number of active subscriptions.
    pub(crate) fn total(&self) -> usize {
        let subs = self.subscriptions.lock().expect("subscription lock poisoned");
        subs.values().map(Vec::len).sum()
    }
}
