//! Distribution sink: the boundary to the layer serving proxies.
//!
//! [`NodeCache::publish`](crate::NodeCache::publish) hands a
//! completed snapshot to a [`SnapshotSink`]. The sink makes it
//! visible to connected proxies; from their perspective the
//! replacement is atomic - a proxy observes either the complete prior
//! snapshot or the complete new one, never a mix.
//!
//! [`MemorySink`] is the default in-process implementation: a
//! protocol layer fetches the latest snapshot per node from it, or
//! subscribes to learn about new deposits.

use std::sync::Arc;

use dashmap::DashMap;
use fnv::FnvBuildHasher;
use tracing::{debug, trace};

use strato_core::NodeId;

use crate::snapshot::NodeSnapshot;
use crate::stats::SinkStats;
use crate::watch::{Subscription, SubscriptionId, SubscriptionSet};

/// Error type sinks report from [`SnapshotSink::deposit`].
///
/// Sink failures are transient from the cache's point of view and are
/// surfaced to the publisher unchanged.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// The distribution-layer boundary.
///
/// Implementations must replace the node's visible snapshot
/// atomically and must keep `deposit` cheap: it is called while the
/// publishing node's transaction lock is held, so it may synchronize
/// internally but must not block on external I/O or call back into
/// the cache.
pub trait SnapshotSink: Send + Sync {
    /// Make `snapshot` the visible configuration for `node`,
    /// replacing whatever was previously visible.
    fn deposit(&self, node: &NodeId, snapshot: Arc<NodeSnapshot>) -> Result<(), SinkError>;
}

/// In-memory distribution sink.
///
/// Snapshots are stored behind `Arc` and swapped atomically per node,
/// so readers always observe a complete snapshot. Deposits notify any
/// active subscriptions for the node.
///
/// ## Thread safety
///
/// All operations are thread-safe. `DashMap` references are dropped
/// before subscription channels are touched.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Latest published snapshot per node.
    published: DashMap<NodeId, Arc<NodeSnapshot>, FnvBuildHasher>,
    /// Active subscriptions.
    subscriptions: SubscriptionSet,
    /// Statistics.
    stats: SinkStats,
}

impl MemorySink {
    /// Create a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new sink with a custom subscription channel buffer.
    #[must_use]
    pub fn with_subscription_buffer(buffer_size: usize) -> Self {
        Self {
            published: DashMap::default(),
            subscriptions: SubscriptionSet::with_buffer_size(buffer_size),
            stats: SinkStats::new(),
        }
    }

    /// Fetch the latest published snapshot for a node.
    pub fn fetch(&self, node: &NodeId) -> Option<Arc<NodeSnapshot>> {
        // The Ref holds a shard read lock; clone the Arc and drop it.
        let result = self.published.get(node.as_str()).map(|r| Arc::clone(r.value()));

        if result.is_some() {
            self.stats.record_hit();
            trace!(node = %node, "sink fetch hit");
        } else {
            self.stats.record_miss();
            trace!(node = %node, "sink fetch miss");
        }

        result
    }

    /// Check if a node has a published snapshot.
    pub fn contains(&self, node: &NodeId) -> bool {
        self.published.contains_key(node.as_str())
    }

    /// Remove a node's published snapshot, if any.
    ///
    /// Used when a node is decommissioned and should stop being
    /// served.
    pub fn remove(&self, node: &NodeId) {
        if self.published.remove(node.as_str()).is_some() {
            self.stats.record_removal();
            debug!(node = %node, "removed published snapshot");
        }
    }

    /// Get the number of nodes with a published snapshot.
    pub fn node_count(&self) -> usize {
        self.published.len()
    }

    /// Get all node identities with a published snapshot.
    ///
    /// Note: This acquires read locks on all shards.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.published.iter().map(|r| r.key().clone()).collect()
    }

    /// Subscribe to deposits for a node.
    ///
    /// The subscription receives every snapshot deposited for the
    /// node after this call. If a snapshot is already published, the
    /// caller should check [`fetch`](Self::fetch) first.
    pub fn subscribe(&self, node: &NodeId) -> Subscription {
        self.subscriptions.subscribe(node.clone())
    }

    /// Cancel a subscription.
    pub fn cancel_subscription(&self, id: SubscriptionId) {
        self.subscriptions.cancel(id);
    }

    /// Get the number of active subscriptions for a node.
    pub fn subscription_count(&self, node: &NodeId) -> usize {
        self.subscriptions.count_for(node)
    }

    /// Get sink statistics.
    #[inline]
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }
}

impl SnapshotSink for MemorySink {
    fn deposit(&self, node: &NodeId, snapshot: Arc<NodeSnapshot>) -> Result<(), SinkError> {
        // Atomic per-node replacement: readers see the old Arc or the
        // new one, never an intermediate state.
        self.published.insert(node.clone(), Arc::clone(&snapshot));
        self.stats.record_deposit();

        debug!(
            node = %node,
            version = %snapshot.version(),
            resources = snapshot.total_resources(),
            "deposited snapshot"
        );

        // No DashMap lock held while notifying.
        let delivered = self.subscriptions.notify(node, snapshot);
        self.stats.record_notifications(delivered as u64);

        Ok(())
    }
}
