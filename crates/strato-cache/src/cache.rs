//! Node cache: per-node snapshot storage with serialized transactions.
//!
//! The [`NodeCache`] maps node identities to their snapshots. Each
//! entry carries its own mutex, so all operations addressing one node
//! are serialized while unrelated nodes proceed fully in parallel.
//! A reconciliation cycle that must be atomic as a whole (mutate the
//! collections, bump the version, publish) runs inside a single
//! [`NodeCache::with_node`] call.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use fnv::FnvBuildHasher;
use prost_types::Any;
use tracing::{debug, trace};

use strato_core::{CacheError, NodeId, ResourceType, Result};

use crate::sink::SnapshotSink;
use crate::snapshot::NodeSnapshot;

/// Per-node snapshot cache.
///
/// A node identity is either entirely absent or holds a fully
/// initialized snapshot; there is no partially initialized state.
/// The cache exclusively owns all snapshots - consumers obtain an
/// owned copy per call via [`snapshot`](Self::snapshot).
///
/// ## Thread safety
///
/// The node map is a `DashMap`, so lookups only contend on a shard
/// for the duration of an `Arc` clone. Mutations go through the
/// per-node mutex, which is held only across in-memory work.
///
/// ## Important
///
/// All `DashMap` references are dropped before the per-node mutex is
/// acquired, so map and mutex never nest.
#[derive(Debug, Default)]
pub struct NodeCache {
    /// Snapshots keyed by node identity, one lock per node.
    nodes: DashMap<NodeId, Arc<Mutex<NodeSnapshot>>, FnvBuildHasher>,
}

impl NodeCache {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new cache with a specific initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: DashMap::with_capacity_and_hasher(capacity, FnvBuildHasher::default()),
        }
    }

    /// Initialize a fresh snapshot for a node: six empty collections,
    /// version 1.
    ///
    /// Calling this on an existing node re-initializes it in place,
    /// discarding all prior resources. Callers must not use it to
    /// "ensure existence" of live state.
    pub fn create_node(&self, node: &NodeId) {
        let entry = {
            let slot = self.nodes.entry(node.clone()).or_default();
            Arc::clone(slot.value())
        };
        let mut snap = entry.lock().expect("node lock poisoned");
        *snap = NodeSnapshot::new();
        debug!(node = %node, "initialized node snapshot");
    }

    /// Remove a node's snapshot entirely. No-op if absent.
    pub fn delete_node(&self, node: &NodeId) {
        if self.nodes.remove(node.as_str()).is_some() {
            debug!(node = %node, "deleted node snapshot");
        }
    }

    /// Run a closure against a node's snapshot under that node's lock.
    ///
    /// This is the serialization primitive: everything that happens
    /// inside one call is a single transaction with respect to other
    /// operations on the same node. A full reconciliation cycle
    /// (mutate collections, [`NodeSnapshot::bump`], deposit a clone
    /// into a sink) belongs inside one call.
    ///
    /// Fails with [`CacheError::UnknownNode`] if the node is absent.
    /// The closure must not call back into this cache for the same
    /// node and must not block on external I/O.
    pub fn with_node<T>(
        &self,
        node: &NodeId,
        f: impl FnOnce(&mut NodeSnapshot) -> Result<T>,
    ) -> Result<T> {
        // The Ref holds a shard read lock; clone the Arc and drop it
        // before taking the node mutex.
        let entry = self
            .nodes
            .get(node.as_str())
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| CacheError::unknown_node(node))?;

        let mut snap = entry.lock().expect("node lock poisoned");
        f(&mut snap)
    }

    /// Upsert a resource under `name` in the collection for `ty`.
    ///
    /// Does not bump the version; mutations are batched until the
    /// caller bumps explicitly.
    pub fn set_resource(
        &self,
        node: &NodeId,
        ty: ResourceType,
        name: impl Into<String>,
        value: Any,
    ) -> Result<()> {
        let name = name.into();
        self.with_node(node, |snap| {
            trace!(node = %node, resource_type = %ty, name = %name, "set resource");
            snap.collection_mut(ty).insert(name, value);
            Ok(())
        })
    }

    /// Get a resource by name, or `None` if the name is absent.
    pub fn get_resource(&self, node: &NodeId, ty: ResourceType, name: &str) -> Result<Option<Any>> {
        self.with_node(node, |snap| Ok(snap.collection(ty).get(name).cloned()))
    }

    /// Remove a resource by name. No-op if the name is absent.
    pub fn delete_resource(&self, node: &NodeId, ty: ResourceType, name: &str) -> Result<()> {
        self.with_node(node, |snap| {
            if snap.collection_mut(ty).remove(name).is_some() {
                trace!(node = %node, resource_type = %ty, name = %name, "deleted resource");
            }
            Ok(())
        })
    }

    /// Empty exactly the one collection for `ty`; all other types in
    /// the same snapshot are untouched.
    pub fn clear_resources(&self, node: &NodeId, ty: ResourceType) -> Result<()> {
        self.with_node(node, |snap| {
            let cleared = snap.collection(ty).len();
            snap.collection_mut(ty).clear();
            trace!(node = %node, resource_type = %ty, cleared, "cleared resources");
            Ok(())
        })
    }

    /// Get an owned copy of the node's full current snapshot.
    pub fn snapshot(&self, node: &NodeId) -> Result<NodeSnapshot> {
        self.with_node(node, |snap| Ok(snap.clone()))
    }

    /// Parse the node's current version as an integer.
    ///
    /// Fails with [`CacheError::VersionCorruption`] if the stored
    /// version is not a valid positive integer; that signals a broken
    /// internal invariant, not a caller mistake.
    pub fn current_version(&self, node: &NodeId) -> Result<u64> {
        self.with_node(node, |snap| {
            snap.version()
                .parse()
                .ok_or_else(|| CacheError::version_corruption(node, snap.version().as_str()))
        })
    }

    /// Increment the node's version by exactly one.
    ///
    /// The new version becomes the value reported by every collection
    /// of the snapshot. Returns the new numeric version. On
    /// [`CacheError::VersionCorruption`] the snapshot's resource
    /// contents are left unchanged.
    pub fn bump_version(&self, node: &NodeId) -> Result<u64> {
        self.with_node(node, |snap| {
            let stored = snap.version().as_str().to_owned();
            let version = snap
                .bump()
                .ok_or_else(|| CacheError::version_corruption(node, stored))?;
            debug!(node = %node, version, "bumped snapshot version");
            Ok(version)
        })
    }

    /// Deposit the node's current snapshot into the distribution sink.
    ///
    /// The snapshot is cloned and handed over under the node's lock,
    /// so a bump immediately followed by a publish inside the same
    /// [`with_node`](Self::with_node) ordering cannot interleave with
    /// another cycle for this node. A sink failure is surfaced
    /// unchanged as [`CacheError::PublishFailure`]; there is no local
    /// retry.
    pub fn publish(&self, node: &NodeId, sink: &dyn SnapshotSink) -> Result<()> {
        self.with_node(node, |snap| {
            let snapshot = Arc::new(snap.clone());
            let version = snapshot.version().clone();
            sink.deposit(node, snapshot)
                .map_err(|e| CacheError::publish_failure(node, e))?;
            debug!(node = %node, version = %version, "published snapshot");
            Ok(())
        })
    }

    /// Check if a node has a snapshot.
    pub fn contains(&self, node: &NodeId) -> bool {
        self.nodes.contains_key(node.as_str())
    }

    /// Get the number of nodes in the cache.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the cache holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get all node identities currently in the cache.
    ///
    /// Note: This acquires read locks on all shards.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|r| r.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use strato_core::Version;

    fn any(ty: ResourceType, marker: u8) -> Any {
        Any {
            type_url: ty.type_url().to_string(),
            value: vec![marker],
        }
    }

    #[test]
    fn create_then_current_version_is_one() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");

        cache.create_node(&node);
        assert_eq!(cache.current_version(&node).unwrap(), 1);
    }

    #[test]
    fn create_on_existing_node_discards_resources() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");

        cache.create_node(&node);
        cache
            .set_resource(&node, ResourceType::Cluster, "c1", any(ResourceType::Cluster, 1))
            .unwrap();
        cache.bump_version(&node).unwrap();

        cache.create_node(&node);

        assert_eq!(cache.current_version(&node).unwrap(), 1);
        assert!(cache
            .get_resource(&node, ResourceType::Cluster, "c1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn set_then_get_returns_value() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");
        cache.create_node(&node);

        cache
            .set_resource(&node, ResourceType::Endpoint, "e1", any(ResourceType::Endpoint, 7))
            .unwrap();

        let got = cache
            .get_resource(&node, ResourceType::Endpoint, "e1")
            .unwrap()
            .unwrap();
        assert_eq!(got.value, vec![7]);

        cache
            .delete_resource(&node, ResourceType::Endpoint, "e1")
            .unwrap();
        assert!(cache
            .get_resource(&node, ResourceType::Endpoint, "e1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn clear_only_touches_one_type() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");
        cache.create_node(&node);

        cache
            .set_resource(&node, ResourceType::Cluster, "c1", any(ResourceType::Cluster, 1))
            .unwrap();
        cache
            .set_resource(&node, ResourceType::Route, "r1", any(ResourceType::Route, 1))
            .unwrap();

        cache.clear_resources(&node, ResourceType::Cluster).unwrap();

        assert!(cache
            .get_resource(&node, ResourceType::Cluster, "c1")
            .unwrap()
            .is_none());
        assert!(cache
            .get_resource(&node, ResourceType::Route, "r1")
            .unwrap()
            .is_some());
    }

    #[test]
    fn operations_on_absent_node_fail_with_unknown_node() {
        let cache = NodeCache::new();
        let node = NodeId::new("ghost");

        let err = cache.current_version(&node).unwrap_err();
        assert!(matches!(err, CacheError::UnknownNode { .. }));

        let err = cache
            .set_resource(&node, ResourceType::Cluster, "c1", any(ResourceType::Cluster, 1))
            .unwrap_err();
        assert!(matches!(err, CacheError::UnknownNode { .. }));

        // Deleting an absent node is a no-op.
        cache.delete_node(&node);
    }

    #[test]
    fn delete_then_recreate() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");

        cache.create_node(&node);
        cache.bump_version(&node).unwrap();
        cache.delete_node(&node);

        assert!(!cache.contains(&node));
        assert!(matches!(
            cache.snapshot(&node).unwrap_err(),
            CacheError::UnknownNode { .. }
        ));

        // Absent is reachable again; nodes may be recreated indefinitely.
        cache.create_node(&node);
        assert_eq!(cache.current_version(&node).unwrap(), 1);
    }

    #[test]
    fn bump_advances_by_exactly_one() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");
        cache.create_node(&node);

        assert_eq!(cache.bump_version(&node).unwrap(), 2);
        assert_eq!(cache.bump_version(&node).unwrap(), 3);
        assert_eq!(cache.current_version(&node).unwrap(), 3);

        let snap = cache.snapshot(&node).unwrap();
        for ty in ResourceType::ALL {
            assert_eq!(snap.collection_version(ty).as_str(), "3");
        }
    }

    #[test]
    fn corrupt_version_aborts_only_the_bump() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");
        cache.create_node(&node);
        cache
            .set_resource(&node, ResourceType::Secret, "tls", any(ResourceType::Secret, 1))
            .unwrap();

        cache
            .with_node(&node, |snap| {
                snap.version = Version::new("garbage");
                Ok(())
            })
            .unwrap();

        let err = cache.bump_version(&node).unwrap_err();
        match err {
            CacheError::VersionCorruption { stored, .. } => assert_eq!(stored, "garbage"),
            other => panic!("unexpected error: {other}"),
        }

        // Resource contents are unchanged.
        assert!(cache
            .get_resource(&node, ResourceType::Secret, "tls")
            .unwrap()
            .is_some());
    }

    #[test]
    fn corruption_on_one_node_does_not_affect_others() {
        let cache = NodeCache::new();
        let bad = NodeId::new("bad");
        let good = NodeId::new("good");
        cache.create_node(&bad);
        cache.create_node(&good);

        cache
            .with_node(&bad, |snap| {
                snap.version = Version::new("???");
                Ok(())
            })
            .unwrap();

        assert!(cache.bump_version(&bad).is_err());
        assert_eq!(cache.bump_version(&good).unwrap(), 2);
    }

    #[test]
    fn snapshot_is_an_owned_copy() {
        let cache = NodeCache::new();
        let node = NodeId::new("node-1");
        cache.create_node(&node);

        let before = cache.snapshot(&node).unwrap();
        cache
            .set_resource(&node, ResourceType::Cluster, "c1", any(ResourceType::Cluster, 1))
            .unwrap();

        // The copy taken earlier does not observe the later mutation.
        assert!(before.collection(ResourceType::Cluster).is_empty());
    }

    #[test]
    fn node_enumeration() {
        let cache = NodeCache::new();
        assert!(cache.is_empty());

        for id in ["a", "b", "c"] {
            cache.create_node(&NodeId::new(id));
        }
        assert_eq!(cache.node_count(), 3);

        let mut nodes = cache.nodes();
        nodes.sort();
        assert_eq!(nodes, vec![NodeId::new("a"), NodeId::new("b"), NodeId::new("c")]);
    }

    #[test]
    fn concurrent_writes_to_distinct_nodes() {
        let cache = Arc::new(NodeCache::new());
        let mut handles = vec![];

        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for j in 0..50 {
                    let node = NodeId::new(format!("node-{i}-{j}"));
                    cache.create_node(&node);
                    cache
                        .set_resource(
                            &node,
                            ResourceType::Cluster,
                            "c1",
                            any(ResourceType::Cluster, j as u8),
                        )
                        .unwrap();
                    cache.bump_version(&node).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().expect("thread panicked");
        }

        assert_eq!(cache.node_count(), 400);
        for i in 0..8 {
            let node = NodeId::new(format!("node-{i}-0"));
            assert_eq!(cache.current_version(&node).unwrap(), 2);
        }
    }

    #[test]
    fn concurrent_bumps_on_one_node_serialize() {
        let cache = Arc::new(NodeCache::new());
        let node = NodeId::new("contended");
        cache.create_node(&node);

        let mut handles = vec![];
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let node = node.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..25 {
                    cache.bump_version(&node).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().expect("thread panicked");
        }

        // Every bump advanced by exactly one; none were lost.
        assert_eq!(cache.current_version(&node).unwrap(), 101);
    }
}
