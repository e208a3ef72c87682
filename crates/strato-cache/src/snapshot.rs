//! Node snapshot: the versioned resource state of one node.
//!
//! A [`NodeSnapshot`] holds one [`ResourceCollection`] per
//! [`ResourceType`] plus a single shared [`Version`]. Unlike the wire
//! representation, which repeats the version once per collection, the
//! snapshot stores it exactly once: collections cannot disagree about
//! the version because there is only one to read. The per-collection
//! version of the published artifact is derived via
//! [`NodeSnapshot::collection_version`].
//!
//! Snapshots follow a batched update model: resource items may be
//! mutated any number of times between version bumps, and
//! [`NodeSnapshot::bump`] is the only writer of the version.

use std::collections::HashMap;

use prost_types::Any;
use strato_core::{ResourceType, Version};

/// Named resources of one type within a snapshot.
///
/// Resource names are unique within a collection; insertion order is
/// irrelevant. Values are opaque protobuf payloads - the cache never
/// inspects them.
#[derive(Debug, Clone, Default)]
pub struct ResourceCollection {
    /// Resources keyed by name.
    items: HashMap<String, Any>,
}

impl ResourceCollection {
    /// Create a new empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no resources.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a resource by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Any> {
        self.items.get(name)
    }

    /// Check whether a resource name is present.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Upsert a resource, returning the prior value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: Any) -> Option<Any> {
        self.items.insert(name.into(), value)
    }

    /// Remove a resource by name, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Any> {
        self.items.remove(name)
    }

    /// Remove all resources.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate over all resources.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Any)> {
        self.items.iter()
    }

    /// Get all resource names.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }
}

/// Number of collections in a snapshot, one per [`ResourceType`].
const SLOTS: usize = ResourceType::COUNT;

/// Positional slot for a resource type within the collection array.
///
/// The array layout is internal; all addressing goes through
/// [`ResourceType`] and this exhaustive match.
fn slot(ty: ResourceType) -> usize {
    match ty {
        ResourceType::Endpoint => 0,
        ResourceType::Cluster => 1,
        ResourceType::Route => 2,
        ResourceType::Listener => 3,
        ResourceType::Secret => 4,
        ResourceType::Runtime => 5,
    }
}

/// The complete resource state of one node: six collections and one
/// shared version.
///
/// A fresh snapshot has all collections empty and version `1`. The
/// snapshot is mutated in place across reconciliation cycles; any
/// external reader always observes the version as of the last bump.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    /// The single authoritative version, shared by all collections.
    pub(crate) version: Version,
    /// One collection per resource type, addressed via [`slot`].
    collections: [ResourceCollection; SLOTS],
}

impl Default for NodeSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeSnapshot {
    /// Create a fresh snapshot: six empty collections, version 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: Version::initial(),
            collections: Default::default(),
        }
    }

    /// Get the shared snapshot version.
    #[inline]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Get the version a collection reports in the published artifact.
    ///
    /// Always the shared snapshot version; the parameter exists only
    /// so call sites read like the wire layout they feed.
    #[inline]
    pub fn collection_version(&self, _ty: ResourceType) -> &Version {
        &self.version
    }

    /// Bump the shared version by exactly one.
    ///
    /// Returns the new numeric version, or `None` if the stored
    /// version is not a valid positive integer. On `None` the
    /// snapshot, resource contents included, is left unchanged.
    pub fn bump(&mut self) -> Option<u64> {
        let next = self.version.bumped()?;
        let numeric = next.parse();
        self.version = next;
        numeric
    }

    /// Get the collection for a resource type.
    #[inline]
    pub fn collection(&self, ty: ResourceType) -> &ResourceCollection {
        &self.collections[slot(ty)]
    }

    /// Get the mutable collection for a resource type.
    #[inline]
    pub fn collection_mut(&mut self, ty: ResourceType) -> &mut ResourceCollection {
        &mut self.collections[slot(ty)]
    }

    /// Get the total number of resources across all types.
    pub fn total_resources(&self) -> usize {
        self.collections.iter().map(ResourceCollection::len).sum()
    }

    /// Check if every collection is empty.
    pub fn is_empty(&self) -> bool {
        self.collections.iter().all(ResourceCollection::is_empty)
    }
}
