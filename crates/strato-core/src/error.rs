//! Error types for cache operations.
//!
//! This module provides [`CacheError`], the error type returned by
//! every fallible cache operation. No error here is globally fatal: a
//! failure processing one node never prevents other nodes'
//! reconciliation cycles from proceeding.

use crate::NodeId;

/// Error type for snapshot cache operations.
///
/// # Example
///
/// ```rust
/// use strato_core::{CacheError, NodeId};
///
/// let err = CacheError::unknown_node(&NodeId::new("gone"));
/// assert!(err.to_string().contains("gone"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The operation addressed a node with no active snapshot.
    ///
    /// Recoverable: the caller should create the node first, or treat
    /// the reference as stale.
    #[error("unknown node: {node}")]
    UnknownNode {
        /// The node identity that was addressed.
        node: NodeId,
    },

    /// The stored snapshot version is not a valid positive integer.
    ///
    /// This is an internal invariant violation and should never occur
    /// under correct use; it aborts only the affected node's cycle.
    #[error("corrupt version {stored:?} for node {node}: not a positive integer")]
    VersionCorruption {
        /// The node whose snapshot holds the corrupt version.
        node: NodeId,
        /// The stored version string, verbatim.
        stored: String,
    },

    /// The distribution layer rejected or could not accept a snapshot.
    ///
    /// Transient: the sink's error is surfaced unchanged and the
    /// caller's control loop retries the full mutate/bump/publish
    /// cycle.
    #[error("publish failed for node {node}")]
    PublishFailure {
        /// The node whose snapshot was being published.
        node: NodeId,
        /// The error reported by the sink.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CacheError {
    /// Create an [`UnknownNode`](Self::UnknownNode) error.
    pub fn unknown_node(node: &NodeId) -> Self {
        Self::UnknownNode { node: node.clone() }
    }

    /// Create a [`VersionCorruption`](Self::VersionCorruption) error.
    pub fn version_corruption(node: &NodeId, stored: impl Into<String>) -> Self {
        Self::VersionCorruption {
            node: node.clone(),
            stored: stored.into(),
        }
    }

    /// Create a [`PublishFailure`](Self::PublishFailure) from the sink's error.
    pub fn publish_failure(
        node: &NodeId,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::PublishFailure {
            node: node.clone(),
            source,
        }
    }
}
