//! Node identity for per-proxy configuration.
//!
//! This module provides [`NodeId`], the identity under which a proxy
//! instance receives its configuration snapshot. Every cache entry
//! and every published artifact is keyed by a `NodeId`.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identity of a single proxy node.
///
/// `NodeId` wraps the node identity string in an `Arc<str>` so it can
/// be cloned cheaply into map keys, log fields and published
/// artifacts without copying the string.
///
/// # Example
///
/// ```rust
/// use strato_core::NodeId;
///
/// let a = NodeId::new("gateway-0");
/// let b = a.clone();
///
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "gateway-0");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Create a node identity from a string.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Get the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
