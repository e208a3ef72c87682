//! # strato-core
//!
//! Core types for the strato control plane cache.
//!
//! This crate provides the foundational types used by the snapshot
//! cache and its consumers:
//!
//! - [`NodeId`] - Identity of a proxy node receiving configuration
//! - [`ResourceType`] - Closed set of the six xDS resource categories
//! - [`Version`] - String-encoded snapshot version with strict parsing
//! - [`CacheError`] - Error type covering all cache failure modes
//!
//! ## Example
//!
//! ```rust
//! use strato_core::{NodeId, ResourceType, Version};
//!
//! let node = NodeId::new("sidecar-7f9c");
//! let version = Version::initial();
//!
//! assert_eq!(version.parse(), Some(1));
//! assert_eq!(ResourceType::Cluster.to_string(), "Cluster");
//! assert_eq!(node.as_str(), "sidecar-7f9c");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod node;
mod resource;
mod version;

pub use error::CacheError;
pub use node::NodeId;
pub use resource::ResourceType;
pub use version::Version;

/// Result type alias using [`CacheError`].
pub type Result<T> = std::result::Result<T, CacheError>;
