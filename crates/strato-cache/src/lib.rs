//! # strato-cache
//!
//! Per-node configuration snapshot cache for a proxy control plane.
//!
//! This crate is the component reconciliation workers drive: it holds
//! typed resource collections in memory per node, guarantees
//! consistent version stamping across resource types, and hands off
//! atomic snapshots to the distribution layer that streams them to
//! connected proxies.
//!
//! - [`NodeCache`] - node-keyed snapshot storage with per-node
//!   transaction serialization
//! - [`NodeSnapshot`] / [`ResourceCollection`] - the versioned
//!   resource state of one node
//! - [`SnapshotSink`] / [`MemorySink`] - the distribution boundary
//! - [`Subscription`] - deposit notifications for a protocol layer
//!
//! ## Key Design Decisions
//!
//! - One mutex per node entry: operations for the same node are
//!   serialized, unrelated nodes never contend
//! - One version per snapshot: [`NodeSnapshot::bump`] is the only
//!   writer, so collections cannot report diverging versions
//! - Batched updates: mutations never change the version; many
//!   resource changes fold into one explicit bump
//! - Published snapshots are `Arc`-swapped in the sink, so proxies
//!   observe complete snapshots only
//!
//! ## Example
//!
//! ```rust
//! use strato_cache::{MemorySink, NodeCache};
//! use strato_core::{NodeId, ResourceType};
//!
//! # fn main() -> strato_core::Result<()> {
//! let cache = NodeCache::new();
//! let sink = MemorySink::new();
//! let node = NodeId::new("sidecar-1");
//!
//! cache.create_node(&node);
//! cache.set_resource(
//!     &node,
//!     ResourceType::Cluster,
//!     "backend",
//!     prost_types::Any {
//!         type_url: ResourceType::Cluster.type_url().to_string(),
//!         value: vec![],
//!     },
//! )?;
//! let version = cache.bump_version(&node)?;
//! cache.publish(&node, &sink)?;
//!
//! assert_eq!(version, 2);
//! assert_eq!(sink.fetch(&node).unwrap().version().parse(), Some(2));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod sink;
mod snapshot;
mod stats;
mod watch;

pub use cache::NodeCache;
pub use sink::{MemorySink, SinkError, SnapshotSink};
pub use snapshot::{NodeSnapshot, ResourceCollection};
pub use stats::SinkStats;
pub use watch::{Subscription, SubscriptionId};
