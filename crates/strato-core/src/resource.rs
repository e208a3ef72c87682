//! Resource type enumeration for snapshot collections.
//!
//! This module provides [`ResourceType`], the closed set of six xDS
//! resource categories a snapshot holds one collection for. The order
//! of the variants is fixed and matches the discovery protocol's
//! conventional ordering; it is used only for addressing, never for
//! semantics.

use std::fmt;

/// The six resource categories served to a proxy node.
///
/// Every node snapshot holds exactly one collection per variant.
/// Matching on `ResourceType` is always exhaustive; there are no
/// numeric indices in the public API.
///
/// # Example
///
/// ```rust
/// use strato_core::ResourceType;
///
/// for ty in ResourceType::ALL {
///     assert!(ty.type_url().starts_with("type.googleapis.com/"));
/// }
/// assert_eq!(ResourceType::from_type_url(ResourceType::Secret.type_url()),
///            Some(ResourceType::Secret));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    /// Endpoint assignments (EDS).
    Endpoint,
    /// Upstream clusters (CDS).
    Cluster,
    /// Route configurations (RDS).
    Route,
    /// Listeners (LDS).
    Listener,
    /// TLS secrets (SDS).
    Secret,
    /// Runtime layers (RTDS).
    Runtime,
}

impl ResourceType {
    /// All resource types, in their fixed order.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Endpoint,
        ResourceType::Cluster,
        ResourceType::Route,
        ResourceType::Listener,
        ResourceType::Secret,
        ResourceType::Runtime,
    ];

    /// Number of resource types.
    pub const COUNT: usize = Self::ALL.len();

    /// Get the protobuf type URL for payloads of this type.
    #[must_use]
    pub fn type_url(self) -> &'static str {
        match self {
            ResourceType::Endpoint => {
                "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment"
            }
            ResourceType::Cluster => "type.googleapis.com/envoy.config.cluster.v3.Cluster",
            ResourceType::Route => {
                "type.googleapis.com/envoy.config.route.v3.RouteConfiguration"
            }
            ResourceType::Listener => "type.googleapis.com/envoy.config.listener.v3.Listener",
            ResourceType::Secret => {
                "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.Secret"
            }
            ResourceType::Runtime => "type.googleapis.com/envoy.service.runtime.v3.Runtime",
        }
    }

    /// Look up the resource type for a protobuf type URL.
    ///
    /// Returns `None` for type URLs outside the closed set.
    #[must_use]
    pub fn from_type_url(url: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.type_url() == url)
    }

    /// Get the short name of this resource type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Endpoint => "Endpoint",
            ResourceType::Cluster => "Cluster",
            ResourceType::Route => "Route",
            ResourceType::Listener => "Listener",
            ResourceType::Secret => "Secret",
            ResourceType::Runtime => "Runtime",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_types_are_distinct() {
        for (i, a) in ResourceType::ALL.iter().enumerate() {
            for b in &ResourceType::ALL[i + 1..] {
                assert_ne!(a, b);
                assert_ne!(a.type_url(), b.type_url());
            }
        }
    }

    #[test]
    fn type_url_round_trip() {
        for ty in ResourceType::ALL {
            assert_eq!(ResourceType::from_type_url(ty.type_url()), Some(ty));
        }
    }

    #[test]
    fn unknown_type_url() {
        assert_eq!(
            ResourceType::from_type_url("type.googleapis.com/envoy.config.route.v3.VirtualHost"),
            None
        );
        assert_eq!(ResourceType::from_type_url(""), None);
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(ResourceType::Cluster.to_string(), "Cluster");
        assert_eq!(ResourceType::Runtime.to_string(), "Runtime");
    }

    #[test]
    fn fixed_count() {
        assert_eq!(ResourceType::COUNT, 6);
    }
}
