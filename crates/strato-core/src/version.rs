//! Snapshot version handling.
//!
//! This module provides [`Version`], the string-encoded version
//! shared by all resource collections of a node snapshot. Versions
//! are stored as strings because that is what the discovery protocol
//! carries on the wire, but they must always parse as positive
//! integers; [`Version::parse`] is the single place that contract is
//! checked.

use std::fmt;

/// String-encoded snapshot version.
///
/// A valid version is a positive integer rendered in decimal. The
/// initial version of every snapshot is `1`, and versions only ever
/// advance by exactly one per bump.
///
/// # Example
///
/// ```rust
/// use strato_core::Version;
///
/// let v = Version::initial();
/// assert_eq!(v.parse(), Some(1));
///
/// let next = v.bumped().unwrap();
/// assert_eq!(next.as_str(), "2");
///
/// // Anything that is not a positive integer fails to parse.
/// assert_eq!(Version::new("garbage").parse(), None);
/// assert_eq!(Version::new("0").parse(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// The version every fresh snapshot starts at.
    pub const INITIAL: u64 = 1;

    /// Create the initial version.
    #[must_use]
    pub fn initial() -> Self {
        Self(Self::INITIAL.to_string())
    }

    /// Create a version from an arbitrary string.
    ///
    /// The value is stored as-is; [`parse`](Self::parse) decides
    /// whether it is valid.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Parse the stored string as a positive integer.
    ///
    /// Returns `None` if the string is not a valid positive integer,
    /// which callers treat as a corrupted snapshot version.
    #[must_use]
    pub fn parse(&self) -> Option<u64> {
        self.0.parse::<u64>().ok().filter(|v| *v >= 1)
    }

    /// Compute the successor version.
    ///
    /// Returns `None` if the stored version does not parse.
    #[must_use]
    pub fn bumped(&self) -> Option<Self> {
        self.parse().map(|v| Self::from(v + 1))
    }

    /// Get the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
