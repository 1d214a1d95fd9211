//! Core CNAME lookup types and traits.
//!
//! This module defines the `CnameLookup` trait and supporting types that
//! form the boundary between chain traversal and the network.

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use thiserror::Error;

/// A domain name taking part in a CNAME chain.
///
/// Trailing root-label dots are stripped on construction, so
/// `"a.example.com."` and `"a.example.com"` are the same `Name`.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type, normalizing it.
    #[inline]
    pub fn new(host: impl AsRef<str>) -> Self {
        Self {
            host: host.as_ref().trim_end_matches('.').into(),
        }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }

    /// Returns true if nothing is left after normalization.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }

    /// Returns true if the hostname contains `pattern`.
    ///
    /// An empty pattern never matches.
    pub fn matches_terminal(&self, pattern: &str) -> bool {
        !pattern.is_empty() && self.host.contains(pattern)
    }

    /// The fully qualified form with a trailing dot, as sent on the wire.
    pub fn to_fqdn(&self) -> String {
        format!("{}.", self.host)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

impl serde::Serialize for Name {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.host)
    }
}

impl<'de> serde::Deserialize<'de> for Name {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Name::new(raw))
    }
}

/// Classified failure of a single CNAME lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// The name exists but is not an alias.
    #[error("No CNAME record")]
    NoRecord,
    /// The name does not exist (NXDOMAIN).
    #[error("Name does not exist")]
    NotFound,
    /// The query did not complete in time.
    #[error("Query timed out")]
    Timeout,
    /// Anything else: transport errors, malformed responses, refusals.
    #[error("Query failed: {0}")]
    Query(String),
}

/// Result of one CNAME lookup.
///
/// `Ok(Some(target))` carries the raw target of the first CNAME answer,
/// which may still have its trailing dot. `Ok(None)` is an empty answer set.
pub type CnameResult = Result<Option<String>, LookupFailure>;

/// Alias for the `Future` type returned by a CNAME lookup.
pub type Querying = Pin<Box<dyn Future<Output = CnameResult> + Send>>;

/// Trait for CNAME lookups.
///
/// Implementations issue exactly one logical query per call and never
/// retry or cache; chain traversal and retry policy live above this trait.
pub trait CnameLookup: Send + Sync {
    /// Looks up the CNAME record for `name`.
    fn lookup_cname(&self, name: Name) -> Querying;
}

/// Blanket implementation for Arc-wrapped lookups.
impl<L: CnameLookup + ?Sized> CnameLookup for Arc<L> {
    fn lookup_cname(&self, name: Name) -> Querying {
        (**self).lookup_cname(name)
    }
}

/// In-memory CNAME table.
///
/// Names without an entry answer `NoRecord`, i.e. they exist and are final.
/// Every lookup is counted, which makes the table handy for asserting how
/// many queries a traversal issued.
///
/// # Example
///
/// ```rust,ignore
/// use failover_probe::dns::StaticCnameTable;
///
/// let table = StaticCnameTable::new()
///     .alias("test.example.com", "12345.gateway.example.cloud")
///     .failure("broken.example.com", LookupFailure::Timeout);
/// ```
#[derive(Default)]
pub struct StaticCnameTable {
    entries: HashMap<Name, CnameResult>,
    queries: AtomicUsize,
}

impl StaticCnameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a CNAME record `from -> to`. The target is stored verbatim.
    pub fn alias(mut self, from: impl AsRef<str>, to: impl Into<String>) -> Self {
        self.entries.insert(Name::new(from), Ok(Some(to.into())));
        self
    }

    /// Makes lookups of `name` fail with `failure`.
    pub fn failure(mut self, name: impl AsRef<str>, failure: LookupFailure) -> Self {
        self.entries.insert(Name::new(name), Err(failure));
        self
    }

    /// Number of lookups answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl CnameLookup for StaticCnameTable {
    fn lookup_cname(&self, name: Name) -> Querying {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let answer = self
            .entries
            .get(&name)
            .cloned()
            .unwrap_or(Err(LookupFailure::NoRecord));
        Box::pin(std::future::ready(answer))
    }
}

impl fmt::Debug for StaticCnameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCnameTable")
            .field("entries", &self.entries.len())
            .field("queries", &self.query_count())
            .finish()
    }
}

/// CNAME lookup wrapper that supports per-name overrides.
///
/// Overrides are answered locally; everything else goes to the inner
/// lookup. Useful for:
/// - Pinning a hostname to a gateway while probing a live server
/// - Tests that only need to fake part of a chain
///
/// # Example
///
/// ```rust,ignore
/// use failover_probe::dns::{CnameLookupWithOverrides, HickoryCnameLookup};
/// use std::collections::HashMap;
///
/// let mut overrides = HashMap::new();
/// overrides.insert(Name::new("api.local"), "12345.gateway.example.cloud".to_string());
///
/// let lookup = CnameLookupWithOverrides::new(
///     Arc::new(HickoryCnameLookup::new(NameServer::default())),
///     overrides,
/// );
/// ```
pub struct CnameLookupWithOverrides {
    inner: Arc<dyn CnameLookup>,
    overrides: Arc<HashMap<Name, String>>,
}

impl CnameLookupWithOverrides {
    /// Creates a new lookup with the given overrides.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fallback lookup for non-overridden names.
    /// * `overrides` - Map of names to their CNAME targets.
    pub fn new(inner: Arc<dyn CnameLookup>, overrides: HashMap<Name, String>) -> Self {
        Self {
            inner,
            overrides: Arc::new(overrides),
        }
    }

    /// Returns the number of configured overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl CnameLookup for CnameLookupWithOverrides {
    fn lookup_cname(&self, name: Name) -> Querying {
        if let Some(target) = self.overrides.get(&name) {
            return Box::pin(std::future::ready(Ok(Some(target.clone()))));
        }
        self.inner.lookup_cname(name)
    }
}

impl fmt::Debug for CnameLookupWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CnameLookupWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_strips_trailing_dot() {
        let name = Name::new("example.com.");
        assert_eq!(name.as_str(), "example.com");
        assert_eq!(name, Name::new("example.com"));
        assert_eq!(name.to_fqdn(), "example.com.");
    }

    #[test]
    fn test_name_root_is_empty() {
        assert!(Name::new(".").is_empty());
        assert!(Name::new("").is_empty());
        assert!(!Name::new("a").is_empty());
    }

    #[test]
    fn test_name_terminal_match() {
        let name = Name::new("12345.gateway.example.cloud");
        assert!(name.matches_terminal(".gateway.example.cloud"));
        assert!(!name.matches_terminal(".other.cloud"));
        assert!(!name.matches_terminal(""));
    }

    #[test]
    fn test_name_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Name::new("example.com"));
        set.insert(Name::new("example.com.")); // Same after normalization

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_name_serde() {
        let name: Name = serde_json::from_str("\"a.example.com.\"").unwrap();
        assert_eq!(name, "a.example.com");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"a.example.com\"");
    }

    #[tokio::test]
    async fn test_static_table_answers_and_counts() {
        let table = StaticCnameTable::new()
            .alias("a.example.com", "b.example.com.")
            .failure("dead.example.com", LookupFailure::NotFound);

        assert_eq!(
            table.lookup_cname(Name::new("a.example.com")).await,
            Ok(Some("b.example.com.".to_string()))
        );
        assert_eq!(
            table.lookup_cname(Name::new("dead.example.com")).await,
            Err(LookupFailure::NotFound)
        );
        assert_eq!(
            table.lookup_cname(Name::new("plain.example.com")).await,
            Err(LookupFailure::NoRecord)
        );
        assert_eq!(table.query_count(), 3);
    }

    #[tokio::test]
    async fn test_override_hit_and_miss() {
        let inner = Arc::new(StaticCnameTable::new().alias("other.com", "inner.target.com"));

        let mut overrides = HashMap::new();
        overrides.insert(Name::new("override.local"), "pinned.target.com".to_string());

        let lookup = CnameLookupWithOverrides::new(inner.clone(), overrides);
        assert_eq!(lookup.override_count(), 1);

        let hit = lookup.lookup_cname(Name::new("override.local")).await;
        assert_eq!(hit, Ok(Some("pinned.target.com".to_string())));
        assert_eq!(inner.query_count(), 0);

        let miss = lookup.lookup_cname(Name::new("other.com")).await;
        assert_eq!(miss, Ok(Some("inner.target.com".to_string())));
        assert_eq!(inner.query_count(), 1);
    }
}
