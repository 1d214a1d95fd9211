//! DNS Module Tests
//!
//! Covers:
//! - `Name` normalization
//! - `CnameLookupWithOverrides` using a MockLookup
//! - `ChainResolver` hop accounting and outcome classification

use failover_probe::dns::{
    ChainResolver, CnameLookup, CnameLookupWithOverrides, LookupFailure, Name, Querying,
    ResolutionOutcome, StaticCnameTable,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const PATTERN: &str = ".gateway.example.cloud";

/// Every name is an alias of `next-<name>`, forever.
struct EndlessChain {
    calls: AtomicUsize,
}

impl CnameLookup for EndlessChain {
    fn lookup_cname(&self, name: Name) -> Querying {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let target = format!("next-{}.", name);
        Box::pin(async move { Ok(Some(target)) })
    }
}

/// A straight chain `h0 -> h1 -> ... -> h{len-1} -> 1.gateway.example.cloud`.
fn chain_of(len: usize) -> StaticCnameTable {
    let mut table = StaticCnameTable::new();
    for i in 0..len {
        let to = if i + 1 == len {
            "1.gateway.example.cloud.".to_string()
        } else {
            format!("h{}.example.com.", i + 1)
        };
        table = table.alias(format!("h{}.example.com", i), to);
    }
    table
}

#[test]
fn test_name_api() {
    let name = Name::new("example.com.");
    assert_eq!(name.as_str(), "example.com");
    assert_eq!(name.to_string(), "example.com");
}

#[tokio::test]
async fn test_gateway_scenario_single_query() {
    let table = Arc::new(
        StaticCnameTable::new().alias("test.example.com", "12345.gateway.example.cloud."),
    );
    let resolver = ChainResolver::new(table.clone());

    let outcome = resolver
        .resolve(&Name::new("test.example.com"), PATTERN, 5)
        .await;

    assert_eq!(
        outcome,
        ResolutionOutcome::Resolved {
            fqdn: Name::new("12345.gateway.example.cloud")
        }
    );
    assert_eq!(table.query_count(), 1);
}

#[tokio::test]
async fn test_chains_within_budget_cost_one_query_per_hop() {
    for k in 1..=5 {
        let table = Arc::new(chain_of(k));
        let outcome = ChainResolver::new(table.clone())
            .resolve(&Name::new("h0.example.com"), PATTERN, 5)
            .await;

        assert!(
            outcome.is_resolved_to(&Name::new("1.gateway.example.cloud")),
            "chain of {} gave {:?}",
            k,
            outcome
        );
        assert_eq!(table.query_count(), k);
    }
}

#[tokio::test]
async fn test_endless_chain_stops_at_hop_limit() {
    for max_hops in [1, 3, 5] {
        let lookup = Arc::new(EndlessChain {
            calls: AtomicUsize::new(0),
        });
        let outcome = ChainResolver::new(lookup.clone())
            .resolve(&Name::new("a.example.com"), PATTERN, max_hops)
            .await;

        let expected = format!("{}a.example.com", "next-".repeat(max_hops));
        assert_eq!(
            outcome,
            ResolutionOutcome::HopLimitExceeded {
                fqdn: Name::new(expected)
            }
        );
        assert_eq!(lookup.calls.load(Ordering::SeqCst), max_hops);
    }
}

#[tokio::test]
async fn test_self_reference_ignores_remaining_budget() {
    let table = Arc::new(
        StaticCnameTable::new()
            .alias("a.example.com", "b.example.com")
            .alias("b.example.com", "b.example.com."),
    );
    let outcome = ChainResolver::new(table.clone())
        .resolve(&Name::new("a.example.com"), PATTERN, 50)
        .await;

    assert!(outcome.is_resolved_to(&Name::new("b.example.com")));
    assert_eq!(table.query_count(), 2);
}

#[tokio::test]
async fn test_overrides_pin_part_of_chain() {
    let inner = Arc::new(
        StaticCnameTable::new()
            .alias("test.example.com", "failover.example.com")
            .failure("failover.example.com", LookupFailure::Timeout),
    );

    let mut overrides = HashMap::new();
    overrides.insert(
        Name::new("failover.example.com"),
        "67890.gateway.example.cloud.".to_string(),
    );
    let lookup = Arc::new(CnameLookupWithOverrides::new(inner.clone(), overrides));

    let outcome = ChainResolver::new(lookup)
        .resolve(&Name::new("test.example.com"), PATTERN, 5)
        .await;

    assert!(outcome.is_resolved_to(&Name::new("67890.gateway.example.cloud")));
    assert_eq!(inner.query_count(), 1);
}

#[tokio::test]
async fn test_concurrent_resolutions_are_independent() {
    let table = Arc::new(
        StaticCnameTable::new()
            .alias("a.example.com", "1.gateway.example.cloud")
            .alias("b.example.com", "2.gateway.example.cloud"),
    );
    let resolver = ChainResolver::new(table.clone());

    let mut handles = Vec::new();
    for (host, target) in [
        ("a.example.com", "1.gateway.example.cloud"),
        ("b.example.com", "2.gateway.example.cloud"),
    ] {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            let outcome = resolver.resolve(&Name::new(host), PATTERN, 5).await;
            outcome.is_resolved_to(&Name::new(target))
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(table.query_count(), 2);
}
