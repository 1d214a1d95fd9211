//! Bounded CNAME-chain traversal.
//!
//! [`ChainResolver`] follows aliases hop by hop until it reaches a hostname
//! containing a terminal pattern, a name that is not an alias, a failure,
//! or the hop limit. Every call is a single probe: nothing is retried and
//! nothing is cached between calls.

use super::{CnameLookup, LookupFailure, Name};
use std::{fmt, sync::Arc, time::Duration};

/// Default number of CNAME lookups per resolution.
pub const DEFAULT_MAX_HOPS: usize = 5;

/// Default deadline for a single lookup issued by the chain resolver.
pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(5);

/// The classified result of resolving a hostname's ultimate target.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// A terminal target was reached.
    Resolved { fqdn: Name },
    /// The hostname reached has no CNAME; it is the final answer.
    NoRecord { fqdn: Name },
    /// The queried name does not exist.
    NotFound { name: Name },
    /// The lookup for `name` did not finish in time.
    Timeout { name: Name },
    /// The lookup for `name` failed for another reason.
    QueryError { name: Name, reason: String },
    /// The hop budget ran out; `fqdn` is the last hostname reached.
    HopLimitExceeded { fqdn: Name },
}

impl ResolutionOutcome {
    /// The resolved terminal target, if any.
    pub fn resolved(&self) -> Option<&Name> {
        match self {
            ResolutionOutcome::Resolved { fqdn } => Some(fqdn),
            _ => None,
        }
    }

    /// The final hostname for outcomes that produce one (`Resolved` and
    /// `NoRecord`).
    pub fn final_host(&self) -> Option<&Name> {
        match self {
            ResolutionOutcome::Resolved { fqdn } | ResolutionOutcome::NoRecord { fqdn } => {
                Some(fqdn)
            }
            _ => None,
        }
    }

    /// Whether the outcome is `Resolved` with exactly `expected`.
    pub fn is_resolved_to(&self, expected: &Name) -> bool {
        self.resolved() == Some(expected)
    }

    /// Short name of the outcome kind, for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionOutcome::Resolved { .. } => "resolved",
            ResolutionOutcome::NoRecord { .. } => "no_record",
            ResolutionOutcome::NotFound { .. } => "not_found",
            ResolutionOutcome::Timeout { .. } => "timeout",
            ResolutionOutcome::QueryError { .. } => "query_error",
            ResolutionOutcome::HopLimitExceeded { .. } => "hop_limit_exceeded",
        }
    }
}

impl fmt::Display for ResolutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionOutcome::Resolved { fqdn } => write!(f, "resolved to {}", fqdn),
            ResolutionOutcome::NoRecord { fqdn } => write!(f, "{} is not an alias", fqdn),
            ResolutionOutcome::NotFound { name } => write!(f, "{} does not exist", name),
            ResolutionOutcome::Timeout { name } => write!(f, "lookup of {} timed out", name),
            ResolutionOutcome::QueryError { name, reason } => {
                write!(f, "lookup of {} failed: {}", name, reason)
            }
            ResolutionOutcome::HopLimitExceeded { fqdn } => {
                write!(f, "hop limit exceeded at {}", fqdn)
            }
        }
    }
}

/// Per-call traversal state.
#[derive(Debug)]
struct ChainTraversal {
    current: Name,
    hops: usize,
}

/// Follows CNAME chains through a [`CnameLookup`].
///
/// The terminal pattern is checked before every lookup, including the
/// first, so a hostname that already matches costs zero queries and a
/// chain that reaches the pattern stops without a trailing lookup.
///
/// Degenerate answers (an empty target, or a target equal to the name
/// queried) end traversal with the current hostname as the result.
#[derive(Clone)]
pub struct ChainResolver {
    lookup: Arc<dyn CnameLookup>,
    call_deadline: Duration,
}

impl ChainResolver {
    /// Creates a resolver with the default per-call deadline.
    pub fn new(lookup: Arc<dyn CnameLookup>) -> Self {
        Self {
            lookup,
            call_deadline: DEFAULT_CALL_DEADLINE,
        }
    }

    /// Set the deadline applied to each lookup.
    pub fn call_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline = deadline;
        self
    }

    /// Resolve `hostname` to its terminal target.
    ///
    /// Issues at most `max_hops` lookups. See [`ResolutionOutcome`] for the
    /// possible results; this never fails with an error.
    pub async fn resolve(
        &self,
        hostname: &Name,
        terminal_pattern: &str,
        max_hops: usize,
    ) -> ResolutionOutcome {
        if hostname.is_empty() {
            return ResolutionOutcome::QueryError {
                name: hostname.clone(),
                reason: "empty hostname".to_string(),
            };
        }

        let mut state = ChainTraversal {
            current: hostname.clone(),
            hops: 0,
        };

        if state.current.matches_terminal(terminal_pattern) {
            return ResolutionOutcome::Resolved {
                fqdn: state.current,
            };
        }

        while state.hops < max_hops {
            tracing::debug!(hostname = %state.current, hop = state.hops, "looking up CNAME");

            let answer = match tokio::time::timeout(
                self.call_deadline,
                self.lookup.lookup_cname(state.current.clone()),
            )
            .await
            {
                Ok(answer) => answer,
                Err(_) => Err(LookupFailure::Timeout),
            };

            let raw_target = match answer {
                Ok(Some(target)) => target,
                Ok(None) | Err(LookupFailure::NoRecord) => {
                    return ResolutionOutcome::NoRecord {
                        fqdn: state.current,
                    };
                }
                Err(LookupFailure::NotFound) => {
                    return ResolutionOutcome::NotFound {
                        name: state.current,
                    };
                }
                Err(LookupFailure::Timeout) => {
                    return ResolutionOutcome::Timeout {
                        name: state.current,
                    };
                }
                Err(LookupFailure::Query(reason)) => {
                    return ResolutionOutcome::QueryError {
                        name: state.current,
                        reason,
                    };
                }
            };

            let next = Name::new(raw_target);
            if next.is_empty() || next == state.current {
                tracing::debug!(hostname = %state.current, "degenerate CNAME answer, treating as final");
                return ResolutionOutcome::Resolved {
                    fqdn: state.current,
                };
            }

            tracing::debug!(from = %state.current, target = %next, "following CNAME");
            state.current = next;
            state.hops += 1;

            if state.current.matches_terminal(terminal_pattern) {
                return ResolutionOutcome::Resolved {
                    fqdn: state.current,
                };
            }
        }

        tracing::debug!(hostname = %state.current, max_hops, "CNAME hop limit exceeded");
        ResolutionOutcome::HopLimitExceeded {
            fqdn: state.current,
        }
    }
}

impl fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainResolver")
            .field("call_deadline", &self.call_deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{Querying, StaticCnameTable};

    const PATTERN: &str = ".gateway.example.cloud";

    fn resolver(table: &Arc<StaticCnameTable>) -> ChainResolver {
        ChainResolver::new(table.clone())
    }

    #[tokio::test]
    async fn test_terminal_hostname_needs_no_query() {
        let table = Arc::new(StaticCnameTable::new());
        for max_hops in [0, 1, 5] {
            let outcome = resolver(&table)
                .resolve(&Name::new("12345.gateway.example.cloud"), PATTERN, max_hops)
                .await;
            assert_eq!(
                outcome,
                ResolutionOutcome::Resolved {
                    fqdn: Name::new("12345.gateway.example.cloud")
                }
            );
        }
        assert_eq!(table.query_count(), 0);
    }

    #[tokio::test]
    async fn test_single_hop_to_gateway() {
        let table = Arc::new(
            StaticCnameTable::new().alias("test.example.com", "12345.gateway.example.cloud."),
        );
        let outcome = resolver(&table)
            .resolve(&Name::new("test.example.com"), PATTERN, DEFAULT_MAX_HOPS)
            .await;

        assert_eq!(
            outcome.resolved(),
            Some(&Name::new("12345.gateway.example.cloud"))
        );
        assert_eq!(table.query_count(), 1);
    }

    #[tokio::test]
    async fn test_chain_of_max_length_resolves() {
        let table = Arc::new(
            StaticCnameTable::new()
                .alias("h0.example.com", "h1.example.com")
                .alias("h1.example.com", "h2.example.com")
                .alias("h2.example.com", "999.gateway.example.cloud"),
        );
        let outcome = resolver(&table)
            .resolve(&Name::new("h0.example.com"), PATTERN, 3)
            .await;

        assert!(outcome.is_resolved_to(&Name::new("999.gateway.example.cloud")));
        assert_eq!(table.query_count(), 3);
    }

    #[tokio::test]
    async fn test_hop_limit_reports_last_hostname() {
        let table = Arc::new(
            StaticCnameTable::new()
                .alias("h0.example.com", "h1.example.com")
                .alias("h1.example.com", "h2.example.com")
                .alias("h2.example.com", "h3.example.com")
                .alias("h3.example.com", "999.gateway.example.cloud"),
        );
        let outcome = resolver(&table)
            .resolve(&Name::new("h0.example.com"), PATTERN, 2)
            .await;

        assert_eq!(
            outcome,
            ResolutionOutcome::HopLimitExceeded {
                fqdn: Name::new("h2.example.com")
            }
        );
        assert_eq!(table.query_count(), 2);
    }

    #[tokio::test]
    async fn test_self_reference_is_final() {
        let table = Arc::new(StaticCnameTable::new().alias("loop.example.com", "loop.example.com."));
        let outcome = resolver(&table)
            .resolve(&Name::new("loop.example.com"), PATTERN, 100)
            .await;

        assert!(outcome.is_resolved_to(&Name::new("loop.example.com")));
        assert_eq!(table.query_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_target_is_final() {
        let table = Arc::new(
            StaticCnameTable::new()
                .alias("a.example.com", "b.example.com")
                .alias("b.example.com", "."),
        );
        let outcome = resolver(&table)
            .resolve(&Name::new("a.example.com"), PATTERN, 5)
            .await;

        assert!(outcome.is_resolved_to(&Name::new("b.example.com")));
        assert_eq!(table.query_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_classified() {
        let table = Arc::new(
            StaticCnameTable::new()
                .failure("nx.example.com", LookupFailure::NotFound)
                .failure("slow.example.com", LookupFailure::Timeout)
                .failure("bad.example.com", LookupFailure::Query("SERVFAIL".into())),
        );
        let r = resolver(&table);

        assert_eq!(
            r.resolve(&Name::new("nx.example.com"), PATTERN, 5).await,
            ResolutionOutcome::NotFound {
                name: Name::new("nx.example.com")
            }
        );
        assert_eq!(
            r.resolve(&Name::new("slow.example.com"), PATTERN, 5).await,
            ResolutionOutcome::Timeout {
                name: Name::new("slow.example.com")
            }
        );
        assert_eq!(
            r.resolve(&Name::new("bad.example.com"), PATTERN, 5).await,
            ResolutionOutcome::QueryError {
                name: Name::new("bad.example.com"),
                reason: "SERVFAIL".into()
            }
        );
        assert_eq!(
            r.resolve(&Name::new("plain.example.com"), PATTERN, 5).await,
            ResolutionOutcome::NoRecord {
                fqdn: Name::new("plain.example.com")
            }
        );
    }

    #[tokio::test]
    async fn test_empty_hostname_issues_no_query() {
        let table = Arc::new(StaticCnameTable::new());
        let outcome = resolver(&table).resolve(&Name::new(""), PATTERN, 5).await;

        assert!(matches!(outcome, ResolutionOutcome::QueryError { .. }));
        assert_eq!(table.query_count(), 0);
    }

    struct HangingLookup;

    impl CnameLookup for HangingLookup {
        fn lookup_cname(&self, _name: Name) -> Querying {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_deadline_yields_timeout() {
        let r = ChainResolver::new(Arc::new(HangingLookup)).call_deadline(Duration::from_secs(5));
        let outcome = r.resolve(&Name::new("test.example.com"), PATTERN, 5).await;

        assert_eq!(
            outcome,
            ResolutionOutcome::Timeout {
                name: Name::new("test.example.com")
            }
        );
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let outcome = ResolutionOutcome::Resolved {
            fqdn: Name::new("12345.gateway.example.cloud"),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "resolved");
        assert_eq!(json["fqdn"], "12345.gateway.example.cloud");
        assert_eq!(outcome.kind(), "resolved");
    }
}
