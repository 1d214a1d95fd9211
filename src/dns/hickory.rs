//! CNAME lookups against a single nameserver using hickory-dns.
//!
//! Unlike a general-purpose resolver, this lookup talks to exactly one
//! configured server and never caches: a fresh resolver is built for every
//! query and dropped when it completes. Cached answers would hide the DNS
//! changes a failover check is waiting for.

use super::{CnameLookup, LookupFailure, Name, Querying};
use hickory_resolver::{
    config::{NameServerConfigGroup, ResolverConfig},
    name_server::TokioConnectionProvider,
    proto::{
        op::ResponseCode,
        rr::{RData, RecordType},
        ProtoErrorKind,
    },
    ResolveError, ResolveErrorKind, TokioResolver,
};
use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

/// Default per-query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Default overall lifetime of one lookup, across internal attempts.
pub const DEFAULT_LOOKUP_LIFETIME: Duration = Duration::from_secs(5);

/// Where and how long to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameServer {
    /// Server address
    pub address: IpAddr,
    /// Server port
    pub port: u16,
    /// Timeout for a single query packet
    pub query_timeout: Duration,
    /// Upper bound for the whole lookup
    pub lifetime: Duration,
}

impl Default for NameServer {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 53,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            lifetime: DEFAULT_LOOKUP_LIFETIME,
        }
    }
}

impl NameServer {
    /// Create a server entry with default timeouts.
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self {
            address,
            port,
            ..Default::default()
        }
    }

    /// Set the per-query timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the overall lookup lifetime.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// How many query packets fit in one lifetime (at least one).
    pub fn attempts(&self) -> usize {
        let per_query = self.query_timeout.as_millis().max(1);
        (self.lifetime.as_millis() / per_query).max(1) as usize
    }
}

/// CNAME lookup backed by hickory-dns.
///
/// # Example
///
/// ```rust,ignore
/// use failover_probe::dns::{CnameLookup, HickoryCnameLookup, Name, NameServer};
///
/// let lookup = HickoryCnameLookup::new(NameServer::new("127.0.0.1".parse()?, 53));
/// let target = lookup.lookup_cname(Name::new("test.example.com")).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct HickoryCnameLookup {
    server: NameServer,
}

impl HickoryCnameLookup {
    /// Creates a lookup that queries `server`.
    pub fn new(server: NameServer) -> Self {
        Self { server }
    }

    fn build_resolver(&self) -> TokioResolver {
        let group =
            NameServerConfigGroup::from_ips_clear(&[self.server.address], self.server.port, true);
        let config = ResolverConfig::from_parts(None, vec![], group);

        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        let opts = builder.options_mut();
        opts.timeout = self.server.query_timeout;
        opts.attempts = self.server.attempts();
        opts.cache_size = 0;
        opts.ndots = 0;

        builder.build()
    }
}

impl CnameLookup for HickoryCnameLookup {
    fn lookup_cname(&self, name: Name) -> Querying {
        let resolver = self.build_resolver();
        let lifetime = self.server.lifetime;
        let server = self.server.address;
        Box::pin(async move {
            let fqdn = name.to_fqdn();
            tracing::debug!(hostname = %name, server = %server, "querying CNAME via hickory-dns");

            let answer = tokio::time::timeout(
                lifetime,
                resolver.lookup(fqdn.as_str(), RecordType::CNAME),
            )
            .await;

            let lookup = match answer {
                Err(_) => {
                    tracing::debug!(hostname = %name, ?lifetime, "CNAME lookup exceeded lifetime");
                    return Err(LookupFailure::Timeout);
                }
                Ok(Err(e)) => {
                    let failure = classify_error(&e);
                    tracing::debug!(hostname = %name, error = %e, ?failure, "CNAME lookup failed");
                    return Err(failure);
                }
                Ok(Ok(lookup)) => lookup,
            };

            let target = lookup.iter().find_map(|rdata| match rdata {
                RData::CNAME(cname) => Some(cname.0.to_utf8()),
                _ => None,
            });

            tracing::debug!(hostname = %name, target = ?target, "CNAME lookup complete");
            Ok(target)
        })
    }
}

/// Map a hickory error onto the lookup failure taxonomy.
pub(crate) fn classify_error(err: &ResolveError) -> LookupFailure {
    match err.kind() {
        ResolveErrorKind::Proto(proto) => match proto.kind() {
            ProtoErrorKind::NoRecordsFound { response_code, .. } => {
                classify_response_code(*response_code)
            }
            ProtoErrorKind::Timeout => LookupFailure::Timeout,
            _ => LookupFailure::Query(err.to_string()),
        },
        _ => LookupFailure::Query(err.to_string()),
    }
}

/// Negative answers carry the server's rcode. Only NOERROR (name exists,
/// no CNAME) and NXDOMAIN are answers; SERVFAIL, REFUSED and the rest are
/// failures of the server.
pub(crate) fn classify_response_code(code: ResponseCode) -> LookupFailure {
    match code {
        ResponseCode::NoError => LookupFailure::NoRecord,
        ResponseCode::NXDomain => LookupFailure::NotFound,
        other => LookupFailure::Query(format!("server answered {}", other)),
    }
}
