//! Failover check configuration.

use crate::base::error::ProbeError;
use crate::dns::{
    ChainResolver, HickoryCnameLookup, NameServer, DEFAULT_CALL_DEADLINE, DEFAULT_MAX_HOPS,
    DEFAULT_QUERY_TIMEOUT,
};
use crate::failover::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

/// Gateway suffix used by the local cloud emulator this tool was built for.
pub const DEFAULT_TERMINAL_PATTERN: &str = ".execute-api.localhost.localstack.cloud";

/// Environment variables read by [`FailoverConfig::from_env`].
pub mod env {
    pub const DNS_SERVER: &str = "FAILOVER_DNS_SERVER";
    pub const DNS_PORT: &str = "FAILOVER_DNS_PORT";
    pub const TERMINAL_PATTERN: &str = "FAILOVER_TERMINAL_PATTERN";
    pub const MAX_HOPS: &str = "FAILOVER_MAX_HOPS";
    pub const QUERY_TIMEOUT_MS: &str = "FAILOVER_QUERY_TIMEOUT_MS";
    pub const CALL_DEADLINE_MS: &str = "FAILOVER_CALL_DEADLINE_MS";
    pub const RETRY_BUDGET: &str = "FAILOVER_RETRY_BUDGET";
    pub const RETRY_DELAY_MS: &str = "FAILOVER_RETRY_DELAY_MS";
}

/// Settings for resolving and polling a failover record.
///
/// Durations are written as milliseconds when (de)serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// DNS server to query
    pub name_server: IpAddr,
    /// DNS server port
    pub port: u16,
    /// Substring marking a final target
    pub terminal_pattern: String,
    /// Maximum CNAME lookups per resolution
    pub max_hops: usize,
    /// Timeout for one query packet
    #[serde(rename = "query_timeout_ms", with = "millis")]
    pub query_timeout: Duration,
    /// Deadline for one lookup
    #[serde(rename = "call_deadline_ms", with = "millis")]
    pub call_deadline: Duration,
    /// Number of polling attempts
    pub retry_budget: usize,
    /// Delay between attempts
    #[serde(rename = "retry_delay_ms", with = "millis")]
    pub retry_delay: Duration,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            name_server: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 53,
            terminal_pattern: DEFAULT_TERMINAL_PATTERN.to_string(),
            max_hops: DEFAULT_MAX_HOPS,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            call_deadline: DEFAULT_CALL_DEADLINE,
            retry_budget: RetryPolicy::DEFAULT_BUDGET,
            retry_delay: RetryPolicy::DEFAULT_DELAY,
        }
    }
}

impl FailoverConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment.
    ///
    /// Unset variables keep their defaults; see [`env`] for the names.
    pub fn from_env() -> Result<Self, ProbeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, using the [`env`] names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProbeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(env::DNS_SERVER) {
            config.name_server = raw
                .trim()
                .parse()
                .map_err(|_| ProbeError::InvalidNameServer { value: raw.clone() })?;
        }
        if let Some(port) = parse_var(&lookup, env::DNS_PORT)? {
            config.port = port;
        }
        if let Some(pattern) = lookup(env::TERMINAL_PATTERN) {
            config.terminal_pattern = pattern;
        }
        if let Some(hops) = parse_var(&lookup, env::MAX_HOPS)? {
            config.max_hops = hops;
        }
        if let Some(ms) = parse_var(&lookup, env::QUERY_TIMEOUT_MS)? {
            config.query_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, env::CALL_DEADLINE_MS)? {
            config.call_deadline = Duration::from_millis(ms);
        }
        if let Some(budget) = parse_var(&lookup, env::RETRY_BUDGET)? {
            config.retry_budget = budget;
        }
        if let Some(ms) = parse_var(&lookup, env::RETRY_DELAY_MS)? {
            config.retry_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ProbeError> {
        serde_json::from_str(json).map_err(ProbeError::config_parse)
    }

    /// Set the DNS server address and port.
    pub fn name_server(mut self, address: IpAddr, port: u16) -> Self {
        self.name_server = address;
        self.port = port;
        self
    }

    /// Set the terminal pattern.
    pub fn terminal_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.terminal_pattern = pattern.into();
        self
    }

    /// Set the hop limit.
    pub fn max_hops(mut self, hops: usize) -> Self {
        self.max_hops = hops;
        self
    }

    /// Set the per-query timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the per-lookup deadline.
    pub fn call_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline = deadline;
        self
    }

    /// Set the retry budget.
    pub fn retry_budget(mut self, budget: usize) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Set the delay between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Reject configurations that could never produce a verdict.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.terminal_pattern.is_empty() {
            return Err(ProbeError::EmptyTerminalPattern);
        }
        self.retry_policy().validate()
    }

    /// The retry policy described by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_budget, self.retry_delay)
    }

    /// The nameserver entry for hickory lookups.
    pub fn name_server_entry(&self) -> NameServer {
        NameServer::new(self.name_server, self.port)
            .query_timeout(self.query_timeout)
            .lifetime(self.call_deadline)
    }

    /// A chain resolver querying the configured server.
    pub fn chain_resolver(&self) -> ChainResolver {
        let lookup = HickoryCnameLookup::new(self.name_server_entry());
        ChainResolver::new(Arc::new(lookup)).call_deadline(self.call_deadline)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ProbeError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ProbeError::invalid_env(key, raw)),
        None => Ok(None),
    }
}

pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
