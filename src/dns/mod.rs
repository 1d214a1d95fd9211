//! DNS CNAME resolution.
//!
//! Provides pluggable CNAME lookups and the chain traversal built on them:
//! - [`CnameLookup`]: one query, one classified answer
//! - [`HickoryCnameLookup`]: lookups against a single nameserver via hickory-dns
//! - [`StaticCnameTable`] and [`CnameLookupWithOverrides`]: in-memory answers
//! - [`ChainResolver`]: bounded hop-by-hop traversal to a terminal target
//!
//! # Example
//!
//! ```rust,ignore
//! use failover_probe::dns::{ChainResolver, HickoryCnameLookup, Name, NameServer};
//! use std::sync::Arc;
//!
//! let lookup = HickoryCnameLookup::new(NameServer::default());
//! let resolver = ChainResolver::new(Arc::new(lookup));
//! let outcome = resolver
//!     .resolve(&Name::new("test.example.com"), ".gateway.example.cloud", 5)
//!     .await;
//! println!("{}", outcome);
//! ```

mod chain;
mod hickory;
mod resolve;

pub use chain::{ChainResolver, ResolutionOutcome, DEFAULT_CALL_DEADLINE, DEFAULT_MAX_HOPS};
pub use hickory::{HickoryCnameLookup, NameServer, DEFAULT_LOOKUP_LIFETIME, DEFAULT_QUERY_TIMEOUT};
pub use resolve::{
    CnameLookup, CnameLookupWithOverrides, CnameResult, LookupFailure, Name, Querying,
    StaticCnameTable,
};
