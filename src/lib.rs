//! # failover-probe
//!
//! DNS failover verification for health-check-driven records.
//!
//! `failover-probe` answers one question repeatedly: *which backend does this
//! hostname point at right now?* It follows the hostname's CNAME chain to a
//! recognizable gateway target and polls until that target matches what a
//! failover timeline expects.
//!
//! ## Features
//!
//! - **Chain Resolution**: bounded hop-by-hop CNAME traversal with a closed
//!   set of classified outcomes
//! - **Convergence Checks**: fixed-delay polling that stops early on success
//!   or on failures retries cannot fix
//! - **Scenarios**: primary → secondary → primary timelines with a hook for
//!   whatever degrades and restores the backend
//! - **No Caching**: every attempt is a fresh query against one nameserver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use failover_probe::dns::Name;
//! use failover_probe::failover::{ConvergenceChecker, FailoverConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = FailoverConfig::from_env().unwrap();
//!     let checker = ConvergenceChecker::from_config(&config).unwrap();
//!     let result = checker
//!         .wait_with_config(
//!             &Name::new("test.example.com"),
//!             &Name::new("12345.execute-api.localhost.localstack.cloud"),
//!             &config,
//!         )
//!         .await
//!         .unwrap();
//!     println!("{}", result.summary());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and check states
//! - [`dns`] - CNAME lookups and chain traversal
//! - [`failover`] - Convergence checking, scenarios and configuration

pub mod base;
pub mod dns;
pub mod failover;
