//! Failover verification.
//!
//! - [`ConvergenceChecker`]: poll a hostname until it reaches a target
//! - [`RetryPolicy`] / [`HardFailure`]: when to keep polling and when to stop
//! - [`FailoverScenario`] / [`ScenarioRunner`]: multi-step expected timelines
//! - [`FailoverConfig`]: defaults, env overrides, JSON
//! - [`TargetEndpoint`]: URLs on the resolved target

pub mod config;
pub mod convergence;
pub mod endpoint;
pub mod retry;
pub mod scenario;

// Re-exports for convenience
pub use config::FailoverConfig;
pub use convergence::{ConvergenceChecker, ConvergenceResult, TargetCheck};
pub use endpoint::TargetEndpoint;
pub use retry::{HardFailure, RetryPolicy};
pub use scenario::{
    FailoverScenario, HookError, HookFuture, NoopHook, ScenarioReport, ScenarioRunner,
    ScenarioStep, ScenarioTiming, StepHook, StepReport,
};
