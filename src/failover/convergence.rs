//! Retry-until-convergence checking.
//!
//! [`ConvergenceChecker`] polls a [`ChainResolver`] until a hostname
//! resolves to an expected target, a hard failure stops it, or the retry
//! budget runs out. All three endings are reported as a
//! [`ConvergenceResult`]; only malformed input is an error.

use crate::base::{CheckState, ProbeError};
use crate::dns::{ChainResolver, Name, ResolutionOutcome, DEFAULT_MAX_HOPS};
use crate::failover::config::FailoverConfig;
use crate::failover::retry::{HardFailure, RetryPolicy};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;

/// Outcome of one wait-for-convergence call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvergenceResult {
    /// Hostname that was polled.
    pub hostname: Name,
    /// Target the hostname was expected to reach.
    pub expected: Name,
    /// Number of polls performed.
    pub attempts_made: usize,
    /// Last outcome observed.
    pub final_outcome: ResolutionOutcome,
    /// True iff `final_outcome` is `Resolved` to `expected`.
    pub converged: bool,
    /// How the check ended.
    pub state: CheckState,
    /// Every outcome observed, oldest first.
    pub history: Vec<ResolutionOutcome>,
}

impl ConvergenceResult {
    /// The hard failure that stopped the check, if any.
    pub fn hard_failure(&self) -> Option<HardFailure> {
        match self.state {
            CheckState::HardFailure => HardFailure::from_outcome(&self.final_outcome),
            _ => None,
        }
    }

    /// One-line verdict suitable for test failure messages.
    pub fn summary(&self) -> String {
        if self.converged {
            format!(
                "{} resolved to {} after {} attempt(s)",
                self.hostname, self.expected, self.attempts_made
            )
        } else {
            format!(
                "expected {} to resolve to {}, but {} after {} attempt(s)",
                self.hostname, self.expected, self.final_outcome, self.attempts_made
            )
        }
    }
}

/// A single check for [`ConvergenceChecker::check_all`].
#[derive(Debug, Clone)]
pub struct TargetCheck {
    pub hostname: Name,
    pub expected: Name,
    pub terminal_pattern: String,
    pub policy: RetryPolicy,
}

impl TargetCheck {
    pub fn new(
        hostname: impl Into<Name>,
        expected: impl Into<Name>,
        terminal_pattern: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            expected: expected.into(),
            terminal_pattern: terminal_pattern.into(),
            policy,
        }
    }
}

/// Polls a hostname until it resolves to an expected target.
///
/// The checker holds no mutable state; one instance can run any number of
/// checks concurrently.
#[derive(Debug, Clone)]
pub struct ConvergenceChecker {
    resolver: ChainResolver,
    max_hops: usize,
}

impl ConvergenceChecker {
    /// Creates a checker with the default hop limit.
    pub fn new(resolver: ChainResolver) -> Self {
        Self {
            resolver,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// Creates a checker that queries the server named in `config`.
    pub fn from_config(config: &FailoverConfig) -> Result<Self, ProbeError> {
        config.validate()?;
        Ok(Self::new(config.chain_resolver()).max_hops(config.max_hops))
    }

    /// Set the hop limit passed to the resolver.
    pub fn max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Wait for `hostname` to resolve to `expected_target`.
    ///
    /// Polls up to `retry_budget` times, sleeping `retry_delay` between
    /// attempts. Stops early on success or on a hard failure.
    pub async fn wait_for_target(
        &self,
        hostname: &Name,
        expected_target: &Name,
        terminal_pattern: &str,
        retry_budget: usize,
        retry_delay: Duration,
    ) -> Result<ConvergenceResult, ProbeError> {
        let policy = RetryPolicy::new(retry_budget, retry_delay);
        self.wait_with_policy(hostname, expected_target, terminal_pattern, &policy)
            .await
    }

    /// Same as [`wait_for_target`](Self::wait_for_target), taking the
    /// pattern and policy from `config`.
    pub async fn wait_with_config(
        &self,
        hostname: &Name,
        expected_target: &Name,
        config: &FailoverConfig,
    ) -> Result<ConvergenceResult, ProbeError> {
        self.wait_with_policy(
            hostname,
            expected_target,
            &config.terminal_pattern,
            &config.retry_policy(),
        )
        .await
    }

    /// Same as [`wait_for_target`](Self::wait_for_target) with an explicit
    /// [`RetryPolicy`].
    pub async fn wait_with_policy(
        &self,
        hostname: &Name,
        expected_target: &Name,
        terminal_pattern: &str,
        policy: &RetryPolicy,
    ) -> Result<ConvergenceResult, ProbeError> {
        if hostname.is_empty() {
            return Err(ProbeError::EmptyHostname);
        }
        if expected_target.is_empty() {
            return Err(ProbeError::EmptyExpectedTarget);
        }
        if terminal_pattern.is_empty() {
            return Err(ProbeError::EmptyTerminalPattern);
        }
        policy.validate()?;
        tracing::debug!(
            hostname = %hostname,
            expected = %expected_target,
            budget = policy.budget,
            max_wait = ?policy.total_delay(),
            "waiting for target"
        );

        let mut history = Vec::with_capacity(policy.budget.min(16));
        let mut attempt = 0;

        let (state, final_outcome) = loop {
            attempt += 1;
            let outcome = self
                .resolver
                .resolve(hostname, terminal_pattern, self.max_hops)
                .await;
            history.push(outcome.clone());

            if outcome.is_resolved_to(expected_target) {
                tracing::info!(
                    hostname = %hostname,
                    target = %expected_target,
                    attempt,
                    "hostname converged"
                );
                break (CheckState::Converged, outcome);
            }

            if let Some(failure) = HardFailure::from_outcome(&outcome) {
                tracing::warn!(
                    hostname = %hostname,
                    ?failure,
                    outcome = %outcome,
                    attempt,
                    "hard failure, giving up"
                );
                break (CheckState::HardFailure, outcome);
            }

            if !policy.should_retry(attempt) {
                tracing::warn!(
                    hostname = %hostname,
                    expected = %expected_target,
                    outcome = %outcome,
                    attempts = attempt,
                    "retry budget exhausted"
                );
                break (CheckState::ExhaustedBudget, outcome);
            }

            tracing::debug!(
                hostname = %hostname,
                outcome = %outcome,
                attempt,
                delay = ?policy.delay,
                "not converged yet"
            );
            tokio::time::sleep(policy.delay).await;
        };

        Ok(ConvergenceResult {
            hostname: hostname.clone(),
            expected: expected_target.clone(),
            attempts_made: attempt,
            converged: state == CheckState::Converged,
            final_outcome,
            state,
            history,
        })
    }

    /// Run independent checks concurrently.
    ///
    /// Results come back in the order of `checks`.
    pub async fn check_all(&self, checks: &[TargetCheck]) -> Vec<Result<ConvergenceResult, ProbeError>> {
        join_all(checks.iter().map(|check| {
            self.wait_with_policy(
                &check.hostname,
                &check.expected,
                &check.terminal_pattern,
                &check.policy,
            )
        }))
        .await
    }
}
