//! Polling policy for convergence checks.
//!
//! Unlike request retries, a convergence check retries on *wrong but
//! plausible* answers and stops on transport-level failures. See
//! [`HardFailure`] for the outcomes that end a check early.

use crate::base::error::ProbeError;
use crate::dns::ResolutionOutcome;
use std::time::Duration;

/// Outcomes that end a check without further attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HardFailure {
    /// Query or per-call deadline elapsed
    Timeout,
    /// Transport error, malformed response, refusal
    QueryError,
    /// Chain too long or looping
    HopLimitExceeded,
}

impl HardFailure {
    /// Map an outcome to a hard failure, if it is one.
    pub fn from_outcome(outcome: &ResolutionOutcome) -> Option<Self> {
        match outcome {
            ResolutionOutcome::Timeout { .. } => Some(Self::Timeout),
            ResolutionOutcome::QueryError { .. } => Some(Self::QueryError),
            ResolutionOutcome::HopLimitExceeded { .. } => Some(Self::HopLimitExceeded),
            _ => None,
        }
    }
}

/// Fixed-delay polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least 1)
    pub budget: usize,
    /// Delay between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: Self::DEFAULT_BUDGET,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub const DEFAULT_BUDGET: usize = 4;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    /// Create a policy.
    pub fn new(budget: usize, delay: Duration) -> Self {
        Self { budget, delay }
    }

    /// A policy that polls `budget` times back to back.
    pub fn no_delay(budget: usize) -> Self {
        Self::new(budget, Duration::ZERO)
    }

    /// Reject a zero budget.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.budget == 0 {
            return Err(ProbeError::ZeroRetryBudget);
        }
        Ok(())
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.budget
    }

    /// Upper bound of time spent sleeping if every attempt is used.
    pub fn total_delay(&self) -> Duration {
        let sleeps = u32::try_from(self.budget.saturating_sub(1)).unwrap_or(u32::MAX);
        self.delay.saturating_mul(sleeps)
    }
}
