//! Failover scenarios: an expected-target timeline checked step by step.
//!
//! A scenario only knows which target a hostname should reach at each
//! step. Whatever makes the target change (injecting or clearing a fault,
//! flipping a health check) happens in a [`StepHook`] supplied by the
//! caller.

use crate::base::ProbeError;
use crate::dns::Name;
use crate::failover::config::{millis, FailoverConfig};
use crate::failover::convergence::{ConvergenceChecker, ConvergenceResult};
use crate::failover::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::{future::Future, path::Path, pin::Pin, time::Duration};

/// Health-check timing used to derive how long to wait for DNS to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioTiming {
    /// Interval between health checks
    pub health_check_interval: Duration,
    /// Consecutive failures before the record flips
    pub failure_threshold: u32,
    /// Extra slack for propagation
    pub grace: Duration,
    /// Wait before the first step
    pub initial_wait: Duration,
}

impl Default for ScenarioTiming {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(10),
            failure_threshold: 2,
            grace: Duration::from_secs(25),
            initial_wait: Duration::from_secs(10),
        }
    }
}

impl ScenarioTiming {
    /// No waiting at all; for tests and pre-converged environments.
    pub fn immediate() -> Self {
        Self {
            health_check_interval: Duration::ZERO,
            failure_threshold: 0,
            grace: Duration::ZERO,
            initial_wait: Duration::ZERO,
        }
    }

    /// Time for the health check to notice a change and DNS to follow.
    pub fn reaction_wait(&self) -> Duration {
        self.health_check_interval
            .saturating_mul(self.failure_threshold)
            .saturating_add(self.grace)
    }
}

/// One expected state of the hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    /// Human-readable step name
    pub label: String,
    /// Target the hostname must resolve to
    pub expected_target: Name,
    /// Wait after the hook runs and before polling starts
    #[serde(rename = "settle_ms", with = "millis", default)]
    pub settle: Duration,
}

impl ScenarioStep {
    pub fn new(label: impl Into<String>, expected_target: impl Into<Name>) -> Self {
        Self {
            label: label.into(),
            expected_target: expected_target.into(),
            settle: Duration::ZERO,
        }
    }

    /// Set the settle delay.
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

/// An ordered timeline of expected targets for one hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverScenario {
    /// Hostname under test
    pub hostname: Name,
    /// Wait before the first step
    #[serde(rename = "initial_wait_ms", with = "millis", default)]
    pub initial_wait: Duration,
    /// Steps in order
    pub steps: Vec<ScenarioStep>,
}

impl FailoverScenario {
    /// Creates a scenario with no steps.
    pub fn new(hostname: impl Into<Name>) -> Self {
        Self {
            hostname: hostname.into(),
            initial_wait: Duration::ZERO,
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, step: ScenarioStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Set the initial wait.
    pub fn initial_wait(mut self, wait: Duration) -> Self {
        self.initial_wait = wait;
        self
    }

    /// Primary, then secondary after a fault, then primary after recovery.
    pub fn failover_cycle(
        hostname: impl Into<Name>,
        primary: impl Into<Name>,
        secondary: impl Into<Name>,
        timing: &ScenarioTiming,
    ) -> Self {
        let primary = primary.into();
        let reaction = timing.reaction_wait();
        Self::new(hostname)
            .initial_wait(timing.initial_wait)
            .step(ScenarioStep::new("initial resolution", primary.clone()))
            .step(ScenarioStep::new("failover to secondary", secondary).settle(reaction))
            .step(ScenarioStep::new("failback to primary", primary).settle(reaction))
    }

    /// Parse a scenario from JSON.
    pub fn from_json(json: &str) -> Result<Self, ProbeError> {
        let scenario: Self = serde_json::from_str(json).map_err(ProbeError::scenario_parse)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Read and parse a scenario file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProbeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProbeError::ScenarioIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ProbeError> {
        serde_json::to_string_pretty(self).map_err(ProbeError::encode)
    }

    /// Reject scenarios that cannot be run.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.hostname.is_empty() {
            return Err(ProbeError::EmptyHostname);
        }
        if self.steps.is_empty() {
            return Err(ProbeError::EmptyScenario);
        }
        if self.steps.iter().any(|s| s.expected_target.is_empty()) {
            return Err(ProbeError::EmptyExpectedTarget);
        }
        Ok(())
    }
}

/// Error type returned by step hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by [`StepHook::before_step`].
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send + 'a>>;

/// Action run before each step, e.g. injecting or clearing a fault.
pub trait StepHook: Send {
    fn before_step<'a>(&'a mut self, index: usize, step: &'a ScenarioStep) -> HookFuture<'a>;
}

/// A hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl StepHook for NoopHook {
    fn before_step<'a>(&'a mut self, _index: usize, _step: &'a ScenarioStep) -> HookFuture<'a> {
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub label: String,
    pub result: ConvergenceResult,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.result.converged
    }
}

/// Result of a scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub hostname: Name,
    /// Steps in the scenario, executed or not
    pub total_steps: usize,
    /// Reports for the steps that ran
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    /// True iff every step ran and converged.
    pub fn passed(&self) -> bool {
        self.steps.len() == self.total_steps && self.steps.iter().all(StepReport::passed)
    }

    /// The first step that did not converge.
    pub fn first_failure(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| !s.passed())
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String, ProbeError> {
        serde_json::to_string_pretty(self).map_err(ProbeError::encode)
    }
}

/// Runs [`FailoverScenario`]s against a [`ConvergenceChecker`].
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    checker: ConvergenceChecker,
    terminal_pattern: String,
    policy: RetryPolicy,
    keep_going: bool,
}

impl ScenarioRunner {
    pub fn new(
        checker: ConvergenceChecker,
        terminal_pattern: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            checker,
            terminal_pattern: terminal_pattern.into(),
            policy,
            keep_going: false,
        }
    }

    /// Build a runner that queries the server named in `config`.
    pub fn from_config(config: &FailoverConfig) -> Result<Self, ProbeError> {
        let checker = ConvergenceChecker::from_config(config)?;
        Ok(Self::new(
            checker,
            config.terminal_pattern.clone(),
            config.retry_policy(),
        ))
    }

    /// Continue with later steps after a step fails.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Run every step of `scenario` in order.
    pub async fn run(
        &self,
        scenario: &FailoverScenario,
        hook: &mut dyn StepHook,
    ) -> Result<ScenarioReport, ProbeError> {
        scenario.validate()?;

        let mut report = ScenarioReport {
            hostname: scenario.hostname.clone(),
            total_steps: scenario.steps.len(),
            steps: Vec::with_capacity(scenario.steps.len()),
        };

        if !scenario.initial_wait.is_zero() {
            tracing::debug!(wait = ?scenario.initial_wait, "waiting before first step");
            tokio::time::sleep(scenario.initial_wait).await;
        }

        for (index, step) in scenario.steps.iter().enumerate() {
            hook.before_step(index, step)
                .await
                .map_err(|e| ProbeError::hook(step.label.clone(), e.to_string()))?;

            if !step.settle.is_zero() {
                tracing::debug!(step = %step.label, wait = ?step.settle, "settling");
                tokio::time::sleep(step.settle).await;
            }

            let result = self
                .checker
                .wait_with_policy(
                    &scenario.hostname,
                    &step.expected_target,
                    &self.terminal_pattern,
                    &self.policy,
                )
                .await?;

            let passed = result.converged;
            if passed {
                tracing::info!(step = %step.label, index, "step passed");
            } else {
                tracing::warn!(step = %step.label, index, verdict = %result.summary(), "step failed");
            }

            report.steps.push(StepReport {
                index,
                label: step.label.clone(),
                result,
            });

            if !passed && !self.keep_going {
                break;
            }
        }

        Ok(report)
    }
}
