use thiserror::Error;

/// Errors raised before any DNS traffic happens: bad input, bad
/// configuration, unreadable scenarios or a failing step hook.
///
/// Resolution results are never reported through this type; see
/// [`crate::dns::ResolutionOutcome`].
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ProbeError {
    // Input Errors
    #[error("Hostname is empty")]
    EmptyHostname,
    #[error("Expected target is empty")]
    EmptyExpectedTarget,
    #[error("Terminal pattern is empty")]
    EmptyTerminalPattern,
    #[error("Retry budget must be at least 1")]
    ZeroRetryBudget,

    // Configuration Errors
    #[error("Invalid name server address: {value}")]
    InvalidNameServer { value: String },
    #[error("Invalid value for {key}: {value}")]
    InvalidEnvVar { key: String, value: String },
    #[error("Failed to parse config: {message}")]
    ConfigParse { message: String },

    // Scenario Errors
    #[error("Scenario has no steps")]
    EmptyScenario,
    #[error("Failed to parse scenario: {message}")]
    ScenarioParse { message: String },
    #[error("Failed to read scenario {path}: {message}")]
    ScenarioIo { path: String, message: String },
    #[error("Step hook failed before '{step}': {message}")]
    Hook { step: String, message: String },

    // Output Errors
    #[error("Failed to encode JSON: {message}")]
    Encode { message: String },
}

impl ProbeError {
    /// Create an invalid environment variable error.
    pub fn invalid_env(key: impl Into<String>, value: impl Into<String>) -> Self {
        ProbeError::InvalidEnvVar {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a hook failure error for the named step.
    pub fn hook(step: impl Into<String>, message: impl Into<String>) -> Self {
        ProbeError::Hook {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Whether the error was caused by caller input rather than the
    /// environment (files, env vars, hooks).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ProbeError::EmptyHostname
                | ProbeError::EmptyExpectedTarget
                | ProbeError::EmptyTerminalPattern
                | ProbeError::ZeroRetryBudget
        )
    }

    pub(crate) fn config_parse(err: serde_json::Error) -> Self {
        ProbeError::ConfigParse {
            message: err.to_string(),
        }
    }

    pub(crate) fn scenario_parse(err: serde_json::Error) -> Self {
        ProbeError::ScenarioParse {
            message: err.to_string(),
        }
    }

    pub(crate) fn encode(err: serde_json::Error) -> Self {
        ProbeError::Encode {
            message: err.to_string(),
        }
    }
}
