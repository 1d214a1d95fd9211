/// The state of a single convergence check.
///
/// A check starts in `Polling` and ends in exactly one of the other
/// states. There are no transitions back to `Polling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Still issuing attempts.
    #[default]
    Polling,

    /// The expected target was observed.
    Converged,

    /// Every attempt ran without matching or hard-failing.
    ExhaustedBudget,

    /// A timeout, query error or hop-limit outcome stopped the check early.
    HardFailure,
}

impl CheckState {
    /// Whether the check has stopped.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CheckState::Polling)
    }

    /// Whether the check ended in success.
    pub fn is_success(&self) -> bool {
        matches!(self, CheckState::Converged)
    }
}
