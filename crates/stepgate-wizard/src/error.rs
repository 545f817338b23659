use thiserror::Error;

pub type Result<T> = std::result::Result<T, WizardError>;

/// Construction failures and rejected navigation actions.
///
/// A rejected action leaves `active` and `progress` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("a wizard needs at least one step")]
    NoSteps,

    #[error("already on the first step")]
    AtFirstStep,

    #[error("already on the last step")]
    AtLastStep,

    #[error("step {index} has unmet requirements")]
    StepInvalid { index: usize },

    #[error("step {index} has not been reached yet (progress {progress})")]
    NotReached { index: usize, progress: usize },

    #[error("step {index} is out of range for {len} steps")]
    OutOfRange { index: usize, len: usize },

    #[error("cannot finish (progress {progress} of {last}, all steps valid: {all_valid})")]
    FinishBlocked {
        progress: usize,
        last: usize,
        all_valid: bool,
    },
}

impl WizardError {
    /// Short machine-friendly tag, used as a log field.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NoSteps => "no_steps",
            Self::AtFirstStep => "at_first_step",
            Self::AtLastStep => "at_last_step",
            Self::StepInvalid { .. } => "step_invalid",
            Self::NotReached { .. } => "not_reached",
            Self::OutOfRange { .. } => "out_of_range",
            Self::FinishBlocked { .. } => "finish_blocked",
        }
    }
}
