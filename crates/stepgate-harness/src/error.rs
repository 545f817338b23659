use stepgate::wizard::WizardError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid validation pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Wizard(#[from] WizardError),
}
