use std::time::Duration;

use thiserror::Error;

use super::types::WorkflowState;
use crate::config::ConfigError;

/// Failure reported by an external collaborator (recognizer, filler, submitter).
///
/// Always recorded as an ordinary failed outcome; never aborts a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Run-level refusals. Everything that happens inside a run is reported
/// through `WorkflowResult` instead.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("A workflow is already running against this form session")]
    SessionBusy,

    #[error("Run ended in {state} before filling started; nothing to retry")]
    NotRetryable { state: WorkflowState },

    #[error("Retry limit reached after {attempts} attempts")]
    RetryLimitReached { attempts: u32 },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}
