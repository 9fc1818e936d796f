use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::extraction::ExtractedFields;
use crate::pipeline::fields::CanonicalField;
use crate::pipeline::validation::{ErrorKind, ValidationOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    Capturing,
    Detecting,
    Extracting,
    Validating,
    FailedValidation,
    Mapping,
    Filling,
    Submitting,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Detecting => "detecting",
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::FailedValidation => "failed_validation",
            Self::Mapping => "mapping",
            Self::Filling => "filling",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FailedValidation | Self::Completed | Self::Failed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and retry limits for workflow runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Gap between consecutive field operations on the remote form.
    pub pacing_delay_ms: u64,
    /// Cap on recognize + detect + extract.
    pub extraction_timeout_ms: u64,
    /// Cap on the whole fill + submit phase.
    pub fill_timeout_ms: u64,
    /// Total attempts in one retry lineage, the first run included.
    pub max_retry_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            pacing_delay_ms: 200,
            extraction_timeout_ms: 30_000,
            fill_timeout_ms: 60_000,
            max_retry_attempts: 3,
        }
    }
}

impl WorkflowConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    pub fn fill_timeout(&self) -> Duration {
        Duration::from_millis(self.fill_timeout_ms)
    }
}

/// Outcome of one mapped form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOutcome {
    pub field: CanonicalField,
    pub target: String,
    /// Value sent (or that would have been sent). None when mapping failed.
    pub value: Option<String>,
    pub outcome: ValidationOutcome,
}

impl FieldOutcome {
    /// Fill failures and timeouts can be retried; mapping failures cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.outcome.kind(),
            Some(ErrorKind::Fill) | Some(ErrorKind::Timeout)
        ) && self.value.is_some()
    }
}

/// Terminal, read-only record of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub run_id: Uuid,
    /// 1 for a fresh run, incremented by each retry.
    pub attempt: u32,
    pub final_state: WorkflowState,
    pub success: bool,
    pub extracted: ExtractedFields,
    pub validation_outcomes: Vec<ValidationOutcome>,
    /// In fill order.
    pub field_outcomes: Vec<FieldOutcome>,
    pub submission_outcome: Option<ValidationOutcome>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl WorkflowResult {
    pub fn failed_fields(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.field_outcomes.iter().filter(|f| f.outcome.failed())
    }

    /// True once the run got as far as applying fields to the form.
    pub fn reached_filling(&self) -> bool {
        !self.field_outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(WorkflowState::Completed.is_terminal());
        assert!(WorkflowState::Failed.is_terminal());
        assert!(WorkflowState::FailedValidation.is_terminal());
        assert!(!WorkflowState::Filling.is_terminal());
        assert!(!WorkflowState::Idle.is_terminal());
    }

    #[test]
    fn config_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.pacing_delay(), Duration::from_millis(200));
        assert_eq!(config.fill_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retry_attempts, 3);
    }

    #[test]
    fn retryable_kinds() {
        let outcome = |kind, value: Option<&str>| FieldOutcome {
            field: CanonicalField::Carrier,
            target: "t".into(),
            value: value.map(String::from),
            outcome: ValidationOutcome::fail(kind, Some(CanonicalField::Carrier), "x", None),
        };
        assert!(outcome(ErrorKind::Fill, Some("LA")).is_retryable());
        assert!(outcome(ErrorKind::Timeout, Some("LA")).is_retryable());
        assert!(!outcome(ErrorKind::Mapping, None).is_retryable());
        assert!(!outcome(ErrorKind::Fill, None).is_retryable());
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&WorkflowState::FailedValidation).unwrap();
        assert_eq!(json, "\"failed_validation\"");
    }
}
