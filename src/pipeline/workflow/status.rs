use super::traits::StatusSink;
use super::types::WorkflowState;

/// Default status sink: state changes and progress go to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn on_transition(&self, from: WorkflowState, to: WorkflowState, detail: Option<&str>) {
        match to {
            WorkflowState::Failed | WorkflowState::FailedValidation => {
                tracing::warn!(from = %from, to = %to, detail, "Workflow state change")
            }
            _ => tracing::info!(from = %from, to = %to, detail, "Workflow state change"),
        }
    }

    fn on_progress(&self, completed: usize, total: usize) {
        tracing::debug!(completed, total, "Fill progress");
    }
}
