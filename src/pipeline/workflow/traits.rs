//! Collaborator boundaries of the workflow.
//!
//! - Recognizer: capture → recognized text
//! - FormFiller: applies one field to the remote form
//! - FormSubmitter: triggers the form submission
//! - StatusSink: observes state transitions and fill progress

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::CollaboratorError;
use super::types::WorkflowState;
use crate::pipeline::extraction::RecognizedText;
use crate::pipeline::fields::CanonicalField;
use crate::pipeline::mapping::FieldKind;

#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<RecognizedText, CollaboratorError>;
}

/// One field operation against the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRequest {
    pub field: CanonicalField,
    pub target: String,
    pub kind: FieldKind,
    pub value: String,
}

/// Applies a single field. Called strictly one at a time per form session.
#[async_trait]
pub trait FormFiller: Send + Sync {
    async fn fill(&self, request: &FillRequest) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub confirmation: Option<String>,
}

#[async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self) -> Result<SubmissionReceipt, CollaboratorError>;
}

/// Observer for run progress. Must not block.
pub trait StatusSink: Send + Sync {
    fn on_transition(&self, from: WorkflowState, to: WorkflowState, detail: Option<&str>);

    fn on_progress(&self, _completed: usize, _total: usize) {}
}
