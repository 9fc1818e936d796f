//! Workflow orchestrator: capture → detect → extract → validate → map → fill → submit.
//!
//! Collaborators are injected as trait objects. Validation failures stop the
//! run before any field reaches the form. From Filling on, the run is
//! fail-soft: every mapped field is attempted and the outcomes are aggregated.
//! Field operations are sequential and paced, and one deadline covers the
//! whole fill + submit phase.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use super::error::{CollaboratorError, WorkflowError};
use super::pacer::Pacer;
use super::session::{FormSessionLock, StopSignal};
use super::status::TracingStatusSink;
use super::traits::{FillRequest, FormFiller, FormSubmitter, Recognizer, StatusSink};
use super::types::{FieldOutcome, WorkflowConfig, WorkflowResult, WorkflowState};
use crate::config::{self, Settings};
use crate::pipeline::extraction::{confidence, ExtractedFields, PatternExtractor, RecognizedText};
use crate::pipeline::fields::CanonicalField;
use crate::pipeline::mapping::{FieldMapping, MappedField};
use crate::pipeline::validation::{all_passed, ErrorKind, ValidationEngine, ValidationOutcome};

/// Where the recognized text comes from.
enum Capture<'a> {
    Image(&'a [u8]),
    Text(RecognizedText),
}

/// Why the fill phase stopped before every field was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Cancelled,
    Deadline,
}

/// Accumulates one run's artifacts until it reaches a terminal state.
struct RunRecord {
    run_id: Uuid,
    attempt: u32,
    started_at: DateTime<Utc>,
    clock: Instant,
    extracted: ExtractedFields,
    validation_outcomes: Vec<ValidationOutcome>,
    field_outcomes: Vec<FieldOutcome>,
    submission_outcome: Option<ValidationOutcome>,
}

impl RunRecord {
    fn new(run_id: Uuid, attempt: u32) -> Self {
        Self {
            run_id,
            attempt,
            started_at: Utc::now(),
            clock: Instant::now(),
            extracted: ExtractedFields::new(),
            validation_outcomes: Vec::new(),
            field_outcomes: Vec::new(),
            submission_outcome: None,
        }
    }

    fn into_result(self, final_state: WorkflowState, error_message: Option<String>) -> WorkflowResult {
        WorkflowResult {
            run_id: self.run_id,
            attempt: self.attempt,
            final_state,
            success: final_state == WorkflowState::Completed,
            extracted: self.extracted,
            validation_outcomes: self.validation_outcomes,
            field_outcomes: self.field_outcomes,
            submission_outcome: self.submission_outcome,
            error_message,
            started_at: self.started_at,
            finished_at: Utc::now(),
            elapsed_ms: self.clock.elapsed().as_millis() as u64,
        }
    }
}

pub struct WorkflowOrchestrator {
    recognizer: Arc<dyn Recognizer>,
    filler: Arc<dyn FormFiller>,
    submitter: Arc<dyn FormSubmitter>,
    status: Arc<dyn StatusSink>,
    extractor: PatternExtractor,
    validator: ValidationEngine,
    mapping: FieldMapping,
    config: WorkflowConfig,
    session: FormSessionLock,
    stop: StopSignal,
    state: Mutex<WorkflowState>,
}

impl WorkflowOrchestrator {
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        filler: Arc<dyn FormFiller>,
        submitter: Arc<dyn FormSubmitter>,
        mapping: FieldMapping,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            recognizer,
            filler,
            submitter,
            status: Arc::new(TracingStatusSink),
            extractor: PatternExtractor::new(),
            validator: ValidationEngine::default(),
            mapping,
            config,
            session: FormSessionLock::new(),
            stop: StopSignal::new(),
            state: Mutex::new(WorkflowState::Idle),
        }
    }

    /// Build with workflow limits, rule set and name rules from operator settings.
    pub fn from_settings(
        recognizer: Arc<dyn Recognizer>,
        filler: Arc<dyn FormFiller>,
        submitter: Arc<dyn FormSubmitter>,
        mapping: FieldMapping,
        settings: &Settings,
    ) -> Self {
        Self::new(recognizer, filler, submitter, mapping, settings.workflow.clone())
            .with_validator(ValidationEngine::new(settings.rules.clone(), &settings.names))
    }

    /// Startup constructor: settings and form mapping from `dir`.
    ///
    /// Either file may be absent (defaults, bundled mapping). Anything present
    /// but unreadable or invalid is a configuration error and no orchestrator
    /// is built.
    pub fn from_config_dir(
        recognizer: Arc<dyn Recognizer>,
        filler: Arc<dyn FormFiller>,
        submitter: Arc<dyn FormSubmitter>,
        dir: &Path,
    ) -> Result<Self, WorkflowError> {
        let settings = Settings::load_or_default(&config::settings_path_in(dir))?;
        let mapping = FieldMapping::load_or_standard(&config::field_mapping_path_in(dir))?;
        tracing::info!(
            dir = %dir.display(),
            fields = mapping.len(),
            "Workflow configuration loaded"
        );
        Ok(Self::from_settings(recognizer, filler, submitter, mapping, &settings))
    }

    /// [`WorkflowOrchestrator::from_config_dir`] on the per-user data directory.
    pub fn from_app_data_dir(
        recognizer: Arc<dyn Recognizer>,
        filler: Arc<dyn FormFiller>,
        submitter: Arc<dyn FormSubmitter>,
    ) -> Result<Self, WorkflowError> {
        Self::from_config_dir(recognizer, filler, submitter, &config::app_data_dir())
    }

    pub fn with_validator(mut self, validator: ValidationEngine) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_status_sink(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Share a session lock with other orchestrators driving the same form.
    pub fn with_session_lock(mut self, session: FormSessionLock) -> Self {
        self.session = session;
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle for requesting a cooperative stop of the current run.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn state(&self) -> WorkflowState {
        self.state.lock().map(|s| *s).unwrap_or_default()
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Full run starting from a screen capture.
    pub async fn run(&self, image: &[u8]) -> Result<WorkflowResult, WorkflowError> {
        let _guard = self.session.try_acquire()?;
        Ok(self.execute(Capture::Image(image)).await)
    }

    /// Full run from text already produced by a recognizer.
    pub async fn run_with_text(&self, recognized: RecognizedText) -> Result<WorkflowResult, WorkflowError> {
        let _guard = self.session.try_acquire()?;
        Ok(self.execute(Capture::Text(recognized)).await)
    }

    /// Re-attempt only the fields whose fill failed or timed out in `previous`,
    /// reusing the values sent then. Submits when every field then passes.
    pub async fn retry_failed_fields(
        &self,
        previous: &WorkflowResult,
    ) -> Result<WorkflowResult, WorkflowError> {
        if !previous.reached_filling() || previous.final_state == WorkflowState::Completed {
            return Err(WorkflowError::NotRetryable {
                state: previous.final_state,
            });
        }
        if previous.attempt >= self.config.max_retry_attempts {
            return Err(WorkflowError::RetryLimitReached {
                attempts: previous.attempt,
            });
        }

        let _guard = self.session.try_acquire()?;
        self.begin();

        let mut record = RunRecord::new(previous.run_id, previous.attempt + 1);
        record.extracted = previous.extracted.clone();
        record.validation_outcomes = previous.validation_outcomes.clone();

        let mut positions = Vec::new();
        let mut items = Vec::new();
        for (idx, prior) in previous.field_outcomes.iter().enumerate() {
            if !prior.is_retryable() {
                continue;
            }
            let (Some(entry), Some(value)) = (self.mapping.get(prior.field), prior.value.clone()) else {
                continue;
            };
            positions.push(idx);
            items.push(MappedField {
                field: prior.field,
                target: entry.target.clone(),
                kind: entry.kind(),
                value: Ok(value),
            });
        }

        tracing::info!(
            run_id = %record.run_id,
            attempt = record.attempt,
            fields = items.len(),
            "Retrying failed fields"
        );

        self.transition(WorkflowState::Filling, Some("retry"));
        let deadline = Instant::now() + self.config.fill_timeout();
        let mut pacer = Pacer::new(self.config.pacing_delay());
        let (retried, halt) = self.fill_fields(items, deadline, &mut pacer).await;

        let mut merged = previous.field_outcomes.clone();
        for (idx, outcome) in positions.into_iter().zip(retried) {
            merged[idx] = outcome;
        }
        record.field_outcomes = merged;

        if let Some(halt) = halt {
            return Ok(self.finish_halted(record, halt));
        }

        let failed = record.field_outcomes.iter().filter(|f| f.outcome.failed()).count();
        if failed > 0 {
            let message = format!("{failed} field(s) still failing after retry");
            self.transition(WorkflowState::Failed, Some(&message));
            return Ok(self.finish(record, WorkflowState::Failed, Some(message)));
        }

        Ok(self.submit_and_finish(record, deadline, &mut pacer).await)
    }

    // ── Run phases ─────────────────────────────────────────────

    async fn execute(&self, capture: Capture<'_>) -> WorkflowResult {
        self.begin();
        let mut record = RunRecord::new(Uuid::new_v4(), 1);
        self.transition(WorkflowState::Capturing, None);

        let extraction = tokio::time::timeout(
            self.config.extraction_timeout(),
            self.extraction_phase(capture),
        )
        .await;

        let (message, outcome) = match extraction {
            Ok(Ok(Some(fields))) => return self.validate_and_fill(record, fields).await,
            Ok(Ok(None)) => (
                "invalid format".to_string(),
                ValidationOutcome::fail(
                    ErrorKind::Format,
                    None,
                    "Screen is not a reservation display",
                    Some("Open the reservation display and capture it again".into()),
                ),
            ),
            Ok(Err(e)) => {
                let outcome = match &e {
                    CollaboratorError::Timeout(after) => ValidationOutcome::fail(
                        ErrorKind::Timeout,
                        None,
                        format!("Recognizer timed out after {}ms", after.as_millis()),
                        Some("Capture the screen again".into()),
                    ),
                    other => ValidationOutcome::fail(
                        ErrorKind::Format,
                        None,
                        format!("Screen text could not be recognized: {other}"),
                        Some("Capture the screen again".into()),
                    ),
                };
                (format!("recognition failed: {e}"), outcome)
            }
            Err(_) => {
                let message = format!(
                    "extraction timed out after {}ms",
                    self.config.extraction_timeout_ms
                );
                let outcome = ValidationOutcome::fail(
                    ErrorKind::Timeout,
                    None,
                    message.clone(),
                    Some("Capture the screen again".into()),
                );
                (message, outcome)
            }
        };
        tracing::warn!(run_id = %record.run_id, error = %outcome, "Extraction did not produce fields");
        record.validation_outcomes.push(outcome);
        self.fail(record, &message)
    }

    async fn validate_and_fill(&self, mut record: RunRecord, fields: ExtractedFields) -> WorkflowResult {
        self.transition(WorkflowState::Validating, None);
        let outcomes = self.validator.validate_extracted(&fields);
        record.extracted = fields;
        let failed = outcomes.iter().filter(|o| o.failed()).count();
        record.validation_outcomes = outcomes;

        if failed > 0 {
            let message = format!("validation failed: {failed} check(s)");
            self.transition(WorkflowState::FailedValidation, Some(&message));
            return self.finish(record, WorkflowState::FailedValidation, Some(message));
        }

        self.transition(WorkflowState::Mapping, None);
        let mapped = self.mapping.map_fields(&record.extracted);

        self.transition(WorkflowState::Filling, None);
        let deadline = Instant::now() + self.config.fill_timeout();
        let mut pacer = Pacer::new(self.config.pacing_delay());
        let (field_outcomes, halt) = self.fill_fields(mapped, deadline, &mut pacer).await;
        record.field_outcomes = field_outcomes;

        if let Some(halt) = halt {
            return self.finish_halted(record, halt);
        }

        self.submit_and_finish(record, deadline, &mut pacer).await
    }

    /// Recognize, detect and extract. `None` when the text is not a reservation screen.
    async fn extraction_phase(
        &self,
        capture: Capture<'_>,
    ) -> Result<Option<ExtractedFields>, CollaboratorError> {
        let recognized = match capture {
            Capture::Image(image) => self.recognizer.recognize(image).await?,
            Capture::Text(text) => text,
        };

        if !recognized.success {
            tracing::warn!(
                chars = recognized.text.len(),
                "Recognizer reported failure; continuing with the text it returned"
            );
        }
        confidence::warn_on_weak_recognition(&recognized);

        self.transition(WorkflowState::Detecting, None);
        if !self.extractor.detect_format(&recognized.text) {
            return Ok(None);
        }

        self.transition(WorkflowState::Extracting, None);
        Ok(Some(self.extractor.extract_fields(&recognized.text)))
    }

    /// Apply every item in order, one at a time. Never stops on a failed field;
    /// stops only on a stop request or the phase deadline, recording the rest
    /// as not attempted.
    async fn fill_fields(
        &self,
        items: Vec<MappedField>,
        deadline: Instant,
        pacer: &mut Pacer,
    ) -> (Vec<FieldOutcome>, Option<Halt>) {
        let total = items.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut halt = None;

        for (idx, item) in items.into_iter().enumerate() {
            let value = match item.value {
                Ok(value) => value,
                Err(issue) => {
                    tracing::warn!(field = %item.field, error = %issue, "Field not mapped");
                    outcomes.push(FieldOutcome {
                        field: item.field,
                        target: item.target,
                        value: None,
                        outcome: ValidationOutcome::fail(
                            ErrorKind::Mapping,
                            Some(item.field),
                            issue.to_string(),
                            Some("Check the capture or configure a default value".into()),
                        ),
                    });
                    self.status.on_progress(idx + 1, total);
                    continue;
                }
            };

            if halt.is_none() {
                if self.stop.is_stopped() {
                    tracing::info!(remaining = total - idx, "Stop requested; remaining fields not attempted");
                    halt = Some(Halt::Cancelled);
                } else if Instant::now() >= deadline {
                    halt = Some(Halt::Deadline);
                }
            }
            if halt.is_none() && tokio::time::timeout_at(deadline, pacer.ready()).await.is_err() {
                halt = Some(Halt::Deadline);
            }
            if let Some(reason) = halt {
                outcomes.push(not_attempted(item.field, item.target, value, reason));
                continue;
            }

            let request = FillRequest {
                field: item.field,
                target: item.target,
                kind: item.kind,
                value,
            };
            let outcome = match tokio::time::timeout_at(deadline, self.filler.fill(&request)).await {
                Ok(Ok(())) => ValidationOutcome::pass_for(request.field),
                Ok(Err(CollaboratorError::Timeout(after))) => ValidationOutcome::fail(
                    ErrorKind::Timeout,
                    Some(request.field),
                    format!("Fill timed out after {}ms", after.as_millis()),
                    None,
                ),
                Ok(Err(e)) => ValidationOutcome::fail(
                    ErrorKind::Fill,
                    Some(request.field),
                    format!("Fill failed: {e}"),
                    Some("Retry the failed fields".into()),
                ),
                Err(_) => {
                    halt = Some(Halt::Deadline);
                    ValidationOutcome::fail(
                        ErrorKind::Timeout,
                        Some(request.field),
                        format!(
                            "Fill phase deadline of {}ms passed during this field",
                            self.config.fill_timeout_ms
                        ),
                        None,
                    )
                }
            };
            pacer.completed();

            if outcome.passed() {
                tracing::debug!(field = %request.field, "Field filled");
            } else {
                tracing::warn!(field = %request.field, error = %outcome, "Field fill failed");
            }
            outcomes.push(FieldOutcome {
                field: request.field,
                target: request.target,
                value: Some(request.value),
                outcome,
            });
            self.status.on_progress(idx + 1, total);
        }

        (outcomes, halt)
    }

    async fn submit_and_finish(
        &self,
        mut record: RunRecord,
        deadline: Instant,
        pacer: &mut Pacer,
    ) -> WorkflowResult {
        if self.stop.is_stopped() {
            return self.finish_halted(record, Halt::Cancelled);
        }

        self.transition(WorkflowState::Submitting, None);
        let submission = async {
            pacer.ready().await;
            self.submitter.submit().await
        };
        let outcome = match tokio::time::timeout_at(deadline, submission).await {
            Ok(Ok(receipt)) => ValidationOutcome::pass_with_message(
                receipt
                    .confirmation
                    .unwrap_or_else(|| "Form submitted".to_string()),
            ),
            Ok(Err(CollaboratorError::Timeout(after))) => ValidationOutcome::fail(
                ErrorKind::Timeout,
                None,
                format!("Submission timed out after {}ms", after.as_millis()),
                None,
            ),
            Ok(Err(e)) => ValidationOutcome::fail(
                ErrorKind::Submission,
                None,
                format!("Submission failed: {e}"),
                Some("Check the form for rejected values and submit again".into()),
            ),
            Err(_) => ValidationOutcome::fail(
                ErrorKind::Timeout,
                None,
                format!(
                    "Fill phase deadline of {}ms passed during submission",
                    self.config.fill_timeout_ms
                ),
                None,
            ),
        };

        let fields_ok = record.field_outcomes.iter().all(|f| f.outcome.passed());
        let submitted = outcome.passed();
        record.submission_outcome = Some(outcome);

        if fields_ok && submitted {
            self.transition(WorkflowState::Completed, None);
            return self.finish(record, WorkflowState::Completed, None);
        }

        let failed_fields = record.field_outcomes.iter().filter(|f| f.outcome.failed()).count();
        let mut problems = Vec::new();
        if failed_fields > 0 {
            problems.push(format!("{failed_fields} field(s) failed"));
        }
        if let Some(sub) = record.submission_outcome.as_ref().filter(|o| o.failed()) {
            problems.push(sub.to_string());
        }
        let message = problems.join("; ");
        self.transition(WorkflowState::Failed, Some(&message));
        self.finish(record, WorkflowState::Failed, Some(message))
    }

    // ── State bookkeeping ──────────────────────────────────────

    fn begin(&self) {
        self.stop.reset();
        if let Ok(mut state) = self.state.lock() {
            *state = WorkflowState::Idle;
        }
    }

    fn transition(&self, to: WorkflowState, detail: Option<&str>) {
        let from = match self.state.lock() {
            Ok(mut state) => std::mem::replace(&mut *state, to),
            Err(_) => WorkflowState::Idle,
        };
        self.status.on_transition(from, to, detail);
    }

    fn fail(&self, record: RunRecord, message: &str) -> WorkflowResult {
        self.transition(WorkflowState::Failed, Some(message));
        self.finish(record, WorkflowState::Failed, Some(message.to_string()))
    }

    fn finish_halted(&self, record: RunRecord, halt: Halt) -> WorkflowResult {
        let message = match halt {
            Halt::Cancelled => "cancelled".to_string(),
            Halt::Deadline => format!("fill phase timed out after {}ms", self.config.fill_timeout_ms),
        };
        self.fail(record, &message)
    }

    fn finish(
        &self,
        record: RunRecord,
        state: WorkflowState,
        error_message: Option<String>,
    ) -> WorkflowResult {
        let result = record.into_result(state, error_message);
        tracing::info!(
            run_id = %result.run_id,
            attempt = result.attempt,
            state = %result.final_state,
            success = result.success,
            fields = result.field_outcomes.len(),
            failed_fields = result.failed_fields().count(),
            validation_passed = all_passed(&result.validation_outcomes),
            duration_ms = result.elapsed_ms,
            "Workflow finished"
        );
        result
    }
}

fn not_attempted(
    field: CanonicalField,
    target: String,
    value: String,
    reason: Halt,
) -> FieldOutcome {
    let outcome = match reason {
        Halt::Cancelled => ValidationOutcome::fail(
            ErrorKind::Fill,
            Some(field),
            "Not attempted: run cancelled",
            Some("Retry the failed fields".into()),
        ),
        Halt::Deadline => ValidationOutcome::fail(
            ErrorKind::Timeout,
            Some(field),
            "Not attempted: fill phase deadline passed",
            None,
        ),
    };
    FieldOutcome {
        field,
        target,
        value: Some(value),
        outcome,
    }
}
