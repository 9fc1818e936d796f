use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pipeline::fields::CanonicalField;

/// Failure taxonomy carried on every failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Screen not recognized or a value not in the expected shape.
    Format,
    /// Business rule rejected the value.
    Validation,
    /// No usable target or value for a form field.
    Mapping,
    /// One field could not be applied to the form.
    Fill,
    /// The form could not be submitted.
    Submission,
    /// A collaborator or phase ran out of time.
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Validation => "validation",
            Self::Mapping => "mapping",
            Self::Fill => "fill",
            Self::Submission => "submission",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one check or one collaborator call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    passed: bool,
    kind: Option<ErrorKind>,
    field: Option<CanonicalField>,
    message: Option<String>,
    remediation: Option<String>,
}

impl ValidationOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            kind: None,
            field: None,
            message: None,
            remediation: None,
        }
    }

    pub fn pass_for(field: CanonicalField) -> Self {
        Self {
            field: Some(field),
            ..Self::pass()
        }
    }

    /// Passing outcome with an informational note (e.g. a confirmation text).
    pub fn pass_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::pass()
        }
    }

    pub fn fail(
        kind: ErrorKind,
        field: Option<CanonicalField>,
        message: impl Into<String>,
        remediation: Option<String>,
    ) -> Self {
        Self {
            passed: false,
            kind: Some(kind),
            field,
            message: Some(message.into()),
            remediation,
        }
    }

    /// Business-rule rejection. Always carries a remediation hint.
    pub fn rejected(
        field: CanonicalField,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self::fail(
            ErrorKind::Validation,
            Some(field),
            message,
            Some(remediation.into()),
        )
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn failed(&self) -> bool {
        !self.passed
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    pub fn field(&self) -> Option<CanonicalField> {
        self.field
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn remediation(&self) -> Option<&str> {
        self.remediation.as_deref()
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            return f.write_str(self.message.as_deref().unwrap_or("ok"));
        }
        if let Some(field) = self.field {
            write!(f, "[{field}] ")?;
        }
        f.write_str(self.message.as_deref().unwrap_or("failed"))?;
        if let Some(hint) = &self.remediation {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}
