use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transform::{TransformError, TransformKind};
use crate::pipeline::fields::CanonicalField;

/// How a form field accepts its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free-text input.
    Input { transform: TransformKind },
    /// Dropdown: the value picks one of the offered options.
    Selection { transform: TransformKind },
    /// Filled by the form itself; only checked, never typed into.
    ReadOnly,
}

/// One row of the form mapping file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMappingEntry {
    pub field: CanonicalField,
    pub target: String,
    #[serde(default)]
    pub transform: TransformKind,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub requires_selection: bool,
    /// Administrative value used when extraction did not yield the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FieldMappingEntry {
    pub fn kind(&self) -> FieldKind {
        if self.read_only {
            FieldKind::ReadOnly
        } else if self.requires_selection {
            FieldKind::Selection {
                transform: self.transform,
            }
        } else {
            FieldKind::Input {
                transform: self.transform,
            }
        }
    }

    /// Value to send for this entry: extracted value, else default, transformed.
    /// Read-only fields pass through untransformed and may be empty.
    pub fn resolve_value(&self, extracted: Option<&str>) -> Result<String, MappingIssue> {
        let raw = extracted.or(self.default_value.as_deref());

        match self.kind() {
            FieldKind::ReadOnly => Ok(raw.unwrap_or_default().to_string()),
            FieldKind::Input { transform } | FieldKind::Selection { transform } => {
                let raw = raw.ok_or(MappingIssue::Missing(self.field))?;
                transform
                    .apply(raw)
                    .map_err(|source| MappingIssue::Transform {
                        field: self.field,
                        source,
                    })
            }
        }
    }
}

/// Why a mapped field has no value to fill.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingIssue {
    #[error("No extracted value or default for {0}")]
    Missing(CanonicalField),

    #[error("Cannot transform {field}: {source}")]
    Transform {
        field: CanonicalField,
        source: TransformError,
    },
}

/// A form field ready for the fill collaborator, or the reason it is not.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedField {
    pub field: CanonicalField,
    pub target: String,
    pub kind: FieldKind,
    pub value: Result<String, MappingIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(field: CanonicalField) -> FieldMappingEntry {
        FieldMappingEntry {
            field,
            target: "input[id=\"x\"]".into(),
            transform: TransformKind::Identity,
            read_only: false,
            requires_selection: false,
            default_value: None,
        }
    }

    #[test]
    fn kind_from_flags() {
        let mut e = entry(CanonicalField::Carrier);
        e.transform = TransformKind::Uppercase;
        assert_eq!(e.kind(), FieldKind::Input { transform: TransformKind::Uppercase });
        e.requires_selection = true;
        assert_eq!(e.kind(), FieldKind::Selection { transform: TransformKind::Uppercase });
        e.requires_selection = false;
        e.read_only = true;
        assert_eq!(e.kind(), FieldKind::ReadOnly);
    }

    #[test]
    fn extracted_value_wins_over_default() {
        let mut e = entry(CanonicalField::City);
        e.default_value = Some("SCL".into());
        assert_eq!(e.resolve_value(Some("GRU")).unwrap(), "GRU");
        assert_eq!(e.resolve_value(None).unwrap(), "SCL");
    }

    #[test]
    fn missing_value_without_default() {
        let e = entry(CanonicalField::Passenger);
        assert_eq!(
            e.resolve_value(None),
            Err(MappingIssue::Missing(CanonicalField::Passenger))
        );
    }

    #[test]
    fn read_only_may_be_empty() {
        let mut e = entry(CanonicalField::Country);
        e.read_only = true;
        e.transform = TransformKind::ShortDate;
        assert_eq!(e.resolve_value(None).unwrap(), "");
    }

    #[test]
    fn transform_failure_is_reported() {
        let mut e = entry(CanonicalField::FlightDate);
        e.transform = TransformKind::ShortDate;
        let issue = e.resolve_value(Some("13FOO")).unwrap_err();
        assert!(matches!(
            issue,
            MappingIssue::Transform { field: CanonicalField::FlightDate, source: TransformError::UnknownMonth(_) }
        ));
    }

    #[test]
    fn entry_json_defaults() {
        let e: FieldMappingEntry =
            serde_json::from_str(r#"{"field":"route","target":"input#r"}"#).unwrap();
        assert_eq!(e.transform, TransformKind::Identity);
        assert!(!e.read_only);
        assert!(!e.requires_selection);
        assert!(e.default_value.is_none());
    }
}
