//! Canonical field → form target mapping.
//!
//! Loaded once at startup and immutable afterwards. Entry order is fill order:
//! selections that narrow later choices come first in the file.

pub mod transform;
pub mod types;

pub use transform::*;
pub use types::*;

use std::collections::HashSet;
use std::path::Path;

use crate::config::{read_config_file, ConfigError};
use crate::pipeline::extraction::ExtractedFields;
use crate::pipeline::fields::CanonicalField;

const STANDARD_MAPPING: &str = include_str!("../../../config/field_mapping.json");

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    entries: Vec<FieldMappingEntry>,
}

impl FieldMapping {
    /// Validate and wrap entries. Every form field must be mapped exactly once.
    pub fn from_entries(entries: Vec<FieldMappingEntry>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.field) {
                return Err(ConfigError::DuplicateField(entry.field));
            }
            if entry.target.trim().is_empty() {
                return Err(ConfigError::EmptyTarget(entry.field));
            }
            if entry.read_only && entry.requires_selection {
                return Err(ConfigError::ConflictingFlags(entry.field));
            }
        }

        if let Some(missing) = CanonicalField::FORM_FIELDS
            .iter()
            .find(|f| !seen.contains(*f))
        {
            return Err(ConfigError::MissingField(*missing));
        }

        Ok(Self { entries })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<FieldMappingEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Mapping bundled with the crate.
    pub fn standard() -> Result<Self, ConfigError> {
        Self::from_json(STANDARD_MAPPING)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = read_config_file(path)?;
        let mapping = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            entries = mapping.len(),
            "Field mapping loaded"
        );
        Ok(mapping)
    }

    /// Operator mapping at `path`, or the bundled one when the file does not exist.
    pub fn load_or_standard(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => {
                tracing::info!(path = %path.display(), "No operator mapping, using bundled mapping");
                Self::standard()
            }
            other => other,
        }
    }

    pub fn entries(&self) -> &[FieldMappingEntry] {
        &self.entries
    }

    pub fn get(&self, field: CanonicalField) -> Option<&FieldMappingEntry> {
        self.entries.iter().find(|e| e.field == field)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every entry against one capture, in fill order.
    pub fn map_fields(&self, extracted: &ExtractedFields) -> Vec<MappedField> {
        self.entries
            .iter()
            .map(|entry| MappedField {
                field: entry.field,
                target: entry.target.clone(),
                kind: entry.kind(),
                value: entry.resolve_value(extracted.value(entry.field)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::{ExtractedField, SourceSpan};
    use std::io::Write;

    fn field(name: CanonicalField, value: &str) -> ExtractedField {
        ExtractedField::new(name, value, 0.95, SourceSpan::new(0, value.len()))
    }

    #[test]
    fn standard_mapping_covers_form() {
        let mapping = FieldMapping::standard().unwrap();
        assert_eq!(mapping.len(), 14);
        for f in CanonicalField::FORM_FIELDS {
            assert!(mapping.get(f).is_some(), "{f} not mapped");
        }
        assert_eq!(mapping.entries()[0].field, CanonicalField::ReservationCode);
        assert_eq!(
            mapping.get(CanonicalField::Country).unwrap().kind(),
            FieldKind::ReadOnly
        );
        assert_eq!(
            mapping.get(CanonicalField::FlightDate).unwrap().transform,
            TransformKind::ShortDate
        );
    }

    #[test]
    fn administrative_defaults_fill_gaps() {
        let mapping = FieldMapping::standard().unwrap();
        let extracted: ExtractedFields = [
            field(CanonicalField::ReservationCode, "abc123"),
            field(CanonicalField::Carrier, "LA"),
            field(CanonicalField::FlightNumber, "3045"),
            field(CanonicalField::Class, "Y"),
            field(CanonicalField::FlightDate, "13MAR"),
            field(CanonicalField::Route, "GRU-SCL"),
            field(CanonicalField::Passenger, "SILVA/ANA MS"),
        ]
        .into_iter()
        .collect();

        let mapped = mapping.map_fields(&extracted);
        assert_eq!(mapped.len(), 14);
        assert!(mapped.iter().all(|m| m.value.is_ok()));

        let value = |f: CanonicalField| {
            mapped
                .iter()
                .find(|m| m.field == f)
                .and_then(|m| m.value.clone().ok())
                .unwrap()
        };
        assert_eq!(value(CanonicalField::ReservationCode), "ABC123");
        assert_eq!(value(CanonicalField::City), "SCL");
        assert_eq!(value(CanonicalField::Department), "Departamento Técnico");
        assert_eq!(value(CanonicalField::Reason), "PIC - Upgrade");
        assert_eq!(value(CanonicalField::Authorizer), "Supervisor Autorizado");
        assert_eq!(value(CanonicalField::SegmentNumber), "1");
        assert_eq!(value(CanonicalField::DestinationCode), "UPGRADE");
        assert_eq!(value(CanonicalField::Route), "GRU/SCL");
        assert_eq!(value(CanonicalField::Country), "");
    }

    #[test]
    fn absent_required_field_is_mapping_issue() {
        let mapping = FieldMapping::standard().unwrap();
        let mapped = mapping.map_fields(&ExtractedFields::new());
        let passenger = mapped
            .iter()
            .find(|m| m.field == CanonicalField::Passenger)
            .unwrap();
        assert_eq!(
            passenger.value,
            Err(MappingIssue::Missing(CanonicalField::Passenger))
        );
    }

    #[test]
    fn rejects_duplicate_entry() {
        let mut entries = FieldMapping::standard().unwrap().entries().to_vec();
        entries.push(entries[0].clone());
        assert!(matches!(
            FieldMapping::from_entries(entries),
            Err(ConfigError::DuplicateField(CanonicalField::ReservationCode))
        ));
    }

    #[test]
    fn rejects_missing_form_field() {
        let entries: Vec<_> = FieldMapping::standard()
            .unwrap()
            .entries()
            .iter()
            .filter(|e| e.field != CanonicalField::Route)
            .cloned()
            .collect();
        assert!(matches!(
            FieldMapping::from_entries(entries),
            Err(ConfigError::MissingField(CanonicalField::Route))
        ));
    }

    #[test]
    fn rejects_empty_target_and_conflicting_flags() {
        let mut entries = FieldMapping::standard().unwrap().entries().to_vec();
        entries[1].target = "  ".into();
        assert!(matches!(
            FieldMapping::from_entries(entries),
            Err(ConfigError::EmptyTarget(CanonicalField::City))
        ));

        let mut entries = FieldMapping::standard().unwrap().entries().to_vec();
        entries[2].requires_selection = true;
        assert!(matches!(
            FieldMapping::from_entries(entries),
            Err(ConfigError::ConflictingFlags(CanonicalField::Country))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STANDARD_MAPPING.as_bytes()).unwrap();
        let mapping = FieldMapping::load(file.path()).unwrap();
        assert_eq!(mapping, FieldMapping::standard().unwrap());
    }

    #[test]
    fn load_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FieldMapping::load(&dir.path().join("absent.json")),
            Err(ConfigError::NotFound(_))
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"field":"not_a_field","target":"x"}]"#).unwrap();
        assert!(matches!(FieldMapping::load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn load_or_standard_falls_back_only_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field_mapping.json");
        assert_eq!(
            FieldMapping::load_or_standard(&path).unwrap(),
            FieldMapping::standard().unwrap()
        );

        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            FieldMapping::load_or_standard(&path),
            Err(ConfigError::MissingField(CanonicalField::ReservationCode))
        ));
    }
}
