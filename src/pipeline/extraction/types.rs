use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::fields::CanonicalField;

/// Text produced by the external recognizer for one screen capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizedText {
    pub text: String,
    pub success: bool,
    /// Advisory only. Not wired into field-level confidence.
    #[serde(default)]
    pub regions: Vec<RegionConfidence>,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
            regions: Vec::new(),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn with_regions(mut self, regions: Vec<RegionConfidence>) -> Self {
        self.regions = regions;
        self
    }

    /// Mean of the recognizer's region confidences, if it reported any.
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.regions.is_empty() {
            return None;
        }
        let sum: f32 = self.regions.iter().map(|r| r.confidence).sum();
        Some(sum / self.regions.len() as f32)
    }
}

/// Confidence for a specific region of the capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfidence {
    pub text: String,
    pub confidence: f32,
}

/// Byte range of a captured value within the recognized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    start: usize,
    end: usize,
}

impl SourceSpan {
    pub(crate) fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// One field pulled out of the recognized text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedField {
    pub name: CanonicalField,
    pub value: String,
    pub confidence: f32,
    pub source_span: SourceSpan,
}

impl ExtractedField {
    pub fn new(name: CanonicalField, value: impl Into<String>, confidence: f32, span: SourceSpan) -> Self {
        Self {
            name,
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source_span: span,
        }
    }
}

/// All fields extracted from one capture, keyed by canonical name.
///
/// Built once per capture and replaced wholesale on the next one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    fields: BTreeMap<CanonicalField, ExtractedField>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the name is already present (first match wins).
    /// Returns whether the field was stored.
    pub fn insert_first(&mut self, field: ExtractedField) -> bool {
        if self.fields.contains_key(&field.name) {
            return false;
        }
        self.fields.insert(field.name, field);
        true
    }

    pub fn get(&self, name: CanonicalField) -> Option<&ExtractedField> {
        self.fields.get(&name)
    }

    pub fn value(&self, name: CanonicalField) -> Option<&str> {
        self.fields.get(&name).map(|f| f.value.as_str())
    }

    pub fn contains(&self, name: CanonicalField) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractedField> {
        self.fields.values()
    }

    /// Itinerary fields that the capture did not yield.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::ITINERARY_FIELDS
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Fields whose confidence is below `threshold`, for operator review.
    pub fn low_confidence(&self, threshold: f32) -> Vec<&ExtractedField> {
        self.fields
            .values()
            .filter(|f| f.confidence < threshold)
            .collect()
    }
}

impl FromIterator<ExtractedField> for ExtractedFields {
    fn from_iter<I: IntoIterator<Item = ExtractedField>>(iter: I) -> Self {
        let mut fields = Self::new();
        for field in iter {
            fields.insert_first(field);
        }
        fields
    }
}
