//! Reservation-screen detection and field extraction from recognized text.
//!
//! Detection counts how many of eight fixed anchors survive recognition noise;
//! extraction applies one independent pattern per field, in a fixed order, and
//! keeps only the first match of each.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use super::confidence;
use super::types::{ExtractedField, ExtractedFields, SourceSpan};
use crate::pipeline::fields::CanonicalField;

/// Anchors that must match before a capture is treated as a reservation screen.
pub const MIN_ANCHORS: usize = 5;

/// Fixed textual markers of the reservation screen layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    ReservationLabel,
    NamesSection,
    CarrierColumn,
    FlightNumberColumn,
    ClassHeader,
    RouteHeader,
    DateHeader,
    StatusHeader,
}

static ANCHORS: LazyLock<Vec<(Anchor, Regex)>> = LazyLock::new(|| {
    vec![
        (Anchor::ReservationLabel, Regex::new(r"(?i)Reserva\s*-\s*[A-Z0-9]{6}").unwrap()),
        (Anchor::NamesSection, Regex::new(r"(?i)\bNomes\b").unwrap()),
        (Anchor::CarrierColumn, Regex::new(r"(?i)Voo\s*\(CIA\)").unwrap()),
        (Anchor::FlightNumberColumn, Regex::new(r"(?i)Voo\s*\(Numero\)").unwrap()),
        (Anchor::ClassHeader, Regex::new(r"(?i)\bCls\b").unwrap()),
        (Anchor::RouteHeader, Regex::new(r"(?i)De-Para").unwrap()),
        (Anchor::DateHeader, Regex::new(r"(?i)\bData\b").unwrap()),
        (Anchor::StatusHeader, Regex::new(r"(?i)Stp\s*Nbr").unwrap()),
    ]
});

static RESERVATION_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Reserva\s*-\s*([A-Z0-9]{6})\b").unwrap());

static NAMES_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNomes[ \t]*\r?\n").unwrap());

// carrier, flight number, class, route, date, status: one line only
static ITINERARY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([A-Z]{2})[ \t]+(\d{3,4})[ \t]+([A-Z])[ \t]+([A-Z]{3}-[A-Z]{3})[ \t]+(\d{2}[A-Z]{3})[ \t]+([A-Z]{2,3})\b",
    )
    .unwrap()
});

static TICKET_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bTE[ \t]+(\d{3}-\d{10})\b").unwrap());

static AUTHORIZATION_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:\bAuth\s*Code)\s*:\s*([A-Za-z0-9_]+)").unwrap());

const ITINERARY_COLUMNS: [CanonicalField; 6] = [
    CanonicalField::Carrier,
    CanonicalField::FlightNumber,
    CanonicalField::Class,
    CanonicalField::Route,
    CanonicalField::FlightDate,
    CanonicalField::FlightStatus,
];

/// Stateless extractor; safe to share across concurrent capture runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Anchors found in `text`, in declaration order.
    pub fn matched_anchors(&self, text: &str) -> Vec<Anchor> {
        ANCHORS
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(anchor, _)| *anchor)
            .collect()
    }

    /// True iff at least [`MIN_ANCHORS`] of the eight anchors match.
    pub fn detect_format(&self, text: &str) -> bool {
        let found = self.matched_anchors(text).len();
        tracing::debug!(anchors_found = found, required = MIN_ANCHORS, "Format detection");
        found >= MIN_ANCHORS
    }

    /// Extract every recognizable field. Returns an empty set when the text is
    /// not a reservation screen. Never fails: malformed input yields fewer fields.
    pub fn extract_fields(&self, text: &str) -> ExtractedFields {
        let mut fields = ExtractedFields::new();
        if !self.detect_format(text) {
            return fields;
        }

        if let Some(caps) = RESERVATION_CODE.captures(text) {
            if let Some(field) = capture_field(&caps, 1, CanonicalField::ReservationCode, confidence::ANCHORED_CODE) {
                let upper = field.value.to_uppercase();
                fields.insert_first(ExtractedField { value: upper, ..field });
            }
        }

        if let Some(field) = passenger_after_label(text) {
            fields.insert_first(field);
        }

        // Multi-segment reservations: only the first itinerary line is read.
        if let Some(caps) = ITINERARY_LINE.captures(text) {
            for (idx, name) in ITINERARY_COLUMNS.iter().enumerate() {
                if let Some(field) = capture_field(&caps, idx + 1, *name, confidence::ITINERARY_LINE) {
                    fields.insert_first(field);
                }
            }
        }

        if let Some(caps) = TICKET_NUMBER.captures(text) {
            if let Some(field) = capture_field(&caps, 1, CanonicalField::TicketNumber, confidence::TICKET_NUMBER) {
                fields.insert_first(field);
            }
        }

        if let Some(caps) = AUTHORIZATION_CODE.captures(text) {
            if let Some(field) = capture_field(
                &caps,
                1,
                CanonicalField::AuthorizationCode,
                confidence::AUTHORIZATION_TOKEN,
            ) {
                fields.insert_first(field);
            }
        }

        tracing::debug!(
            extracted = fields.len(),
            missing = ?fields.missing_required(),
            "Field extraction complete"
        );
        fields
    }
}

fn capture_field(
    caps: &Captures<'_>,
    group: usize,
    name: CanonicalField,
    confidence: f32,
) -> Option<ExtractedField> {
    let m = caps.get(group)?;
    Some(ExtractedField::new(
        name,
        m.as_str(),
        confidence,
        SourceSpan::new(m.start(), m.end()),
    ))
}

/// First non-blank line after the names section label.
fn passenger_after_label(text: &str) -> Option<ExtractedField> {
    let label = NAMES_LABEL.find(text)?;
    let mut offset = label.end();
    for line in text[label.end()..].split_inclusive('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let start = offset + (line.len() - line.trim_start().len());
            return Some(ExtractedField::new(
                CanonicalField::Passenger,
                trimmed,
                confidence::FREEFORM_NAME,
                SourceSpan::new(start, start + trimmed.len()),
            ));
        }
        offset += line.len();
    }
    None
}
