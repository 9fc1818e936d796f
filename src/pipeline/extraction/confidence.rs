//! Fixed per-pattern confidence values.
//!
//! Field confidence is a property of the pattern that produced the value, not a
//! measurement of the recognizer's per-character confidence.

use super::types::RecognizedText;

/// Confidence thresholds used when flagging fields for review
pub mod thresholds {
    /// Below this: recognition likely failed.
    pub const LOW: f32 = 0.50;

    /// Below this: some uncertainty. Flag the field for operator review.
    pub const MODERATE: f32 = 0.70;

    /// Above this: high confidence. No special flagging.
    pub const HIGH: f32 = 0.85;
}

/// Code following its own label (reservation code).
pub const ANCHORED_CODE: f32 = 0.95;

/// Columns of the structured itinerary line.
pub const ITINERARY_LINE: f32 = 0.95;

/// Free-form line after the names section label.
pub const FREEFORM_NAME: f32 = 0.90;

/// Ticket number after its line prefix.
pub const TICKET_NUMBER: f32 = 0.90;

/// Token following the authorization label.
pub const AUTHORIZATION_TOKEN: f32 = 0.85;

/// Log when the recognizer itself reported weak output. Field confidences are
/// left untouched.
pub fn warn_on_weak_recognition(recognized: &RecognizedText) {
    if let Some(mean) = recognized.mean_confidence() {
        if mean < thresholds::LOW {
            tracing::warn!(
                mean_confidence = mean,
                regions = recognized.regions.len(),
                "Recognizer reported low confidence; extracted values may be unreliable"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_constants_are_ordered() {
        assert!(thresholds::LOW < thresholds::MODERATE);
        assert!(thresholds::MODERATE < thresholds::HIGH);
    }

    #[test]
    fn pattern_constants_are_probabilities() {
        for c in [
            ANCHORED_CODE,
            ITINERARY_LINE,
            FREEFORM_NAME,
            TICKET_NUMBER,
            AUTHORIZATION_TOKEN,
        ] {
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn freeform_capture_ranks_below_anchored_code() {
        assert!(FREEFORM_NAME < ANCHORED_CODE);
        assert!(AUTHORIZATION_TOKEN < FREEFORM_NAME);
    }
}
