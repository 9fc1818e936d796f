//! Business-eligibility checks.
//!
//! Every check is a pure function of its arguments and the rule set fixed at
//! construction. Failures are not tiered: any failed outcome blocks the fill
//! phase.

use serde::{Deserialize, Serialize};

use super::types::{ErrorKind, ValidationOutcome};
use crate::pipeline::extraction::ExtractedFields;
use crate::pipeline::fields::CanonicalField;
use crate::pipeline::mapping::date_transform;
use crate::pipeline::name_correction::{NameCorrectionClassifier, NameRules};

const RESERVATION_CODE_LEN: usize = 6;

/// Allow-lists for the eligibility checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub carriers: Vec<String>,
    pub statuses: Vec<String>,
    pub eligible_classes: Vec<String>,
    pub authorization_codes: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            carriers: ["LA", "LP", "4C", "JJ"].map(String::from).to_vec(),
            statuses: ["HK", "SA"].map(String::from).to_vec(),
            eligible_classes: ["Q", "S", "Y"].map(String::from).to_vec(),
            authorization_codes: ["PIC_S23", "PIC_S24", "PIC_S25"].map(String::from).to_vec(),
        }
    }
}

fn allowed(list: &[String], value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && list.iter().any(|item| item.eq_ignore_ascii_case(value))
}

#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    rules: RuleSet,
    names: NameCorrectionClassifier,
}

impl ValidationEngine {
    pub fn new(rules: RuleSet, names: &NameRules) -> Self {
        Self {
            rules,
            names: NameCorrectionClassifier::new(names),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Exactly six characters, each an uppercase ASCII letter or digit.
    pub fn validate_reservation_code(&self, code: &str) -> ValidationOutcome {
        let well_formed = code.chars().count() == RESERVATION_CODE_LEN
            && code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

        if well_formed {
            ValidationOutcome::pass_for(CanonicalField::ReservationCode)
        } else {
            ValidationOutcome::fail(
                ErrorKind::Format,
                Some(CanonicalField::ReservationCode),
                format!("Reservation code '{code}' must be 6 uppercase letters or digits"),
                Some("Re-capture the reservation screen with the code fully visible".into()),
            )
        }
    }

    pub fn validate_carrier(&self, code: &str) -> ValidationOutcome {
        if allowed(&self.rules.carriers, code) {
            return ValidationOutcome::pass_for(CanonicalField::Carrier);
        }
        ValidationOutcome::rejected(
            CanonicalField::Carrier,
            format!("Carrier '{code}' is not eligible"),
            format!("Allowed carriers: {}", self.rules.carriers.join(", ")),
        )
    }

    pub fn validate_flight_status(&self, status: &str) -> ValidationOutcome {
        if allowed(&self.rules.statuses, status) {
            return ValidationOutcome::pass_for(CanonicalField::FlightStatus);
        }
        ValidationOutcome::rejected(
            CanonicalField::FlightStatus,
            format!("Flight status '{status}' is not eligible"),
            format!(
                "Segment must be confirmed with status {}",
                self.rules.statuses.join(" or ")
            ),
        )
    }

    /// Class and authorization code must both be eligible. The class is
    /// checked first; each failure carries its own remediation.
    pub fn validate_class_authorization_eligibility(
        &self,
        class: &str,
        auth_code: &str,
    ) -> ValidationOutcome {
        if !allowed(&self.rules.eligible_classes, class) {
            return ValidationOutcome::rejected(
                CanonicalField::Class,
                format!("Class '{class}' is not eligible for upgrade"),
                format!(
                    "Rebook in an eligible class ({}) before requesting the upgrade",
                    self.rules.eligible_classes.join(", ")
                ),
            );
        }
        if !allowed(&self.rules.authorization_codes, auth_code) {
            return ValidationOutcome::rejected(
                CanonicalField::AuthorizationCode,
                format!("Authorization code '{auth_code}' is not eligible"),
                format!(
                    "Obtain a valid authorization ({}) from a supervisor",
                    self.rules.authorization_codes.join(", ")
                ),
            );
        }
        ValidationOutcome::pass_for(CanonicalField::Class)
    }

    /// Short-date token must convert, e.g. "13MAR".
    pub fn validate_flight_date(&self, token: &str) -> ValidationOutcome {
        match date_transform(token) {
            Ok(_) => ValidationOutcome::pass_for(CanonicalField::FlightDate),
            Err(e) => ValidationOutcome::rejected(
                CanonicalField::FlightDate,
                e.to_string(),
                "Flight date must be a two-digit day followed by the month abbreviation, e.g. 13MAR",
            ),
        }
    }

    pub fn validate_name_correction(&self, old_name: &str, new_name: &str) -> ValidationOutcome {
        let decision = self.names.classify(old_name, new_name);
        match decision.matched_heuristic {
            Some(heuristic) if decision.approved => ValidationOutcome::pass_with_message(format!(
                "Name correction approved ({}): {}",
                heuristic.as_str(),
                decision.reason
            )),
            _ => ValidationOutcome::rejected(
                CanonicalField::Passenger,
                format!(
                    "Name change '{old_name}' to '{new_name}' {}",
                    decision.reason
                ),
                "Attach the passenger's identity document to the correction request",
            ),
        }
    }

    /// Run every check whose input is present in `fields`.
    ///
    /// Eligibility always runs: a missing class or a missing authorization
    /// code is ineligible.
    pub fn validate_extracted(&self, fields: &ExtractedFields) -> Vec<ValidationOutcome> {
        let mut outcomes = Vec::new();

        if let Some(code) = fields.value(CanonicalField::ReservationCode) {
            outcomes.push(self.validate_reservation_code(code));
        }
        if let Some(carrier) = fields.value(CanonicalField::Carrier) {
            outcomes.push(self.validate_carrier(carrier));
        }
        if let Some(status) = fields.value(CanonicalField::FlightStatus) {
            outcomes.push(self.validate_flight_status(status));
        }
        match fields.value(CanonicalField::Class) {
            Some(class) => {
                let auth = fields
                    .value(CanonicalField::AuthorizationCode)
                    .unwrap_or_default();
                outcomes.push(self.validate_class_authorization_eligibility(class, auth));
            }
            None => outcomes.push(ValidationOutcome::rejected(
                CanonicalField::Class,
                "No booking class could be read from the itinerary line",
                "Capture the screen again with the itinerary line fully visible",
            )),
        }
        if let Some(date) = fields.value(CanonicalField::FlightDate) {
            outcomes.push(self.validate_flight_date(date));
        }

        let failed: Vec<&ValidationOutcome> = outcomes.iter().filter(|o| o.failed()).collect();
        if !failed.is_empty() {
            tracing::warn!(
                checks = outcomes.len(),
                failed = failed.len(),
                fields = ?failed.iter().filter_map(|o| o.field()).collect::<Vec<_>>(),
                "Validation rejected extracted fields"
            );
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::{ExtractedField, SourceSpan};

    fn engine() -> ValidationEngine {
        ValidationEngine::default()
    }

    fn fields(values: &[(CanonicalField, &str)]) -> ExtractedFields {
        values
            .iter()
            .map(|(name, value)| ExtractedField::new(*name, *value, 0.95, SourceSpan::new(0, value.len())))
            .collect()
    }

    #[test]
    fn reservation_code_accepts_uppercase_alnum() {
        for code in ["ABC123", "ZZZZZZ", "000000", "A1B2C3"] {
            assert!(engine().validate_reservation_code(code).passed(), "{code}");
        }
    }

    #[test]
    fn reservation_code_rejects_everything_else() {
        for code in ["", "ABC12", "ABC1234", "abc123", "ABC12a", "ABC-12", "ABC 12", "ÁBC123"] {
            let outcome = engine().validate_reservation_code(code);
            assert!(outcome.failed(), "{code:?} should fail");
            assert_eq!(outcome.kind(), Some(ErrorKind::Format));
        }
    }

    #[test]
    fn carrier_allow_list() {
        assert!(engine().validate_carrier("LA").passed());
        assert!(engine().validate_carrier("4C").passed());
        let outcome = engine().validate_carrier("XX");
        assert!(outcome.failed());
        assert!(outcome.remediation().unwrap().contains("LA, LP, 4C, JJ"));
    }

    #[test]
    fn flight_status_allow_list() {
        assert!(engine().validate_flight_status("HK").passed());
        assert!(engine().validate_flight_status("SA").passed());
        assert!(engine().validate_flight_status("XX").failed());
        assert!(engine().validate_flight_status("").failed());
    }

    #[test]
    fn eligible_class_and_authorization() {
        assert!(engine()
            .validate_class_authorization_eligibility("Y", "PIC_S23")
            .passed());
    }

    #[test]
    fn ineligible_class_has_class_remediation() {
        let outcome = engine().validate_class_authorization_eligibility("F", "PIC_S23");
        assert!(outcome.failed());
        assert_eq!(outcome.kind(), Some(ErrorKind::Validation));
        assert_eq!(outcome.field(), Some(CanonicalField::Class));
        assert!(outcome.message().unwrap().contains("Class 'F'"));
        assert!(outcome.remediation().unwrap().contains("eligible class"));
    }

    #[test]
    fn ineligible_authorization_has_authorization_remediation() {
        let outcome = engine().validate_class_authorization_eligibility("Y", "BAD");
        assert!(outcome.failed());
        assert_eq!(outcome.field(), Some(CanonicalField::AuthorizationCode));
        assert!(outcome.message().unwrap().contains("Authorization code 'BAD'"));
        assert!(outcome.remediation().unwrap().contains("supervisor"));

        let class_fail = engine().validate_class_authorization_eligibility("F", "PIC_S23");
        assert_ne!(class_fail.remediation(), outcome.remediation());
    }

    #[test]
    fn flight_date_failure_is_an_outcome() {
        assert!(engine().validate_flight_date("13MAR").passed());
        let outcome = engine().validate_flight_date("13FOO");
        assert!(outcome.failed());
        assert!(outcome.message().unwrap().contains("FOO"));
    }

    #[test]
    fn name_correction_outcomes() {
        let ok = engine().validate_name_correction("GONSALES", "GONZALEZ");
        assert!(ok.passed());
        assert!(ok.message().unwrap().contains("orthographic"));

        let rejected = engine().validate_name_correction("SILVA/ANA", "COSTA/BEATRIZ");
        assert!(rejected.failed());
        assert_eq!(rejected.field(), Some(CanonicalField::Passenger));
        assert!(rejected.message().unwrap().contains("requires supporting documentation"));
        assert!(rejected.remediation().is_some());
    }

    #[test]
    fn extracted_set_all_eligible() {
        let extracted = fields(&[
            (CanonicalField::ReservationCode, "ABC123"),
            (CanonicalField::Carrier, "LA"),
            (CanonicalField::FlightStatus, "HK"),
            (CanonicalField::Class, "Y"),
            (CanonicalField::AuthorizationCode, "PIC_S24"),
            (CanonicalField::FlightDate, "13MAR"),
        ]);
        let outcomes = engine().validate_extracted(&extracted);
        assert_eq!(outcomes.len(), 5);
        assert!(outcomes.iter().all(|o| o.passed()));
    }

    #[test]
    fn extracted_set_reports_every_failure() {
        let extracted = fields(&[
            (CanonicalField::Carrier, "XX"),
            (CanonicalField::Class, "F"),
            (CanonicalField::FlightStatus, "UN"),
        ]);
        let outcomes = engine().validate_extracted(&extracted);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.failed()).count(), 3);
    }

    #[test]
    fn missing_authorization_is_ineligible() {
        let extracted = fields(&[(CanonicalField::Class, "Y")]);
        let outcomes = engine().validate_extracted(&extracted);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].field(), Some(CanonicalField::AuthorizationCode));
    }

    #[test]
    fn empty_set_only_reports_missing_class() {
        let outcomes = engine().validate_extracted(&ExtractedFields::new());
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].failed());
        assert_eq!(outcomes[0].field(), Some(CanonicalField::Class));
    }

    #[test]
    fn missing_class_is_ineligible_even_with_authorization() {
        let extracted = fields(&[
            (CanonicalField::ReservationCode, "ABC123"),
            (CanonicalField::AuthorizationCode, "PIC_S23"),
        ]);
        let outcomes = engine().validate_extracted(&extracted);
        let failed: Vec<_> = outcomes.iter().filter(|o| o.failed()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind(), Some(ErrorKind::Validation));
        assert_eq!(failed[0].field(), Some(CanonicalField::Class));
        assert!(failed[0].remediation().unwrap().contains("itinerary line"));
    }

    #[test]
    fn custom_rules_are_injected() {
        let rules = RuleSet {
            carriers: vec!["JJ".into()],
            ..RuleSet::default()
        };
        let engine = ValidationEngine::new(rules, &NameRules::default());
        assert!(engine.validate_carrier("LA").failed());
        assert!(engine.validate_carrier("jj").passed());
    }
}
