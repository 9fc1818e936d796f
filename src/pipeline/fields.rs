//! Canonical field names shared by extraction, validation, mapping and fill.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A logical field, independent of where it was read from or where it is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ReservationCode,
    City,
    Country,
    Department,
    Reason,
    Authorizer,
    SegmentNumber,
    Carrier,
    FlightNumber,
    Class,
    FlightDate,
    Route,
    Passenger,
    DestinationCode,
    TicketNumber,
    AuthorizationCode,
    FlightStatus,
}

impl CanonicalField {
    /// The fields every form mapping must configure.
    pub const FORM_FIELDS: [CanonicalField; 14] = [
        CanonicalField::ReservationCode,
        CanonicalField::City,
        CanonicalField::Country,
        CanonicalField::Department,
        CanonicalField::Reason,
        CanonicalField::Authorizer,
        CanonicalField::SegmentNumber,
        CanonicalField::Carrier,
        CanonicalField::FlightNumber,
        CanonicalField::Class,
        CanonicalField::FlightDate,
        CanonicalField::Route,
        CanonicalField::Passenger,
        CanonicalField::DestinationCode,
    ];

    /// Fields a screen must yield to be considered a complete itinerary capture.
    pub const ITINERARY_FIELDS: [CanonicalField; 7] = [
        CanonicalField::ReservationCode,
        CanonicalField::Carrier,
        CanonicalField::FlightNumber,
        CanonicalField::Class,
        CanonicalField::FlightDate,
        CanonicalField::Route,
        CanonicalField::FlightStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReservationCode => "reservation_code",
            Self::City => "city",
            Self::Country => "country",
            Self::Department => "department",
            Self::Reason => "reason",
            Self::Authorizer => "authorizer",
            Self::SegmentNumber => "segment_number",
            Self::Carrier => "carrier",
            Self::FlightNumber => "flight_number",
            Self::Class => "class",
            Self::FlightDate => "flight_date",
            Self::Route => "route",
            Self::Passenger => "passenger",
            Self::DestinationCode => "destination_code",
            Self::TicketNumber => "ticket_number",
            Self::AuthorizationCode => "authorization_code",
            Self::FlightStatus => "flight_status",
        }
    }

    pub fn is_form_field(&self) -> bool {
        Self::FORM_FIELDS.contains(self)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_as_str() {
        for field in CanonicalField::FORM_FIELDS {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
        let json = serde_json::to_string(&CanonicalField::AuthorizationCode).unwrap();
        assert_eq!(json, "\"authorization_code\"");
    }

    #[test]
    fn validation_only_fields_are_not_form_fields() {
        assert!(!CanonicalField::TicketNumber.is_form_field());
        assert!(!CanonicalField::AuthorizationCode.is_form_field());
        assert!(!CanonicalField::FlightStatus.is_form_field());
        assert!(CanonicalField::Passenger.is_form_field());
    }

    #[test]
    fn form_fields_are_unique() {
        let mut fields = CanonicalField::FORM_FIELDS.to_vec();
        fields.sort();
        fields.dedup();
        assert_eq!(fields.len(), 14);
    }
}
