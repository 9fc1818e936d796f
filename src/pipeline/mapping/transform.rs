//! Value transforms applied between extraction and fill.
//!
//! Mapping data names a `TransformKind`; the function itself is resolved here
//! so mapping files stay plain data.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Month abbreviations as printed on the reservation screen.
const MONTHS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

/// Flight numbers on the form hold at most this many digits.
const MAX_FLIGHT_DIGITS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Invalid date '{0}': expected 5 characters like 13MAR")]
    InvalidDateLength(String),

    #[error("Invalid day in '{0}': expected 01 to 31")]
    InvalidDay(String),

    #[error("Unknown month abbreviation '{0}'")]
    UnknownMonth(String),

    #[error("No value to transform")]
    EmptyValue,
}

/// Named value transform. Serialized in mapping files as snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    #[default]
    Identity,
    Uppercase,
    FlightDigits,
    ShortDate,
    RouteSlash,
}

type TransformFn = fn(&str) -> Result<String, TransformError>;

impl TransformKind {
    fn function(&self) -> TransformFn {
        match self {
            Self::Identity => identity,
            Self::Uppercase => uppercase,
            Self::FlightDigits => flight_digits,
            Self::ShortDate => date_transform,
            Self::RouteSlash => route_slash,
        }
    }

    pub fn apply(&self, value: &str) -> Result<String, TransformError> {
        (self.function())(value)
    }
}

fn identity(value: &str) -> Result<String, TransformError> {
    Ok(value.to_string())
}

fn uppercase(value: &str) -> Result<String, TransformError> {
    Ok(value.trim().to_uppercase())
}

fn flight_digits(value: &str) -> Result<String, TransformError> {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_FLIGHT_DIGITS)
        .collect();
    if digits.is_empty() {
        return Err(TransformError::EmptyValue);
    }
    Ok(digits)
}

fn route_slash(value: &str) -> Result<String, TransformError> {
    let route = value.trim();
    if route.is_empty() {
        return Err(TransformError::EmptyValue);
    }
    Ok(route.replace('-', "/").to_uppercase())
}

/// "13MAR" → "13/03/<current year>".
pub fn date_transform(token: &str) -> Result<String, TransformError> {
    date_transform_for_year(token, chrono::Local::now().year())
}

pub fn date_transform_for_year(token: &str, year: i32) -> Result<String, TransformError> {
    let token = token.trim();
    if token.chars().count() != 5 {
        return Err(TransformError::InvalidDateLength(token.to_string()));
    }

    // Five chars but possibly multi-byte: split on char boundaries.
    let split = token
        .char_indices()
        .nth(2)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    let (day, month) = token.split_at(split);

    if !day.chars().all(|c| c.is_ascii_digit()) {
        return Err(TransformError::InvalidDay(token.to_string()));
    }
    let day_num: u32 = day
        .parse()
        .map_err(|_| TransformError::InvalidDay(token.to_string()))?;
    if !(1..=31).contains(&day_num) {
        return Err(TransformError::InvalidDay(token.to_string()));
    }

    let month_upper = month.to_uppercase();
    let month_num = MONTHS
        .iter()
        .position(|m| *m == month_upper)
        .map(|i| i + 1)
        .ok_or_else(|| TransformError::UnknownMonth(month.to_string()))?;

    Ok(format!("{day}/{month_num:02}/{year}"))
}
