//! Request-level error taxonomy

use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

pub const NOT_FOUND_MESSAGE: &str = "Exchange rate not found for the given date and currency";
pub const CORRUPT_RATE_MESSAGE: &str = "Invalid exchange rate";
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    MissingField,
    InvalidFormat,
    UnsupportedCurrency,
    InvalidAmount,
}

/// One failed check on one request field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    #[serde(rename = "code")]
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(
            field,
            FieldErrorKind::MissingField,
            format!("{field} is required"),
        )
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("{}", join_messages(.0))]
    Validation(Vec<FieldError>),

    #[error("Exchange rate not found for the given date and currency")]
    RateNotFound { date: String, currency: String },

    #[error("Invalid exchange rate")]
    CorruptRate { date: String, currency: String },

    #[error("Internal Server Error")]
    Internal(String),
}

impl ConversionError {
    /// HTTP status code associated with the failure class.
    pub fn status(&self) -> u16 {
        match self {
            ConversionError::Validation(_) => 400,
            ConversionError::RateNotFound { .. } => 404,
            ConversionError::CorruptRate { .. } | ConversionError::Internal(_) => 500,
        }
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(
            ConversionError::Validation(vec![FieldError::missing("date")]).status(),
            400
        );
        let not_found = ConversionError::RateNotFound {
            date: "2099-01-01".to_string(),
            currency: "Fictional currency".to_string(),
        };
        assert_eq!(not_found.status(), 404);
        assert_eq!(not_found.to_string(), NOT_FOUND_MESSAGE);
        assert_eq!(
            ConversionError::Internal("boom".to_string()).to_string(),
            INTERNAL_MESSAGE
        );
    }

    #[test]
    fn test_validation_message_joins_fields() {
        let err = ConversionError::Validation(vec![
            FieldError::missing("date"),
            FieldError::missing("currency"),
        ]);
        assert_eq!(err.to_string(), "date is required, currency is required");
    }

    #[test]
    fn test_field_error_serialization() {
        let json = serde_json::to_value(FieldError::missing("amount_in_cad")).unwrap();
        assert_eq!(json["field"], "amount_in_cad");
        assert_eq!(json["code"], "missing_field");
        assert_eq!(json["message"], "amount_in_cad is required");
    }
}
