//! Request validation and CAD conversion against the loaded rate table.

use crate::barrier::RatesHandle;
use crate::core::rates::parse_iso_date;
use crate::core::{ConversionError, FieldError, FieldErrorKind, RateTable};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error};

/// Decimal places kept in `amount_in_currency`.
pub const AMOUNT_DECIMALS: u32 = 4;

/// Beyond this magnitude an f64 carries no fractional digits to round.
const ROUNDING_LIMIT: f64 = 1e15;

pub const INVALID_DATE_MESSAGE: &str =
    "Invalid date, Please provide valid date in 'YYYY-MM-DD' format.";
pub const INVALID_AMOUNT_MESSAGE: &str = "Invalid amount.";

/// `amount_in_cad` is accepted either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionRequest {
    pub date: Option<String>,
    pub currency: Option<String>,
    pub amount_in_cad: Option<AmountInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub date: String,
    pub currency: String,
    pub amount_in_cad: f64,
    pub exchange_rate: f64,
    pub amount_in_currency: f64,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_amount(amount: &AmountInput) -> Result<f64, FieldError> {
    let parsed = match amount {
        AmountInput::Number(n) => Some(*n),
        AmountInput::Text(s) => s.trim().parse::<f64>().ok(),
    };
    parsed.filter(|n| n.is_finite()).ok_or_else(|| {
        FieldError::new(
            "amount_in_cad",
            FieldErrorKind::InvalidAmount,
            INVALID_AMOUNT_MESSAGE,
        )
    })
}

/// Checks every field against `table` and reports all failures together.
///
/// Returns the parsed amount, unrounded, when the request is valid.
pub fn validate(
    table: &RateTable,
    date: Option<&str>,
    currency: Option<&str>,
    amount_in_cad: Option<&AmountInput>,
) -> Result<f64, Vec<FieldError>> {
    let mut errors = Vec::new();

    match present(date) {
        None => errors.push(FieldError::missing("date")),
        Some(d) if parse_iso_date(d).is_none() => errors.push(FieldError::new(
            "date",
            FieldErrorKind::InvalidFormat,
            INVALID_DATE_MESSAGE,
        )),
        Some(_) => {}
    }

    match present(currency) {
        None => errors.push(FieldError::missing("currency")),
        Some(c) if !table.supports(c) => errors.push(FieldError::new(
            "currency",
            FieldErrorKind::UnsupportedCurrency,
            format!("Currency: {c}, is not supported at this moment."),
        )),
        Some(_) => {}
    }

    let amount = match amount_in_cad {
        None => {
            errors.push(FieldError::missing("amount_in_cad"));
            None
        }
        Some(AmountInput::Text(s)) if s.trim().is_empty() => {
            errors.push(FieldError::missing("amount_in_cad"));
            None
        }
        Some(raw) => match parse_amount(raw) {
            Ok(n) => Some(n),
            Err(e) => {
                errors.push(e);
                None
            }
        },
    };

    match amount {
        Some(n) if errors.is_empty() => Ok(n),
        _ => Err(errors),
    }
}

/// Rounds half away from zero to `dp` places.
///
/// Works on the shortest decimal form of `value`, so `1.00005` rounds up even
/// though its binary value sits just below the midpoint.
pub fn round_to(value: f64, dp: u32) -> f64 {
    Decimal::from_str(&value.to_string())
        .ok()
        .and_then(|d| {
            d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
                .to_string()
                .parse::<f64>()
                .ok()
        })
        .unwrap_or_else(|| {
            if !value.is_finite() || value.abs() >= ROUNDING_LIMIT {
                return value;
            }
            let factor = 10f64.powi(dp as i32);
            (value * factor).round() / factor
        })
}

/// Converts an already validated amount using the first matching rate.
pub fn convert(
    table: &RateTable,
    date: &str,
    currency: &str,
    amount_in_cad: f64,
) -> Result<ConversionResult, ConversionError> {
    let record = table
        .find(date, currency)
        .ok_or_else(|| ConversionError::RateNotFound {
            date: date.to_string(),
            currency: currency.to_string(),
        })?;

    let exchange_rate = record.value;
    if !exchange_rate.is_finite() || exchange_rate <= 0.0 {
        return Err(ConversionError::CorruptRate {
            date: date.to_string(),
            currency: currency.to_string(),
        });
    }

    // A sound rate can still push a huge amount past f64 range.
    let quotient = amount_in_cad / exchange_rate;
    if !quotient.is_finite() {
        return Err(ConversionError::Validation(vec![FieldError::new(
            "amount_in_cad",
            FieldErrorKind::InvalidAmount,
            INVALID_AMOUNT_MESSAGE,
        )]));
    }

    Ok(ConversionResult {
        date: date.to_string(),
        currency: currency.to_string(),
        amount_in_cad,
        exchange_rate,
        amount_in_currency: round_to(quotient, AMOUNT_DECIMALS),
    })
}

/// Validation and conversion bound to the shared rate table.
///
/// Every operation waits for the one-time load before reading the table.
#[derive(Clone)]
pub struct ConversionService {
    rates: RatesHandle,
}

impl ConversionService {
    pub fn new(rates: RatesHandle) -> Self {
        ConversionService { rates }
    }

    pub fn rates(&self) -> &RatesHandle {
        &self.rates
    }

    pub async fn validate(
        &self,
        date: Option<&str>,
        currency: Option<&str>,
        amount_in_cad: Option<&AmountInput>,
    ) -> Result<f64, Vec<FieldError>> {
        let table = self.rates.table().await;
        validate(&table, date, currency, amount_in_cad)
    }

    pub async fn convert(
        &self,
        date: &str,
        currency: &str,
        amount_in_cad: f64,
    ) -> Result<ConversionResult, ConversionError> {
        let table = self.rates.table().await;
        convert(&table, date, currency, amount_in_cad)
    }

    /// Validates then converts, logging any failure before returning it.
    pub async fn handle(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        let date = request.date.as_deref();
        let currency = request.currency.as_deref();

        let outcome = match self
            .validate(date, currency, request.amount_in_cad.as_ref())
            .await
        {
            Ok(amount) => {
                // Both fields are present once validation passes.
                self.convert(
                    date.unwrap_or_default(),
                    currency.unwrap_or_default(),
                    amount,
                )
                .await
            }
            Err(errors) => Err(ConversionError::Validation(errors)),
        };

        match &outcome {
            Ok(result) => debug!(
                date = %result.date,
                currency = %result.currency,
                amount_in_currency = result.amount_in_currency,
                "Converted amount"
            ),
            Err(e) => error!(
                date = date.unwrap_or_default(),
                currency = currency.unwrap_or_default(),
                "{e}"
            ),
        }
        outcome
    }
}
