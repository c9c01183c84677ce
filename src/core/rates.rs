//! Exchange-rate records and the read-only table built from them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Date layout accepted for both rate records and conversion requests.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One published rate: on `date`, as reported for `country`, the named
/// `currency` traded at `value` against the Canadian dollar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateRecord {
    pub date: String,
    pub country: String,
    pub currency: String,
    pub value: f64,
}

/// Parses a strict `YYYY-MM-DD` calendar date.
///
/// chrono alone tolerates unpadded fields such as `2023-5-1`, so the shape is
/// checked before parsing.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Rates in load order plus the set of currency labels they mention.
///
/// Built once and never mutated; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    records: Vec<ExchangeRateRecord>,
    currencies: BTreeSet<String>,
}

impl RateTable {
    pub fn from_records(records: Vec<ExchangeRateRecord>) -> Self {
        let currencies = records.iter().map(|r| r.currency.clone()).collect();
        Self {
            records,
            currencies,
        }
    }

    pub fn records(&self) -> &[ExchangeRateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact, case-sensitive membership test against the supported set.
    pub fn supports(&self, currency: &str) -> bool {
        self.currencies.contains(currency)
    }

    /// Supported currency labels in sorted order.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.currencies.iter().map(String::as_str)
    }

    pub fn currency_count(&self) -> usize {
        self.currencies.len()
    }

    /// First record whose date and currency both equal the query exactly.
    pub fn find(&self, date: &str, currency: &str) -> Option<&ExchangeRateRecord> {
        self.records
            .iter()
            .find(|rate| rate.date == date && rate.currency == currency)
    }

    /// Every record for one currency, in load order.
    pub fn history<'a>(
        &'a self,
        currency: &'a str,
    ) -> impl Iterator<Item = &'a ExchangeRateRecord> + 'a {
        self.records.iter().filter(move |r| r.currency == currency)
    }
}
