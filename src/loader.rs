//! Builds a [`RateTable`] from a CSV rate source.
//!
//! Rows are validated individually and malformed ones are dropped; only a
//! failure to read the source itself fails the load.

use crate::core::rates::parse_iso_date;
use crate::core::{ExchangeRateRecord, RateSource, RateTable};
use anyhow::{Context, Result};
use csv::StringRecord;
use tracing::{debug, info, warn};

pub const DATE_COLUMN: &str = "REF_DATE";
pub const COUNTRY_COLUMN: &str = "GEO";
pub const CURRENCY_COLUMN: &str = "Type of currency";
pub const VALUE_COLUMN: &str = "VALUE";

/// Trims whitespace and removes one leading and one trailing quote (`'` or `"`).
///
/// Also drops a UTF-8 byte order mark, which some exports put in front of the
/// first header.
pub fn clean_field(raw: &str) -> &str {
    let s = raw.trim_start_matches('\u{feff}').trim();
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    let s = s.strip_suffix(['"', '\'']).unwrap_or(s);
    s.trim()
}

/// Positions of the four columns the loader needs.
#[derive(Debug, Default)]
struct ColumnMap {
    date: Option<usize>,
    country: Option<usize>,
    currency: Option<usize>,
    value: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut columns = ColumnMap::default();
        for (index, header) in headers.iter().enumerate() {
            let slot = match clean_field(header) {
                DATE_COLUMN => &mut columns.date,
                COUNTRY_COLUMN => &mut columns.country,
                CURRENCY_COLUMN => &mut columns.currency,
                VALUE_COLUMN => &mut columns.value,
                _ => continue,
            };
            // First occurrence of a duplicated header wins.
            slot.get_or_insert(index);
        }
        columns
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            (DATE_COLUMN, self.date),
            (COUNTRY_COLUMN, self.country),
            (CURRENCY_COLUMN, self.currency),
            (VALUE_COLUMN, self.value),
        ]
        .into_iter()
        .filter(|(_, index)| index.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

fn cell(row: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| row.get(i))
        .map(clean_field)
        .filter(|s| !s.is_empty())
}

/// Validates one data row, returning `None` when it must be dropped.
fn parse_row(columns: &ColumnMap, row: &StringRecord) -> Option<ExchangeRateRecord> {
    let date = cell(row, columns.date)?;
    parse_iso_date(date)?;
    let country = cell(row, columns.country)?;
    let currency = cell(row, columns.currency)?;
    let value = cell(row, columns.value)?.parse::<f64>().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    Some(ExchangeRateRecord {
        date: date.to_string(),
        country: country.to_string(),
        currency: currency.to_string(),
        value,
    })
}

/// Parses CSV bytes into a table. Never fails on row content.
pub fn parse_rates(data: &[u8]) -> RateTable {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let columns = match reader.headers() {
        Ok(headers) => ColumnMap::from_headers(headers),
        Err(e) => {
            warn!("Unreadable CSV header, no rates loaded: {}", e);
            return RateTable::default();
        }
    };
    let missing = columns.missing();
    if !missing.is_empty() {
        warn!("Rate source is missing columns: {}", missing.join(", "));
    }

    let mut records = Vec::new();
    let mut rejected = 0usize;
    for (line, row) in reader.records().enumerate() {
        match row.ok().and_then(|row| parse_row(&columns, &row)) {
            Some(record) => records.push(record),
            None => {
                rejected += 1;
                debug!("Dropping invalid rate row {}", line + 2);
            }
        }
    }

    if rejected > 0 {
        debug!("Dropped {} invalid rate rows", rejected);
    }
    RateTable::from_records(records)
}

/// Reads the source and builds the table.
pub async fn load(source: &dyn RateSource) -> Result<RateTable> {
    let name = source.describe();
    let data = source
        .read()
        .await
        .with_context(|| format!("Exchange rate source unreadable: {name}"))?;

    let table = parse_rates(&data);
    info!(
        source = %name,
        rates = table.len(),
        currencies = table.currency_count(),
        "Loaded exchange rates"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FileSource, MemorySource};

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field("  REF_DATE "), "REF_DATE");
        assert_eq!(clean_field("\"Type of currency\""), "Type of currency");
        assert_eq!(clean_field("'GEO'"), "GEO");
        assert_eq!(clean_field(" \"VALUE' "), "VALUE");
        assert_eq!(clean_field("\u{feff}\"REF_DATE\""), "REF_DATE");
        assert_eq!(clean_field("\"\"quoted\"\""), "\"quoted\"");
        assert_eq!(clean_field(""), "");
    }

    #[test]
    fn test_parse_valid_rows_with_quoted_headers() {
        let csv = concat!(
            "\"REF_DATE\", \"GEO\" ,'Type of currency',\"UOM\",  VALUE  \n",
            "2023-05-31,Canada,\"Australian dollar, daily average\",Dollars,1.23\n",
            "2023-05-31,Canada,\"U.S. dollar, daily average\",Dollars, 1.3587 \n",
        );

        let table = parse_rates(csv.as_bytes());
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records()[0],
            ExchangeRateRecord {
                date: "2023-05-31".to_string(),
                country: "Canada".to_string(),
                currency: "Australian dollar, daily average".to_string(),
                value: 1.23,
            }
        );
        assert_eq!(table.records()[1].value, 1.3587);
        assert_eq!(table.currency_count(), 2);
    }

    #[test]
    fn test_empty_value_row_is_dropped() {
        let csv = concat!(
            "REF_DATE,GEO,Type of currency,VALUE\n",
            "2023-05-31,Canada,\"Australian dollar, daily average\",1.23\n",
            "2023-05-31,Canada,\"U.S. dollar, daily average\",\n",
        );

        let table = parse_rates(csv.as_bytes());
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.records()[0].currency,
            "Australian dollar, daily average"
        );
        assert!(!table.supports("U.S. dollar, daily average"));
    }

    #[test]
    fn test_malformed_rows_are_dropped() {
        let csv = concat!(
            "REF_DATE,GEO,Type of currency,VALUE\n",
            "2023-05-31,Canada,Euro,invalid\n",
            "2023-05-31,Canada,Euro,1.2abc\n",
            "2023-05-31,Canada,Euro,NaN\n",
            "2023-05-31,Canada,Euro,inf\n",
            "2023-05-31,Canada,Euro,0\n",
            "2023-05-31,Canada,Euro,-1.5\n",
            "2023-02-30,Canada,Euro,1.45\n",
            "31/05/2023,Canada,Euro,1.45\n",
            ",Canada,Euro,1.45\n",
            "2023-05-31,,Euro,1.45\n",
            "2023-05-31,Canada,,1.45\n",
            "2023-05-31,Canada\n",
            "2023-06-01,Canada,Euro,1.4533\n",
        );

        let table = parse_rates(csv.as_bytes());
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].date, "2023-06-01");
        assert_eq!(table.records()[0].value, 1.4533);
    }

    #[test]
    fn test_missing_column_yields_empty_table() {
        let csv = "REF_DATE,Type of currency,VALUE\n2023-05-31,Euro,1.45\n";
        let table = parse_rates(csv.as_bytes());
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_rates(b"").is_empty());
    }

    #[test]
    fn test_file_order_is_preserved() {
        let csv = concat!(
            "REF_DATE,GEO,Type of currency,VALUE\n",
            "2023-06-02,Canada,Euro,1.46\n",
            "2023-06-01,Canada,Euro,1.45\n",
            "2023-06-03,Canada,Euro,1.47\n",
        );
        let table = parse_rates(csv.as_bytes());
        let dates: Vec<_> = table.records().iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2023-06-02", "2023-06-01", "2023-06-03"]);
    }

    #[tokio::test]
    async fn test_load_from_memory_source() -> Result<()> {
        let source = MemorySource::new(
            "rates",
            "REF_DATE,GEO,Type of currency,VALUE\n2023-05-31,Canada,Euro,1.45\n",
        );
        let table = load(&source).await?;
        assert_eq!(table.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_source_fails_the_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = FileSource::new(dir.path().join("nope.csv"));

        let err = load(&source).await.unwrap_err();
        assert!(err.to_string().contains("Exchange rate source unreadable"));
    }
}
