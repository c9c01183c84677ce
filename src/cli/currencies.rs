use super::ui;
use crate::core::RateTable;
use comfy_table::Cell;

/// Coverage of one supported currency in the loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySummary {
    pub currency: String,
    pub rates: usize,
    pub first_date: String,
    pub last_date: String,
}

/// One summary per supported currency, sorted by label.
pub fn summarize(table: &RateTable) -> Vec<CurrencySummary> {
    table
        .currencies()
        .filter_map(|currency| {
            let dates: Vec<&str> = table.history(currency).map(|r| r.date.as_str()).collect();
            // ISO dates order lexically
            Some(CurrencySummary {
                currency: currency.to_string(),
                rates: dates.len(),
                first_date: dates.iter().min()?.to_string(),
                last_date: dates.iter().max()?.to_string(),
            })
        })
        .collect()
}

pub fn display_as_table(summaries: &[CurrencySummary]) -> String {
    if summaries.is_empty() {
        return ui::style_text("No exchange rates loaded", ui::StyleType::Error);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Rates"),
        ui::header_cell("From"),
        ui::header_cell("To"),
    ]);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.currency),
            ui::number_cell(summary.rates.to_string()),
            Cell::new(&summary.first_date),
            Cell::new(&summary.last_date),
        ]);
    }

    format!(
        "{}\n\n{}\n\n{}",
        ui::style_text("Supported currencies", ui::StyleType::Title),
        table,
        ui::style_text(
            &format!("{} currencies", summaries.len()),
            ui::StyleType::Subtle
        )
    )
}
