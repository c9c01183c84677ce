use super::ui;
use crate::core::ConversionError;
use crate::service::{AmountInput, ConversionRequest, ConversionResult, ConversionService};
use anyhow::{Result, bail};
use comfy_table::Cell;

impl ConversionResult {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell("Currency"),
            ui::header_cell("Amount (CAD)"),
            ui::header_cell("Exchange Rate"),
            ui::header_cell("Converted Amount"),
        ]);
        table.add_row(vec![
            Cell::new(&self.date),
            Cell::new(&self.currency),
            ui::number_cell(format!("{:.4}", self.amount_in_cad)),
            ui::number_cell(self.exchange_rate.to_string()),
            ui::highlight_cell(format!("{:.4}", self.amount_in_currency)),
        ]);

        format!(
            "{}\n\n{}",
            ui::style_text("Conversion", ui::StyleType::Title),
            table
        )
    }
}

/// Renders every problem with the request, one per line.
pub fn display_error(err: &ConversionError) -> String {
    let lines: Vec<String> = match err {
        ConversionError::Validation(errors) => errors
            .iter()
            .map(|e| format!("{}: {}", ui::style_text(e.field, ui::StyleType::Label), e))
            .collect(),
        other => vec![other.to_string()],
    };
    lines
        .iter()
        .map(|line| ui::style_text(line, ui::StyleType::Error))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts one amount from the command line and prints the result.
pub async fn run(service: &ConversionService, date: &str, currency: &str, amount: &str) -> Result<()> {
    let request = ConversionRequest {
        date: Some(date.to_string()),
        currency: Some(currency.to_string()),
        amount_in_cad: Some(AmountInput::Text(amount.to_string())),
    };

    match service.handle(&request).await {
        Ok(result) => {
            println!("{}", result.display_as_table());
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", display_error(&e));
            bail!("Conversion failed: {e}")
        }
    }
}
