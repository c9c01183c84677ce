pub mod barrier;
pub mod cli;
pub mod core;
pub mod loader;
pub mod server;
pub mod service;
pub mod sources;

use crate::barrier::RatesHandle;
use crate::core::config::AppConfig;
use crate::service::ConversionService;
use crate::sources::FileSource;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Serve {
        port: Option<u16>,
        rates_path: Option<PathBuf>,
    },
    Convert {
        date: String,
        currency: String,
        amount: String,
    },
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("cadconv starting...");

    let mut config = AppConfig::resolve(config_path)?;

    match command {
        AppCommand::Serve { port, rates_path } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(path) = rates_path {
                config.rates.path = path;
            }
            debug!("Loaded config: {config:#?}");

            // Serve right away; requests wait on the barrier until rates load.
            let source = Arc::new(FileSource::new(&config.rates.path));
            let service = ConversionService::new(RatesHandle::spawn(source));
            server::serve(&config.server, service).await
        }
        AppCommand::Convert {
            date,
            currency,
            amount,
        } => {
            let service = load_service(&config).await?;
            cli::convert::run(&service, &date, &currency, &amount).await
        }
        AppCommand::Currencies => {
            let service = load_service(&config).await?;
            let table = service.rates().table().await;
            println!(
                "{}",
                cli::currencies::display_as_table(&cli::currencies::summarize(&table))
            );
            Ok(())
        }
    }
}

/// Loads the rate table up front so terminal commands report an unreadable
/// source instead of treating it as an empty table.
async fn load_service(config: &AppConfig) -> Result<ConversionService> {
    debug!("Loaded config: {config:#?}");
    let spinner = cli::ui::new_spinner("Loading exchange rates");
    let table = loader::load(&FileSource::new(&config.rates.path)).await;
    spinner.finish_and_clear();
    Ok(ConversionService::new(RatesHandle::ready(table?)))
}
