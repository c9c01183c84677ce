use anyhow::Result;
use cadconv::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the conversion API over HTTP
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Exchange-rate CSV file (overrides config and EXCHANGE_RATES)
        #[arg(short, long)]
        rates: Option<PathBuf>,
    },
    /// Convert an amount of CAD on a given date
    Convert {
        /// Date of the rate, YYYY-MM-DD
        date: String,
        /// Currency label as it appears in the rate table
        currency: String,
        /// Amount in CAD
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// List supported currencies
    Currencies,
}

impl From<Commands> for cadconv::AppCommand {
    fn from(cmd: Commands) -> cadconv::AppCommand {
        match cmd {
            Commands::Serve { port, rates } => cadconv::AppCommand::Serve {
                port,
                rates_path: rates,
            },
            Commands::Convert {
                date,
                currency,
                amount,
            } => cadconv::AppCommand::Convert {
                date,
                currency,
                amount,
            },
            Commands::Currencies => cadconv::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve { .. }) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, default_level);

    let result = match cli.command {
        Some(Commands::Setup) => cadconv::cli::setup::setup().map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Some(cmd) => cadconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
