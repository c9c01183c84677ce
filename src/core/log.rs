// Logging initialization shared by the server and the terminal commands
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber.
///
/// `default_level` applies to this crate when `verbose` is off; the server
/// passes `INFO` so request failures are visible, terminal commands pass `OFF`.
pub fn init_logging(verbose: bool, default_level: LevelFilter) {
    let level_filter = if verbose {
        LevelFilter::DEBUG
    } else {
        default_level
    };
    let app_filter = Targets::new()
        .with_target("cadconv", level_filter)
        .with_target("tower_http", level_filter);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter.to_string().to_lowercase()));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .init();
}
