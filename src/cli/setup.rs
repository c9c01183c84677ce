use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Creates a configuration file with example content at the default location
pub fn setup() -> Result<PathBuf> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(&path)?;
    Ok(path)
}

/// Creates a configuration file with example content at the specified path
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Include the example config as a string literal in the binary
    let default_config = include_str!("../../docs/example_config.yaml");

    std::fs::write(path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
