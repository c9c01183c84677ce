use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Environment variable overriding the rate CSV location.
pub const RATES_PATH_ENV: &str = "EXCHANGE_RATES";
/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "PORT";

pub const DEFAULT_RATES_PATH: &str = "data/exchange_rates.csv";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RatesConfig {
    /// CSV file, resolved against the working directory when relative.
    #[serde(default = "default_rates_path")]
    pub path: PathBuf,
}

fn default_rates_path() -> PathBuf {
    PathBuf::from(DEFAULT_RATES_PATH)
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            path: default_rates_path(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rates: RatesConfig,
}

impl AppConfig {
    /// Loads from `path` if given, else from the default location when a file
    /// exists there, else built-in defaults. Environment overrides apply last.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load()?,
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ca", "cadconv", "cadconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies `EXCHANGE_RATES` and `PORT` as looked up by `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(RATES_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            debug!("Rates path overridden by {}", RATES_PATH_ENV);
            self.rates.path = PathBuf::from(path.trim());
        }
        if let Some(port) = lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {PORT_ENV} value: {port}"))?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
server:
  host: "127.0.0.1"
  port: 8080
rates:
  path: "/srv/rates/exchange_rates.csv"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.rates.path,
            PathBuf::from("/srv/rates/exchange_rates.csv")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("server:\n  port: 9000\n").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.rates.path, PathBuf::from(DEFAULT_RATES_PATH));

        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let config = AppConfig::default().with_env(env(&[
            ("EXCHANGE_RATES", "/tmp/rates.csv"),
            ("PORT", " 4000 "),
        ]))?;
        assert_eq!(config.rates.path, PathBuf::from("/tmp/rates.csv"));
        assert_eq!(config.server.port, 4000);

        let untouched = AppConfig::default().with_env(env(&[("PORT", "")]))?;
        assert_eq!(untouched, AppConfig::default());
        Ok(())
    }

    #[test]
    fn test_invalid_port_env_is_an_error() {
        let err = AppConfig::default()
            .with_env(env(&[("PORT", "not-a-port")]))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid PORT value"));
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), "rates:\n  path: other.csv\n")?;

        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.rates.path, PathBuf::from("other.csv"));
        assert_eq!(config.server, ServerConfig::default());
        Ok(())
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let err = AppConfig::load_from_path("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
