use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Error, Result};

/// Crate configuration, loaded from a TOML file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Record Store settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bound on each store round trip, in milliseconds.
    pub timeout_ms: u64,
    /// Backing file for the JSON-file store.
    pub local_path: String,
}

/// Logging settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.timeout_ms == 0 {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "store.timeout_ms",
                reason: "must be greater than zero".into(),
            }));
        }
        if self.store.local_path.is_empty() {
            return Err(Error::Config(ConfigError::InvalidValue {
                field: "store.local_path",
                reason: "cannot be empty".into(),
            }));
        }
        Ok(())
    }
}

impl StoreConfig {
    /// The round-trip bound as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            local_path: "bondfi_transactions.json".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn load_parses_partial_toml_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bondfi.toml");
        std::fs::write(
            &path,
            "[store]\ntimeout_ms = 2500\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.timeout(), Duration::from_millis(2500));
        assert_eq!(config.store.local_path, "bondfi_transactions.json");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bondfi.toml");
        std::fs::write(&path, "[store]\ntimeout_ms = 0\n").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            Config::load("/nonexistent/bondfi.toml"),
            Err(Error::Config(ConfigError::ReadFile(_)))
        ));
    }
}
