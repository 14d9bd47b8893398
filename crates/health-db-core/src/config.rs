//! Service configuration, loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{DuplicatePolicy, DEFAULT_LOCK_TIMEOUT};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Which record store backs the service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite file; `None` keeps the SQLite database in memory
    pub path: Option<PathBuf>,
    pub duplicate_policy: DuplicatePolicy,
    pub lock_timeout_ms: u64,
}

impl StorageConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: None,
            duplicate_policy: DuplicatePolicy::Reject,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Load and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "storage.lock_timeout_ms must be > 0".into(),
            ));
        }
        if self.storage.backend == StorageBackend::Sqlite {
            if let Some(path) = &self.storage.path {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid(
                        "storage.path must not be empty".into(),
                    ));
                }
            }
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.storage.lock_timeout(), DEFAULT_LOCK_TIMEOUT);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_full() {
        let config = Config::from_toml_str(
            r#"
            [storage]
            backend = "sqlite"
            path = "/var/lib/health/health.db"
            duplicate_policy = "overwrite"
            lock_timeout_ms = 250

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(
            config.storage.path,
            Some(PathBuf::from("/var/lib/health/health.db"))
        );
        assert_eq!(config.storage.duplicate_policy, DuplicatePolicy::Overwrite);
        assert_eq!(config.storage.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = Config::from_toml_str("[storage]\nlock_timeout_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_sqlite_path() {
        let result = Config::from_toml_str("[storage]\nbackend = \"sqlite\"\npath = \"\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let result = Config::from_toml_str("[storage]\nbackend = \"mongo\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"warn\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");

        assert!(matches!(
            Config::load("/nonexistent/health-db.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
