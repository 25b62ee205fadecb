//! Script configuration loading from file and environment variables.

use examdesk_db::{DbRuntimeSettings, RebuildMode};
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration shared by every maintenance script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Schema maintenance settings.
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "warn", "examdesk_db=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MigrationsConfig {
    /// Run table rebuilds inside a single transaction.
    #[serde(default)]
    pub atomic_rebuild: bool,
}

fn default_db_path() -> String {
    "examdesk.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    pub fn runtime_settings(&self) -> DbRuntimeSettings {
        DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

impl MigrationsConfig {
    pub fn rebuild_mode(&self) -> RebuildMode {
        if self.atomic_rebuild {
            RebuildMode::Atomic
        } else {
            RebuildMode::Stepwise
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Returns the config path from `EXAMDESK_CONFIG_PATH`, or the default.
pub fn resolve_config_path() -> (String, &'static str) {
    match std::env::var("EXAMDESK_CONFIG_PATH") {
        Ok(path) if !path.trim().is_empty() => (path, "env-var"),
        _ => ("examdesk.toml".to_string(), "default"),
    }
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist, then applies environment overrides.
///
/// Environment variable overrides:
/// - `EXAMDESK_DB_PATH` overrides `database.path`
/// - `EXAMDESK_LOG_LEVEL` overrides `logging.level`
/// - `EXAMDESK_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `EXAMDESK_ATOMIC_REBUILD` overrides `migrations.atomic_rebuild`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let mut config = load_config_file(path)?;

    if let Ok(db_path) = std::env::var("EXAMDESK_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("EXAMDESK_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("EXAMDESK_LOG_JSON") {
        config.logging.json = is_truthy(&json);
    }
    if let Ok(atomic) = std::env::var("EXAMDESK_ATOMIC_REBUILD") {
        config.migrations.atomic_rebuild = is_truthy(&atomic);
    }

    Ok(config)
}

/// Reads `path` without looking at the environment.
pub fn load_config_file(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path, "config file not found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(ConfigError::FileRead(e)),
    }
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config_file(path.to_str().unwrap()).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.database.path, "examdesk.db");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.migrations.rebuild_mode(), RebuildMode::Stepwise);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[database]\npath = \"/srv/app.db\"\n\n[migrations]\natomic_rebuild = true\n"
        )
        .unwrap();

        let config = load_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.database.path, "/srv/app.db");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.migrations.rebuild_mode(), RebuildMode::Atomic);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[database\npath = 3").unwrap();

        let err = load_config_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn runtime_settings_follow_database_config() {
        let config = DatabaseConfig {
            path: "x.db".into(),
            busy_timeout_ms: 100,
            pool_max_size: 4,
        };
        assert_eq!(
            config.runtime_settings(),
            DbRuntimeSettings {
                busy_timeout_ms: 100,
                pool_max_size: 4,
            }
        );
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("yes"));
        assert!(!is_truthy("TRUE"));
    }
}
