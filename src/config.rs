//! Process settings loaded from `APP_*` environment variables
//!
//! Settings are read once at startup and never mutated afterwards.

use envconfig::Envconfig;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Env(#[from] envconfig::Error),
}

/// Whole-second duration parsed from an environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvSecsDuration(pub Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvSecsDurationError;

impl FromStr for EnvSecsDuration {
    type Err = ParseEnvSecsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = s
            .trim()
            .parse::<u64>()
            .map_err(|_| ParseEnvSecsDurationError)?;

        Ok(EnvSecsDuration(Duration::from_secs(secs)))
    }
}

/// Service settings
#[derive(Envconfig, Clone)]
pub struct Settings {
    #[envconfig(from = "APP_PORT", default = "8080")]
    pub port: u16,

    /// Time after start during which `/readyz` reports `warming`
    #[envconfig(from = "APP_READINESS_WARMUP_SECONDS", default = "1")]
    pub readiness_warmup: EnvSecsDuration,

    /// Upper bound on waiting for in-flight requests at shutdown
    #[envconfig(from = "APP_SHUTDOWN_TIMEOUT_SECONDS", default = "10")]
    pub shutdown_timeout: EnvSecsDuration,

    /// Value echoed by `/test-env`
    #[envconfig(from = "APP_CONFIG_MAP_ENV_VAR", default = "")]
    pub config_map_env_var: String,

    #[envconfig(from = "APP_SECRET_USERNAME", default = "")]
    pub secret_username: String,

    #[envconfig(from = "APP_SECRET_PASSWORD", default = "")]
    pub secret_password: String,

    /// Mounted volume used by `/pvc-test`
    #[envconfig(from = "APP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[envconfig(from = "APP_POD_NAME", default = "local")]
    pub pod_name: String,

    #[envconfig(from = "APP_LOG_LEVEL", default = "info")]
    pub log_level: String,

    #[envconfig(nested = true)]
    pub postgres: PostgresSettings,
}

/// Postgres connection parameters
///
/// All fields default to empty; the database is treated as absent
/// until user and database name are provided.
#[derive(Envconfig, Clone, Default)]
pub struct PostgresSettings {
    #[envconfig(from = "APP_POSTGRES_HOST", default = "")]
    pub host: String,

    #[envconfig(from = "APP_POSTGRES_PORT", default = "5432")]
    pub port: u16,

    #[envconfig(from = "APP_POSTGRES_USER", default = "")]
    pub user: String,

    /// May be empty for trust authentication
    #[envconfig(from = "APP_POSTGRES_PASSWORD", default = "")]
    pub password: String,

    #[envconfig(from = "APP_POSTGRES_DB", default = "")]
    pub database: String,

    #[envconfig(from = "APP_POSTGRES_MAX_CONNECTIONS", default = "5")]
    pub max_connections: u32,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::init_from_env()?)
    }

    /// Load settings from an explicit map, ignoring the process environment
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(Self::init_from_hashmap(vars)?)
    }

    pub fn readiness_warmup(&self) -> Duration {
        self.readiness_warmup.0
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout.0
    }

    /// Postgres parameters, if the server should use a database at all
    pub fn database(&self) -> Option<&PostgresSettings> {
        self.postgres.is_configured().then_some(&self.postgres)
    }
}

impl PostgresSettings {
    /// The server considers the database configured once user and name are set.
    pub fn is_configured(&self) -> bool {
        !self.user.is_empty() && !self.database.is_empty()
    }

    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push("host");
        }
        if self.user.is_empty() {
            missing.push("user");
        }
        if self.database.is_empty() {
            missing.push("database");
        }
        missing
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
