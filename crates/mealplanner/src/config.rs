use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

/// Path that selects a private in-memory SQLite database.
pub const IN_MEMORY_PATH: &str = ":memory:";

const DEFAULT_PATH: &str = "meal-planner-ai.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 250;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Database configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (default: "meal-planner-ai.db")
    pub path: PathBuf,
    /// How long a connection waits on a locked database before giving up
    /// (default: 250ms)
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MEALPLANNER_DB_PATH` - SQLite database path, `:memory:` for an
    ///   in-memory database (default: "meal-planner-ai.db")
    /// - `MEALPLANNER_BUSY_TIMEOUT_MS` - Busy timeout in milliseconds (default: 250)
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("MEALPLANNER_DB_PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string());

        let busy_timeout_ms = match env::var("MEALPLANNER_BUSY_TIMEOUT_MS") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "MEALPLANNER_BUSY_TIMEOUT_MS",
                value,
            })?,
            Err(_) => DEFAULT_BUSY_TIMEOUT_MS,
        };

        Ok(Self {
            path: PathBuf::from(path),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }

    /// Configuration for a file at `path` with default settings.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::at(IN_MEMORY_PATH)
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::at(DEFAULT_PATH)
    }
}
