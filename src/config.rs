//! # Ticket Core Configuration
//!
//! Layered configuration: compiled defaults, an optional TOML file, then
//! `TICKET_*` environment variables. Values are validated after loading.
//!
//! ```rust,no_run
//! use bank_ticket_core::config::TicketConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TicketConfig::load(Some(std::path::Path::new("config/ticket.toml")))?;
//! println!("max page size: {}", config.max_page_size);
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_UNIQUE_RETRY_LIMIT, ENV_PREFIX, MAX_PAGE_SIZE, STREAM_MAX_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What happens to an application's audit trail when the application is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRetention {
    /// History rows outlive their application
    #[default]
    Retain,
    /// History rows are removed together with their application
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Upper bound for offset listings; larger requests are rejected
    pub max_page_size: u32,
    /// Upper bound for keyset batches; larger requests are clamped
    pub stream_max_limit: u32,
    pub default_page_size: u32,
    pub history_retention: HistoryRetention,
    /// Attempts for operations that can lose a uniqueness race
    pub unique_retry_limit: u32,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/bank_ticket_development".to_string(),
            max_connections: 10,
            max_page_size: MAX_PAGE_SIZE,
            stream_max_limit: STREAM_MAX_LIMIT,
            default_page_size: DEFAULT_PAGE_SIZE,
            history_retention: HistoryRetention::default(),
            unique_retry_limit: DEFAULT_UNIQUE_RETRY_LIMIT,
        }
    }
}

impl TicketConfig {
    /// Load defaults, then `path` (if given), then `TICKET_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let loaded: TicketConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;

        tracing::debug!(
            max_page_size = loaded.max_page_size,
            stream_max_limit = loaded.stream_max_limit,
            history_retention = ?loaded.history_retention,
            "Configuration loaded"
        );

        Ok(loaded)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid("max_page_size must be positive".into()));
        }
        if self.stream_max_limit == 0 {
            return Err(ConfigError::Invalid(
                "stream_max_limit must be positive".into(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "default_page_size must be between 1 and {}",
                self.max_page_size
            )));
        }
        if self.unique_retry_limit == 0 {
            return Err(ConfigError::Invalid(
                "unique_retry_limit must be at least 1".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TicketConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.stream_max_limit, 50);
        assert_eq!(config.history_retention, HistoryRetention::Retain);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "max_page_size = 25\ndefault_page_size = 10\nhistory_retention = \"cascade\""
        )
        .unwrap();

        let config = TicketConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_page_size, 25);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.history_retention, HistoryRetention::Cascade);
        assert_eq!(config.stream_max_limit, 50);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_page_size = 5\ndefault_page_size = 20").unwrap();

        let err = TicketConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file_fails() {
        let result = TicketConfig::load(Some(Path::new("/nonexistent/ticket.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
