//! Dialect configuration.
//!
//! The settings that vary between deployments of the protocol: query
//! argument separator, which arguments use the quoted complex form, the
//! service-method sentinel and the primary-key column name. Loadable from
//! TOML:
//!
//! ```toml
//! query_separator = "&"
//! complex_args = ["where", "search"]
//! service_sentinel = "$service"
//! key_column = "Id"
//! ```

use crate::codec::{QueryCodec, DEFAULT_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors raised while loading a [`DialectConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Structurally valid but unusable setting
    #[error("invalid dialect setting '{field}': {message}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

static SHARED: LazyLock<DialectConfig> = LazyLock::new(DialectConfig::default);

/// URI dialect settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DialectConfig {
    /// Separator between query arguments
    pub query_separator: char,
    /// Arguments whose values may be written as `name="..."`
    pub complex_args: Vec<String>,
    /// Segment text that introduces a service-method suffix
    pub service_sentinel: String,
    /// Column folded into the path predicate on key equality
    pub key_column: String,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            query_separator: DEFAULT_SEPARATOR,
            complex_args: vec!["where".to_string(), "search".to_string()],
            service_sentinel: "$service".to_string(),
            key_column: "Id".to_string(),
        }
    }
}

impl DialectConfig {
    /// Process-wide default dialect, built once on first use
    pub fn shared() -> &'static DialectConfig {
        &SHARED
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if matches!(self.query_separator, '=' | '"' | '?' | '#' | '/') {
            return Err(ConfigError::Invalid {
                field: "query_separator",
                message: format!("'{}' is reserved by the URI dialect", self.query_separator),
            });
        }
        if self.service_sentinel.is_empty() || self.service_sentinel.contains('/') {
            return Err(ConfigError::Invalid {
                field: "service_sentinel",
                message: "must be a single non-empty segment".to_string(),
            });
        }
        if self.key_column.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "key_column",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Query codec for this dialect
    pub fn query_codec(&self) -> QueryCodec {
        QueryCodec::new(self.query_separator).with_complex_args(self.complex_args.iter().cloned())
    }
}
