//! Structured logging setup
//!
//! Generation emits `tracing` events under a `generate_scenario` span. This
//! module installs a subscriber for them; libraries embedding the generator
//! may install their own instead.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable overriding the configured filter
pub const LOG_ENV_VAR: &str = "SCENARIO_LOG";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            color: default_true(),
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Set base level
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set level for one module
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.modules.insert(module.into(), level.into());
        self
    }

    /// Build the event filter; `SCENARIO_LOG` wins over configuration
    ///
    /// # Errors
    ///
    /// Returns error if the level or a module directive does not parse.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
            return Ok(filter);
        }

        // A bare word parses as a target directive, so check the level first.
        LevelFilter::from_str(&self.level)
            .map_err(|e| ConfigError::Logging(format!("invalid log level '{}': {e}", self.level)))?;
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| ConfigError::Logging(format!("invalid log level '{}': {e}", self.level)))?;
        for (module, level) in &self.modules {
            LevelFilter::from_str(level)
                .map_err(|e| ConfigError::Logging(format!("invalid log level for {module}: {e}")))?;
            let directive = format!("{module}={level}")
                .parse()
                .map_err(|e| ConfigError::Logging(format!("invalid log directive {module}={level}: {e}")))?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

/// Install a global subscriber for `config`
///
/// Calling this again once a subscriber is installed is a no-op.
///
/// # Errors
///
/// Returns error if the filter configuration is invalid.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = config.env_filter()?;
    let subscriber = Registry::default().with(filter);

    let installed = match config.format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(config.color)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("global subscriber already installed, keeping it");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.color);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: LoggingConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn rejects_bad_module_directive() {
        let config = LoggingConfig::default().with_module("scenario_core", "loud");
        if std::env::var(LOG_ENV_VAR).is_err() {
            assert!(matches!(config.env_filter(), Err(ConfigError::Logging(_))));
        }
    }

    #[test]
    fn rejects_unknown_base_level() {
        let config = LoggingConfig::default().with_level("loud");
        if std::env::var(LOG_ENV_VAR).is_err() {
            let err = config.env_filter().unwrap_err();
            assert!(matches!(err, ConfigError::Logging(ref msg) if msg.contains("'loud'")));
        }
    }

    #[test]
    fn accepts_known_levels() {
        if std::env::var(LOG_ENV_VAR).is_err() {
            for level in ["trace", "debug", "info", "warn", "error", "off", "INFO"] {
                assert!(LoggingConfig::default().with_level(level).env_filter().is_ok(), "{level}");
            }
        }
    }

    #[test]
    fn init_is_idempotent() {
        let config = LoggingConfig::default().with_level("debug").with_module("scenario_core", "trace");
        init_logging(&config).unwrap();
        init_logging(&config.with_format(LogFormat::Json)).unwrap();
    }
}
