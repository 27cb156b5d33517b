//! Configuration management for nacre
//!
//! This module handles loading, parsing, and managing configuration from
//! various sources:
//! - Configuration files (TOML format)
//! - Default values
//!
//! Configuration precedence (highest to lowest):
//! 1. Values set programmatically by the embedding shell
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, NacreError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Completion engine configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the default configuration file path (~/.nacrerc)
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nacrerc")
    }

    /// Load configuration from file
    ///
    /// # Arguments
    /// * `path` - Path to configuration file (None for default path)
    ///
    /// # Returns
    /// * `Result<Self>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| {
            NacreError::Config(ConfigError::Generic(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            )))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            NacreError::Config(ConfigError::InvalidFormat(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            )))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        Self::validate_range(
            self.completion.user_scan_budget_ms,
            10,
            10_000,
            "User scan budget",
        )?;
        Self::validate_range(
            self.completion.description_min_token_len,
            1,
            16,
            "Description lookup minimum token length",
        )?;

        if self.completion.autoload_path_var.is_empty() {
            return Err(NacreError::Config(ConfigError::Generic(
                "Autoload path variable name cannot be empty".to_string(),
            )));
        }

        Ok(())
    }

    /// Helper to validate numeric ranges
    fn validate_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<()>
    where
        T: PartialOrd + std::fmt::Display,
    {
        if value < min || value > max {
            return Err(NacreError::Config(ConfigError::OutOfRange(format!(
                "{} must be between {} and {}",
                field_name, min, max
            ))));
        }
        Ok(())
    }
}

/// Completion engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Name of the environment variable holding the autoload search path
    #[serde(default = "default_autoload_path_var")]
    pub autoload_path_var: String,

    /// Accept an option as valid when no authoritative schema can rule
    /// on it. The original engine always accepted in that case; turning
    /// this off makes option validation require a positive match.
    #[serde(default = "default_accept_unvalidated")]
    pub accept_unvalidated_options: bool,

    /// Wall-clock budget for scanning the password database, in
    /// milliseconds
    #[serde(default = "default_user_scan_budget_ms")]
    pub user_scan_budget_ms: u64,

    /// Minimum token length before command description lookup runs
    #[serde(default = "default_description_min_token_len")]
    pub description_min_token_len: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default)]
    pub level: LogLevel,

    /// Path to log file (None for stdout)
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
#[inline]
fn default_autoload_path_var() -> String {
    "NACRE_COMPLETE_PATH".to_string()
}

#[inline]
fn default_accept_unvalidated() -> bool {
    true
}

#[inline]
fn default_user_scan_budget_ms() -> u64 {
    200
}

#[inline]
fn default_description_min_token_len() -> usize {
    2
}

#[inline]
fn default_log_timestamps() -> bool {
    true
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            autoload_path_var: default_autoload_path_var(),
            accept_unvalidated_options: default_accept_unvalidated(),
            user_scan_budget_ms: default_user_scan_budget_ms(),
            description_min_token_len: default_description_min_token_len(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            file_path: None,
            timestamps: default_log_timestamps(),
        }
    }
}
