//! Configuration management for the catalog tools
//!
//! Configuration is layered, highest precedence first:
//! 1. Command-line arguments
//! 2. Environment variables (`FLEXIMART_*`)
//! 3. Configuration file (TOML, `~/.fleximart/config.toml` by default)
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{
    DEFAULT_CATEGORY, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_MIN_AVERAGE_RATING,
    DEFAULT_PRICE_CEILING,
};
use crate::error::{ConfigError, Result};
use crate::utils::uri::sanitize_uri;
use crate::utils::validate;

/// Prefix of recognised environment variables
pub const ENV_PREFIX: &str = "FLEXIMART_";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Report parameter defaults
    #[serde(default)]
    pub reports: ReportConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection URI
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database holding the catalog
    #[serde(default = "default_database")]
    pub database: String,

    /// Products collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Connect and server-selection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Application name reported to the server
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Default parameters for the CLI reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Category for the affordable-products report
    #[serde(default = "default_category")]
    pub category: String,

    /// Exclusive price ceiling for the affordable-products report
    #[serde(default = "default_price_ceiling")]
    pub price_ceiling: f64,

    /// Minimum mean rating for the top-rated report
    #[serde(default = "default_min_average_rating")]
    pub min_average_rating: f64,

    /// Exclusive stock threshold for the low-stock report
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

/// Display and output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format (table, json, json-pretty)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Table columns wider than this are wrapped
    #[serde(default = "default_max_column_width")]
    pub max_column_width: usize,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// ASCII table, one row per record
    Table,

    /// Compact JSON array (single line)
    Json,

    /// Pretty-printed JSON array
    JsonPretty,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "fleximart".to_string()
}

fn default_collection() -> String {
    "products".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_app_name() -> String {
    "fleximart-catalog".to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_price_ceiling() -> f64 {
    DEFAULT_PRICE_CEILING
}

fn default_min_average_rating() -> f64 {
    DEFAULT_MIN_AVERAGE_RATING
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_max_column_width() -> usize {
    40
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            collection: default_collection(),
            timeout: default_timeout(),
            app_name: default_app_name(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            price_ceiling: default_price_ceiling(),
            min_average_rating: default_min_average_rating(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            max_column_width: default_max_column_width(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from file and environment
    ///
    /// An explicitly given file must exist; the default file is optional.
    /// The result is not validated, so later layers can still correct it.
    ///
    /// # Arguments
    /// * `path` - Explicit config file, or None for the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    /// Override fields from `FLEXIMART_*` variables
    ///
    /// Recognised: `URI`, `DATABASE`, `COLLECTION`, `TIMEOUT`, `FORMAT`,
    /// `LOG_LEVEL`. Other variables are ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match name {
                "URI" => self.connection.uri = value,
                "DATABASE" => self.connection.database = value,
                "COLLECTION" => self.connection.collection = value,
                "TIMEOUT" => {
                    self.connection.timeout = value
                        .parse()
                        .map_err(|_| invalid_value("connection.timeout", &value))?;
                }
                "FORMAT" => self.display.format = OutputFormat::parse(&value)?,
                "LOG_LEVEL" => self.logging.level = LogLevel::parse(&value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fleximart")
            .join("config.toml")
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render configuration as TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;

        let reports = &self.reports;
        if !reports.price_ceiling.is_finite() || reports.price_ceiling < 0.0 {
            return Err(invalid_value(
                "reports.price_ceiling",
                &reports.price_ceiling.to_string(),
            ));
        }
        if !reports.min_average_rating.is_finite() || reports.min_average_rating < 0.0 {
            return Err(invalid_value(
                "reports.min_average_rating",
                &reports.min_average_rating.to_string(),
            ));
        }
        if reports.low_stock_threshold < 0 {
            return Err(invalid_value(
                "reports.low_stock_threshold",
                &reports.low_stock_threshold.to_string(),
            ));
        }
        if self.display.max_column_width < 4 {
            return Err(invalid_value(
                "display.max_column_width",
                &self.display.max_column_width.to_string(),
            ));
        }
        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate URI, database and collection names
    pub fn validate(&self) -> Result<()> {
        if !validate::is_valid_connection_uri(&self.uri) {
            return Err(invalid_value("connection.uri", &sanitize_uri(&self.uri)));
        }
        if !validate::is_valid_database_name(&self.database) {
            return Err(invalid_value("connection.database", &self.database));
        }
        if !validate::is_valid_collection_name(&self.collection) {
            return Err(invalid_value("connection.collection", &self.collection));
        }
        if self.timeout == 0 {
            return Err(invalid_value("connection.timeout", "0"));
        }
        Ok(())
    }

    /// Connect and server-selection timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn invalid_value(field: &str, value: &str) -> crate::error::CatalogError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

impl LogLevel {
    /// Parse a level name, case-insensitive
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(invalid_value("logging.level", s)),
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

impl OutputFormat {
    /// Parse a format name (`table`, `json`, `json-pretty`)
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            _ => Err(invalid_value("display.format", s)),
        }
    }
}
