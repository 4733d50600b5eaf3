//! Configuration management for the `SmokeWatch` service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::aqi::AqiBreakpoints;
use crate::{Result, SmokeWatchError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "SMOKE_WATCH_CONFIG_FILE";

/// Root configuration structure for the `SmokeWatch` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmokeWatchConfig {
    /// Upstream API credentials and client settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Which pollution source to query and how to read it
    #[serde(default)]
    pub pollution: PollutionConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// OpenWeatherMap key, used for geocoding and air pollution
    pub openweathermap_key: Option<String>,
    #[serde(default = "default_openweathermap_base_url")]
    pub openweathermap_base_url: String,
    /// WAQI token, only needed when `pollution.source = "waqi"`
    pub waqi_token: Option<String>,
    #[serde(default = "default_waqi_base_url")]
    pub waqi_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures; 0 means a single attempt
    #[serde(default)]
    pub max_retries: u32,
}

/// Pollution data source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollutionSource {
    #[default]
    OpenWeatherMap,
    Waqi,
}

/// Pollution source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollutionConfig {
    #[serde(default)]
    pub source: PollutionSource,
    /// Breakpoints for sources reporting a continuous index
    #[serde(default)]
    pub breakpoints: AqiBreakpoints,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Freshness window for geocoding results, in minutes
    #[serde(default = "default_geocode_ttl")]
    pub geocode_ttl_minutes: u32,
    /// Freshness window for pollution samples, in minutes
    #[serde(default = "default_pollution_ttl")]
    pub pollution_ttl_minutes: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory with a built frontend to serve, if any
    pub static_dir: Option<String>,
}

// Default value functions
fn default_openweathermap_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_waqi_base_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_api_timeout() -> u32 {
    30
}

fn default_cache_enabled() -> bool {
    true
}

fn default_geocode_ttl() -> u32 {
    60
}

fn default_pollution_ttl() -> u32 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            openweathermap_key: None,
            openweathermap_base_url: default_openweathermap_base_url(),
            waqi_token: None,
            waqi_base_url: default_waqi_base_url(),
            timeout_seconds: default_api_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            geocode_ttl_minutes: default_geocode_ttl(),
            pollution_ttl_minutes: default_pollution_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: None,
        }
    }
}

impl SmokeWatchConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load_from_path(config_path)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. SMOKEWATCH_API__OPENWEATHERMAP_KEY
        builder = builder.add_source(
            Environment::with_prefix("SMOKEWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build().map_err(|e| {
            SmokeWatchError::config(format!("Failed to build configuration: {e}"))
        })?;

        let mut config: SmokeWatchConfig = settings.try_deserialize().map_err(|e| {
            SmokeWatchError::config(format!("Failed to deserialize configuration: {e}"))
        })?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("smoke-watch").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.api.openweathermap_base_url.is_empty() {
            self.api.openweathermap_base_url = default_openweathermap_base_url();
        }
        if self.api.waqi_base_url.is_empty() {
            self.api.waqi_base_url = default_waqi_base_url();
        }
        if self.api.timeout_seconds == 0 {
            self.api.timeout_seconds = default_api_timeout();
        }
        if self.cache.geocode_ttl_minutes == 0 {
            self.cache.geocode_ttl_minutes = default_geocode_ttl();
        }
        if self.cache.pollution_ttl_minutes == 0 {
            self.cache.pollution_ttl_minutes = default_pollution_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // Geocoding always goes through OpenWeatherMap
        validate_key("OpenWeatherMap API key", self.api.openweathermap_key.as_deref())?;

        if self.pollution.source == PollutionSource::Waqi {
            validate_key("WAQI token", self.api.waqi_token.as_deref())?;
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.api.timeout_seconds > 300 {
            return Err(SmokeWatchError::config(
                "API timeout cannot exceed 300 seconds",
            ));
        }

        if self.api.max_retries > 10 {
            return Err(SmokeWatchError::config("API max retries cannot exceed 10"));
        }

        if self.cache.geocode_ttl_minutes > 24 * 60 || self.cache.pollution_ttl_minutes > 24 * 60 {
            return Err(SmokeWatchError::config(
                "Cache TTL cannot exceed 1440 minutes (1 day)",
            ));
        }

        if !self.pollution.breakpoints.is_ascending() {
            return Err(SmokeWatchError::config(
                "AQI breakpoints must be strictly increasing",
            ));
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SmokeWatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SmokeWatchError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        for (name, url) in [
            ("OpenWeatherMap", &self.api.openweathermap_base_url),
            ("WAQI", &self.api.waqi_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SmokeWatchError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                )));
            }
        }

        Ok(())
    }
}

fn validate_key(name: &str, key: Option<&str>) -> Result<()> {
    let Some(key) = key else {
        return Err(SmokeWatchError::config(format!(
            "{name} is required. Set it in the config file or the environment."
        )));
    };

    if key.is_empty() {
        return Err(SmokeWatchError::config(format!("{name} cannot be empty")));
    }

    if key.len() < 8 {
        return Err(SmokeWatchError::config(format!(
            "{name} appears to be invalid (too short). Please check your key."
        )));
    }

    if key.len() > 100 {
        return Err(SmokeWatchError::config(format!(
            "{name} appears to be invalid (too long). Please check your key."
        )));
    }

    Ok(())
}
