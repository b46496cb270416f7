//! Configuration management for the SafeSafar service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SafetyError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Token value shipped in sample configs; treated as "no token"
const PLACEHOLDER_TOKEN: &str = "YOUR_WAQI_API_TOKEN_HERE";

/// Root configuration structure for the SafeSafar service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SafetyConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Weather provider settings
    pub weather: WeatherConfig,
    /// Air quality provider settings
    pub air_quality: AirQualityConfig,
    /// Durable cache settings
    pub cache: CacheConfig,
    /// Route assessment settings
    pub route: RouteConfig,
    /// Logging and tracing settings
    pub logging: LoggingConfig,
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS; `*` allows any
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body size
    pub max_body_bytes: usize,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
    /// How long a snapshot stays fresh
    pub cache_ttl_seconds: u64,
}

/// Air quality API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQualityConfig {
    /// WAQI API token; without one air quality is reported as unavailable
    pub api_token: Option<String>,
    pub base_url: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
    pub cache_ttl_seconds: u64,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory location; defaults to the platform cache dir
    pub location: Option<PathBuf>,
    /// Upper bound on entries held by the in-memory air quality cache
    pub max_memory_entries: usize,
}

/// Route assessment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Waypoints scored in parallel
    pub max_concurrent_lookups: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint; spans are only exported when set
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5002
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "https://safe-safar-deploy.vercel.app".to_string(),
    ]
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_waqi_base_url() -> String {
    "https://api.waqi.info".to_string()
}

fn default_timeout() -> u32 {
    5
}

fn default_max_retries() -> u32 {
    1
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_max_concurrent_lookups() -> usize {
    4
}

fn default_max_memory_entries() -> usize {
    crate::cache::DEFAULT_MAX_ENTRIES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_waqi_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: None,
            max_memory_entries: default_max_memory_entries(),
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl ServerConfig {
    /// Address the listener binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl AirQualityConfig {
    /// The usable API token, if any. Empty and placeholder values count as absent.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty() && *token != PLACEHOLDER_TOKEN)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl SafetyConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
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

        // Environment overrides, e.g. SAFESAFAR_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("SAFESAFAR")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SafetyConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_legacy_env(
            std::env::var("WAQI_TOKEN").ok(),
            std::env::var("FRONTEND_URL").ok(),
        );

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("safesafar").join("config.toml"))
    }

    /// Honour the variables earlier deployments were configured with
    pub fn apply_legacy_env(&mut self, waqi_token: Option<String>, frontend_url: Option<String>) {
        if let Some(token) = waqi_token.filter(|t| !t.trim().is_empty()) {
            self.air_quality.api_token = Some(token);
        }
        if let Some(origin) = frontend_url.filter(|o| !o.trim().is_empty()) {
            let origin = origin.trim().trim_end_matches('/').to_string();
            if !self.server.allowed_origins.contains(&origin) {
                self.server.allowed_origins.push(origin);
            }
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
        if self.server.max_body_bytes == 0 {
            self.server.max_body_bytes = default_max_body_bytes();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.weather.cache_ttl_seconds == 0 {
            self.weather.cache_ttl_seconds = default_cache_ttl();
        }
        if self.air_quality.base_url.is_empty() {
            self.air_quality.base_url = default_waqi_base_url();
        }
        if self.air_quality.timeout_seconds == 0 {
            self.air_quality.timeout_seconds = default_timeout();
        }
        if self.air_quality.cache_ttl_seconds == 0 {
            self.air_quality.cache_ttl_seconds = default_cache_ttl();
        }
        if self.route.max_concurrent_lookups == 0 {
            self.route.max_concurrent_lookups = default_max_concurrent_lookups();
        }
        if self.cache.max_memory_entries == 0 {
            self.cache.max_memory_entries = default_max_memory_entries();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout, retries, ttl) in [
            (
                "Weather",
                self.weather.timeout_seconds,
                self.weather.max_retries,
                self.weather.cache_ttl_seconds,
            ),
            (
                "Air quality",
                self.air_quality.timeout_seconds,
                self.air_quality.max_retries,
                self.air_quality.cache_ttl_seconds,
            ),
        ] {
            if timeout > 300 {
                return Err(
                    SafetyError::config(format!("{name} API timeout cannot exceed 300 seconds"))
                        .into(),
                );
            }
            if retries > 10 {
                return Err(
                    SafetyError::config(format!("{name} API max retries cannot exceed 10")).into(),
                );
            }
            if ttl == 0 || ttl > 86_400 {
                return Err(SafetyError::config(format!(
                    "{name} cache TTL must be between 1 and 86400 seconds"
                ))
                .into());
            }
        }

        if !(1..=32).contains(&self.route.max_concurrent_lookups) {
            return Err(SafetyError::config(
                "Route max concurrent lookups must be between 1 and 32",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(SafetyError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SafetyError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Weather API base URL", Some(&self.weather.base_url)),
            ("Air quality API base URL", Some(&self.air_quality.base_url)),
            ("OTLP endpoint", self.logging.otlp_endpoint.as_ref()),
        ];
        for (name, url) in urls {
            if let Some(url) = url
                && !url.starts_with("http://")
                && !url.starts_with("https://")
            {
                return Err(SafetyError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.server.allowed_origins.is_empty() {
            return Err(SafetyError::config(
                "At least one allowed origin must be configured (use \"*\" to allow any)",
            )
            .into());
        }

        Ok(())
    }

    /// Directory holding the durable cache
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache.location {
            Some(location) => Ok(location.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join("safesafar"))
                .ok_or_else(|| SafetyError::config("Unable to determine cache directory").into()),
        }
    }
}
