//! Application configuration module
//!
//! Provides the base configuration types for the client. The richer
//! runtime policy (base-URL resolution, emulator rewriting, timeouts)
//! lives in [`crate::client::config`]; this module holds the raw,
//! serializable settings and their builder.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Platform the client is running on, used by the base-URL policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android device or emulator
    Android,
    /// iOS device or simulator
    Ios,
    /// Desktop or unknown host
    #[default]
    Other,
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Production server URL, when configured
    pub production_url: Option<String>,
    /// Development server URL override
    pub dev_url: Option<String>,
    /// Platform hint for loopback rewriting
    #[serde(default)]
    pub platform: Platform,
    /// Whether this build targets production
    #[serde(default)]
    pub is_production: bool,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from a TOML file.
    pub fn from_toml(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for url in [&self.production_url, &self.dev_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.is_production && self.production_url.is_none() {
            return Err(ConfigError::MissingValue("production_url"));
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    production_url: Option<String>,
    dev_url: Option<String>,
    platform: Platform,
    is_production: bool,
}

impl AppConfigBuilder {
    /// Set the production server URL
    pub fn production_url(mut self, url: impl Into<String>) -> Self {
        self.production_url = Some(url.into());
        self
    }

    /// Set the development server URL
    pub fn dev_url(mut self, url: impl Into<String>) -> Self {
        self.dev_url = Some(url.into());
        self
    }

    /// Set the platform hint
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Mark this build as targeting production
    pub fn is_production(mut self, is_production: bool) -> Self {
        self.is_production = is_production;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            production_url: self.production_url,
            dev_url: self.dev_url,
            platform: self.platform,
            is_production: self.is_production,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
}
