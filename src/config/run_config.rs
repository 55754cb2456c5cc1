//! Run configuration loaded once at process start
//!
//! The configuration file is required: a missing or malformed file aborts the
//! run before any provider is contacted. Files ending in `.toml` are parsed as
//! TOML, everything else as JSON. Both formats use the same camelCase keys:
//!
//! ```json
//! {
//!   "threshold": 100,
//!   "cooldownMinutes": 60,
//!   "country": "it",
//!   "services": [
//!     { "slug": "whatsapp", "name": "WhatsApp", "url": "https://downdetector.it/status/whatsapp/" }
//!   ]
//! }
//! ```

use crate::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A monitored service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Provider identifier, unique within the configuration
    pub slug: String,
    /// Display name used in alert messages
    pub name: String,
    /// Link included in alert messages
    pub url: String,
}

impl ServiceConfig {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Settings for a single polling pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Report count above which an alert fires
    pub threshold: f64,
    /// Minimum spacing between alerts for the same service
    pub cooldown_minutes: f64,
    /// Provider region, the Downdetector domain suffix (`it`, `com`, `co.uk`)
    pub country: String,
    /// Services to poll, in order
    pub services: Vec<ServiceConfig>,
    /// Also push per-service failures through the notifier
    #[serde(default)]
    pub notify_errors: bool,
    /// Upper bound for each HTTP call
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl RunConfig {
    /// Create a configuration with default optional settings
    pub fn new(
        threshold: f64,
        cooldown_minutes: f64,
        country: impl Into<String>,
        services: Vec<ServiceConfig>,
    ) -> Self {
        Self {
            threshold,
            cooldown_minutes,
            country: country.into(),
            services,
            notify_errors: false,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }

    /// Load and validate the configuration file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file is missing or unreadable,
    /// a parse error if the document is malformed, and
    /// `ConfigError::ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let config = if is_toml {
            Self::from_toml_str(&contents)?
        } else {
            Self::from_json_str(&contents)?
        };

        debug!(
            "Loaded configuration from {} with {} services",
            path.display(),
            config.services.len()
        );
        Ok(config)
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_json::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML configuration document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and slug uniqueness
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }

        if !self.cooldown_minutes.is_finite() || self.cooldown_minutes < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "cooldownMinutes must be a non-negative number, got {}",
                self.cooldown_minutes
            )));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "requestTimeoutSeconds must be at least 1".to_string(),
            ));
        }

        if self.country.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "country must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.slug.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "service '{}' has an empty slug",
                    service.name
                )));
            }
            if !seen.insert(service.slug.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate service slug '{}'",
                    service.slug
                )));
            }
        }

        Ok(())
    }
}
