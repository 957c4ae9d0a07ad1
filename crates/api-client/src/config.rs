//! Configuration for the catalog API client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use catalog_core::config::ApiSection;
use catalog_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default API root for a local development server
const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development server
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Parse from environment variable
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("CATALOG_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "staging" | "stage" => Self::Staging,
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root of the REST API; endpoint paths are appended to it
    pub base_url: String,
    /// DRF token sent as `Authorization: Token <key>` when present
    pub api_token: Option<String>,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `CATALOG_API_URL`: Root of the REST API
    /// - `CATALOG_API_TOKEN`: Token for authenticated deployments
    /// - `CATALOG_ENV`: Environment (development/staging/production)
    /// - `CATALOG_TIMEOUT_SECS`: Request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();

        let base_url = env::var("CATALOG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_token = env::var("CATALOG_API_TOKEN").ok().filter(|t| !t.is_empty());

        let timeout = env::var("CATALOG_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(Duration::from_secs(30), Duration::from_secs);

        // Adjust retry config based on environment
        let retry = match environment {
            Environment::Development => RetryConfig::quick(),
            Environment::Staging => RetryConfig::default(),
            Environment::Production => RetryConfig::patient(),
        };

        let config = Self {
            base_url,
            api_token,
            timeout,
            retry,
            environment,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build from the `[api]` section of the TOML configuration.
    ///
    /// Environment variables still win over file values for the URL and token.
    #[must_use]
    pub fn from_section(section: &ApiSection) -> Self {
        let environment = Environment::from_env();
        let base_url = env::var("CATALOG_API_URL").unwrap_or_else(|_| section.base_url.clone());

        Self {
            base_url,
            api_token: env::var("CATALOG_API_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(section.timeout_secs),
            retry: RetryConfig::default(),
            environment,
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the API token
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(format!(
                "{} (must start with http:// or https://)",
                self.base_url
            )));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.base_url.contains("localhost"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_base_url("https://catalog.example.org/api")
            .with_api_token("secret")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "https://catalog.example.org/api");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(matches!(
            ClientConfig::default().with_base_url("ftp://x").validate(),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(
            ClientConfig::default()
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_from_section_uses_timeout() {
        let section = ApiSection {
            timeout_secs: 5,
            ..ApiSection::default()
        };
        let config = ClientConfig::from_section(&section);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
