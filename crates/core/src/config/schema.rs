//! Configuration schema definitions

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Backend connection and bulk-load settings
    #[serde(default)]
    pub api: ApiSection,

    /// Fuzzy matching settings
    #[serde(default)]
    pub search: SearchSection,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ConfigSchema {
    /// Validate values that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::config_invalid("api.base_url cannot be empty"));
        }
        if self.api.page_size == 0 {
            return Err(Error::config_invalid("api.page_size must be greater than zero"));
        }
        if self.api.max_pages == 0 {
            return Err(Error::config_invalid("api.max_pages must be greater than zero"));
        }
        if self.search.limit == Some(0) {
            return Err(Error::config_invalid("search.limit must be greater than zero when set"));
        }
        if !(0.0..=1.0).contains(&self.search.threshold) {
            return Err(Error::config_invalid(format!(
                "search.threshold must be within [0, 1], got {}",
                self.search.threshold
            )));
        }
        Ok(())
    }
}

/// Catalog API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Root of the REST API, e.g. `http://localhost:8000/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size requested when loading a whole corpus
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on pages fetched for one corpus
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    20_000
}

fn default_max_pages() -> u32 {
    1_000
}

/// Fuzzy search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    /// Highest normalized score still accepted as a fuzzy match
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Queries shorter than this never reach the fuzzy pass
    #[serde(default = "default_min_match_char_length")]
    pub min_match_char_length: usize,

    /// Accept fuzzy matches anywhere in a field
    #[serde(default = "default_true")]
    pub ignore_location: bool,

    /// How far from the field start a match may end when location matters
    #[serde(default = "default_distance")]
    pub distance: usize,

    /// Maximum results returned per entity type (unlimited when unset)
    #[serde(default)]
    pub limit: Option<usize>,

    /// Delay before the speculative corpus preload
    #[serde(default = "default_preload_delay_ms")]
    pub preload_delay_ms: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_match_char_length: default_min_match_char_length(),
            ignore_location: true,
            distance: default_distance(),
            limit: None,
            preload_delay_ms: default_preload_delay_ms(),
        }
    }
}

fn default_threshold() -> f64 {
    0.35
}

fn default_min_match_char_length() -> usize {
    2
}

fn default_distance() -> usize {
    100
}

fn default_preload_delay_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}
