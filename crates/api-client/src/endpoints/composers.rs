//! Composer API endpoints
//!
//! Maps to the `/composers/` list route, which returns the lightweight
//! composer representation ordered by `last_name, first_name` by default.

use super::pagination::{ListParams, Page};
use crate::client::CatalogClient;
use crate::error::ApiResult;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Composers API interface
#[derive(Clone)]
pub struct ComposersApi {
    client: CatalogClient,
}

impl ComposersApi {
    /// Create a new composers API interface
    pub(crate) fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    /// List composers with pagination
    ///
    /// GET /composers/
    pub async fn list(&self, params: &ListParams) -> ApiResult<Page<ComposerRecord>> {
        self.client.get("composers/", &params.to_query()).await
    }
}

/// Composer as returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposerRecord {
    /// Primary key
    pub id: i64,
    /// Display name, first name first
    pub full_name: String,
    /// Year of birth
    #[serde(default)]
    pub birth_year: Option<i32>,
    /// Year of death
    #[serde(default)]
    pub death_year: Option<i32>,
    /// Whether the composer is alive
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_living: bool,
    /// Stylistic period
    #[serde(default)]
    pub period: Option<Period>,
    /// Country of origin
    #[serde(default)]
    pub country_name: Option<String>,
    /// Number of public works
    #[serde(default)]
    pub work_count: u32,
}

impl ComposerRecord {
    /// Minimal record, mostly useful for fixtures
    #[must_use]
    pub fn new(id: i64, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            birth_year: None,
            death_year: None,
            is_living: false,
            period: None,
            country_name: None,
            work_count: 0,
        }
    }

    /// Attach a country name
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country_name = Some(country.into());
        self
    }

    /// `"1685–1750"` style life span, when known
    #[must_use]
    pub fn life_span(&self) -> Option<String> {
        match (self.birth_year, self.death_year) {
            (Some(born), Some(died)) => Some(format!("{born}–{died}")),
            (Some(born), None) if self.is_living => Some(format!("b. {born}")),
            (Some(born), None) => Some(format!("{born}–?")),
            (None, Some(died)) => Some(format!("d. {died}")),
            (None, None) => None,
        }
    }
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Historical style period of a composer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Period {
    /// c. 1400 to 1600
    Renaissance,
    /// c. 1600 to 1750
    Baroque,
    /// c. 1750 to 1820
    Classical,
    /// c. 1820 to 1900
    Romantic,
    /// c. 1900 to 1945
    Modern,
    /// After 1945
    Contemporary,
    /// A label this client does not know about yet
    Other(String),
}

impl Period {
    /// Label as stored by the backend
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Renaissance => "Renaissance",
            Self::Baroque => "Baroque",
            Self::Classical => "Classical",
            Self::Romantic => "Romantic",
            Self::Modern => "Modern",
            Self::Contemporary => "Contemporary",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Period {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Renaissance" => Self::Renaissance,
            "Baroque" => Self::Baroque,
            "Classical" => Self::Classical,
            "Romantic" => Self::Romantic,
            "Modern" => Self::Modern,
            "Contemporary" => Self::Contemporary,
            _ => Self::Other(label),
        }
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        match period {
            Period::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
