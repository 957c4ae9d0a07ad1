//! Work API endpoints
//!
//! Maps to the `/works/` list route. Only public works are listed; the
//! default ordering is by title.

use super::pagination::{ListParams, Page};
use crate::client::CatalogClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Works API interface
#[derive(Clone)]
pub struct WorksApi {
    client: CatalogClient,
}

impl WorksApi {
    /// Create a new works API interface
    pub(crate) fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    /// List works with pagination
    ///
    /// GET /works/
    pub async fn list(&self, params: &ListParams) -> ApiResult<Page<WorkRecord>> {
        self.client.get("works/", &params.to_query()).await
    }
}

/// Work as returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    /// Primary key
    pub id: i64,
    /// Work title
    pub title: String,
    /// Composer, when attributed
    #[serde(default)]
    pub composer: Option<ComposerRef>,
    /// Opus or catalog number ("Op. 9", "BWV 998")
    #[serde(default)]
    pub catalog_number: Option<String>,
    /// Year of composition
    #[serde(default)]
    pub composition_year: Option<i32>,
    /// Instrument grouping
    #[serde(default)]
    pub instrumentation_category: Option<InstrumentationCategory>,
    /// Free-form instrumentation text
    #[serde(default)]
    pub instrumentation_detail: Option<String>,
    /// Approximate duration
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    /// Difficulty from 1 to 10
    #[serde(default)]
    pub difficulty_level: Option<i32>,
    /// Movement listing
    #[serde(default)]
    pub movements: Option<String>,
    /// Attached tags
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

impl WorkRecord {
    /// Minimal record, mostly useful for fixtures
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            composer: None,
            catalog_number: None,
            composition_year: None,
            instrumentation_category: None,
            instrumentation_detail: None,
            duration_minutes: None,
            difficulty_level: None,
            movements: None,
            tags: Vec::new(),
        }
    }

    /// Attach a composer reference
    #[must_use]
    pub fn with_composer(mut self, id: i64, full_name: impl Into<String>) -> Self {
        self.composer = Some(ComposerRef {
            id,
            full_name: full_name.into(),
        });
        self
    }

    /// Attach a catalog number
    #[must_use]
    pub fn with_catalog_number(mut self, catalog_number: impl Into<String>) -> Self {
        self.catalog_number = Some(catalog_number.into());
        self
    }

    /// Attach a free-form instrumentation description
    #[must_use]
    pub fn with_instrumentation(mut self, detail: impl Into<String>) -> Self {
        self.instrumentation_detail = Some(detail.into());
        self
    }

    /// Composer display name, if the work has one
    #[must_use]
    pub fn composer_name(&self) -> Option<&str> {
        self.composer.as_ref().map(|c| c.full_name.as_str())
    }

    /// The free-form instrumentation text, falling back to the category name
    #[must_use]
    pub fn instrumentation(&self) -> Option<&str> {
        self.instrumentation_detail
            .as_deref()
            .filter(|detail| !detail.trim().is_empty())
            .or_else(|| {
                self.instrumentation_category
                    .as_ref()
                    .map(|category| category.name.as_str())
            })
    }
}

/// Composer reference embedded in a work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerRef {
    /// Composer primary key
    pub id: i64,
    /// Composer display name
    pub full_name: String,
}

/// Instrument grouping (Solo Guitar, Duo, Ensemble, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationCategory {
    /// Category primary key
    pub id: i64,
    /// Category label, e.g. "Solo Guitar"
    pub name: String,
    /// Longer description, when set
    #[serde(default)]
    pub description: Option<String>,
    /// Position in category listings
    #[serde(default)]
    pub sort_order: i32,
}

/// Tag reference embedded in a work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// Tag primary key
    pub id: i64,
    /// Tag label
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_deserialize() {
        let json = r#"{
            "id": 10,
            "title": "Prelude BWV 998",
            "composer": {"id": 1, "full_name": "Johann Sebastian Bach"},
            "catalog_number": "BWV 998",
            "composition_year": 1735,
            "instrumentation_category": {"id": 1, "name": "Solo Guitar", "description": null, "sort_order": 0},
            "instrumentation_detail": "",
            "duration_minutes": 4,
            "difficulty_level": 6,
            "movements": null,
            "tags": [{"id": 3, "name": "baroque"}],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        }"#;

        let work: WorkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(work.composer_name(), Some("Johann Sebastian Bach"));
        assert_eq!(work.catalog_number.as_deref(), Some("BWV 998"));
        // Blank detail falls back to the category
        assert_eq!(work.instrumentation(), Some("Solo Guitar"));
        assert_eq!(work.tags.len(), 1);
    }

    #[test]
    fn test_work_without_composer() {
        let work: WorkRecord =
            serde_json::from_str(r#"{"id": 11, "title": "Romance", "composer": null}"#).unwrap();
        assert_eq!(work, WorkRecord::new(11, "Romance"));
        assert!(work.composer_name().is_none());
        assert!(work.instrumentation().is_none());
    }

    #[test]
    fn test_builders() {
        let work = WorkRecord::new(1, "Un Dia de Noviembre")
            .with_composer(5, "Leo Brouwer")
            .with_instrumentation("guitar solo");
        assert_eq!(work.composer_name(), Some("Leo Brouwer"));
        assert_eq!(work.instrumentation(), Some("guitar solo"));
    }
}
