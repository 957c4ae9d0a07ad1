//! Error types for the search crate.

use crate::entity::EntityKind;
use catalog_api_client::ApiError;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
///
/// "Corpus still loading" and "nothing matched" are outcomes, not errors;
/// see [`crate::SearchOutcome`].
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The bulk corpus fetch could not complete
    #[error("failed to load {kind} corpus: {source}")]
    LoadFailure {
        /// Entity type whose load failed
        kind: EntityKind,
        /// Underlying client error, shared with every waiter on the load
        #[source]
        source: Arc<ApiError>,
    },

    /// The backend kept reporting further pages past the safety cap
    #[error("{kind} corpus still had more pages after {pages} requests")]
    RunawayPagination {
        /// Entity type being loaded
        kind: EntityKind,
        /// Pages fetched before giving up
        pages: u32,
    },

    /// Query was blank after trimming
    #[error("search query is empty")]
    EmptyQuery,

    /// At least one side of a combined search failed
    #[error("combined search failed: {}", combined_reason(.composers, .works))]
    CombinedFailure {
        /// Composer-side failure, if any
        composers: Option<Box<SearchError>>,
        /// Work-side failure, if any
        works: Option<Box<SearchError>>,
    },
}

fn combined_reason(composers: &Option<Box<SearchError>>, works: &Option<Box<SearchError>>) -> String {
    match (composers.as_deref(), works.as_deref()) {
        (Some(c), Some(w)) => format!("composers: {c}; works: {w}"),
        (Some(c), None) => format!("composers: {c}"),
        (None, Some(w)) => format!("works: {w}"),
        (None, None) => "unknown failure".to_string(),
    }
}

impl SearchError {
    /// Wrap a client failure for one entity type
    #[must_use]
    pub fn load_failure(kind: EntityKind, source: ApiError) -> Self {
        Self::LoadFailure {
            kind,
            source: Arc::new(source),
        }
    }

    /// Whether repeating the same operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::LoadFailure { source, .. } => !source.is_client_error(),
            Self::RunawayPagination { .. } | Self::EmptyQuery => false,
            Self::CombinedFailure { composers, works } => composers
                .iter()
                .chain(works.iter())
                .any(|e| e.is_retryable()),
        }
    }

    /// Entity types whose loads are implicated in this error
    #[must_use]
    pub fn failed_kinds(&self) -> Vec<EntityKind> {
        match self {
            Self::LoadFailure { kind, .. } | Self::RunawayPagination { kind, .. } => vec![*kind],
            Self::EmptyQuery => Vec::new(),
            Self::CombinedFailure { composers, works } => composers
                .iter()
                .chain(works.iter())
                .flat_map(|e| e.failed_kinds())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_is_retryable() {
        let err = SearchError::load_failure(
            EntityKind::Composer,
            ApiError::api_response(503, "unavailable"),
        );
        assert!(err.is_retryable());
        assert!(err.to_string().contains("composer corpus"));
    }

    #[test]
    fn test_combined_failure_message_names_sides() {
        let err = SearchError::CombinedFailure {
            composers: None,
            works: Some(Box::new(SearchError::load_failure(
                EntityKind::Work,
                ApiError::CircuitOpen,
            ))),
        };
        let message = err.to_string();
        assert!(message.starts_with("combined search failed: works:"));
        assert_eq!(err.failed_kinds(), vec![EntityKind::Work]);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_empty_query_not_retryable() {
        assert!(!SearchError::EmptyQuery.is_retryable());
    }
}
