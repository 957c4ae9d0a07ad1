//! Page-number pagination shared by every list endpoint
//!
//! List routes answer `?page=N&page_size=S&ordering=a,b` with an envelope of
//! the form `{ "count", "next", "previous", "results" }`.

use serde::{Deserialize, Serialize};

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of records matching the request
    #[serde(default)]
    pub count: u64,
    /// URL of the following page, absent on the last page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the preceding page
    #[serde(default)]
    pub previous: Option<String>,
    /// Records on this page
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether the backend reports another page after this one
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|next| !next.is_empty())
    }

    /// A terminal page holding `results`
    #[must_use]
    pub fn last(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }
}

/// Parameters for list requests
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    /// 1-based page number
    pub page: Option<u32>,
    /// Records per page (the backend caps this at 20 000)
    pub page_size: Option<u32>,
    /// Sort keys, most significant first; `-` prefix for descending
    pub ordering: Vec<String>,
    /// Backend-side search filter
    pub search: Option<String>,
}

impl ListParams {
    /// Create new params with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a page
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the sort keys
    #[must_use]
    pub fn with_ordering<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ordering = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Filter on the backend
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Render as query pairs; values are URL-encoded by the HTTP layer
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size", page_size.to_string()));
        }
        if !self.ordering.is_empty() {
            query.push(("ordering", self.ordering.join(",")));
        }
        if let Some(ref search) = self.search {
            query.push(("search", search.clone()));
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_query() {
        let params = ListParams::new()
            .with_page(2)
            .with_page_size(20_000)
            .with_ordering(["last_name", "first_name"]);

        assert_eq!(
            params.to_query(),
            vec![
                ("page", "2".to_string()),
                ("page_size", "20000".to_string()),
                ("ordering", "last_name,first_name".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_params_produce_no_query() {
        assert!(ListParams::new().to_query().is_empty());
    }

    #[test]
    fn test_page_deserialize() {
        let json = r#"{
            "count": 3,
            "next": "http://localhost:8000/api/works/?page=2",
            "previous": null,
            "results": [1, 2]
        }"#;

        let page: Page<u32> = serde_json::from_str(json).unwrap();
        assert!(page.has_next());
        assert_eq!(page.results, vec![1, 2]);
    }

    #[test]
    fn test_page_without_results_is_terminal() {
        let page: Page<u32> = serde_json::from_str(r#"{"count": 0, "next": null}"#).unwrap();
        assert!(!page.has_next());
        assert!(page.results.is_empty());
    }
}
