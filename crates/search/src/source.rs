//! The paginated list-fetch seam the corpus loader pulls from.

use crate::entity::{EntityKind, Searchable};
use async_trait::async_trait;
use catalog_api_client::{
    ApiError, ComposerRecord, ComposersApi, ListParams, Page, WorkRecord, WorksApi,
};

/// One list request issued by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Records per page
    pub page_size: u32,
    /// Sort keys, most significant first
    pub ordering: Vec<String>,
}

impl PageRequest {
    /// First page of a bulk load for `kind`
    #[must_use]
    pub fn first(kind: EntityKind, page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            ordering: kind.default_ordering().iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// The same request for the following page
    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// Query parameters for the REST client
    #[must_use]
    pub fn to_params(&self) -> ListParams {
        ListParams::new()
            .with_page(self.page)
            .with_page_size(self.page_size)
            .with_ordering(self.ordering.iter().cloned())
    }
}

/// Anything that can serve pages of `T`
#[async_trait]
pub trait PageSource<T: Searchable>: Send + Sync {
    /// Fetch one page
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ApiError>;
}

#[async_trait]
impl PageSource<ComposerRecord> for ComposersApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<ComposerRecord>, ApiError> {
        self.list(&request.to_params()).await
    }
}

#[async_trait]
impl PageSource<WorkRecord> for WorksApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<WorkRecord>, ApiError> {
        self.list(&request.to_params()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_uses_kind_ordering() {
        let request = PageRequest::first(EntityKind::Composer, 20_000);
        assert_eq!(request.page, 1);
        assert_eq!(request.ordering, vec!["last_name", "first_name"]);

        let query = request.next().to_params().to_query();
        assert!(query.contains(&("page", "2".to_string())));
        assert!(query.contains(&("ordering", "last_name,first_name".to_string())));
    }
}
