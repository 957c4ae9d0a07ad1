//! Client for the guitar catalog REST API
//!
//! This crate is the bulk list-fetch collaborator used by the search core. It
//! speaks to the page-number paginated `/composers/` and `/works/` endpoints
//! and decodes their list representations into typed records.
//!
//! # Features
//!
//! - **Environment-based configuration**: Load the API root and token from environment variables
//! - **Retry with exponential backoff**: Automatic retry for transient failures
//! - **Circuit breaker**: Stop hammering a backend that is down
//! - **Request correlation**: Track requests with unique IDs for debugging
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_api_client::{CatalogClient, ListParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new()?;
//!
//!     let page = client
//!         .composers()
//!         .list(&ListParams::new().with_page(1).with_page_size(200))
//!         .await?;
//!     println!("{} composers in total", page.count);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;

pub use client::CatalogClient;
pub use config::{ClientConfig, Environment};
pub use endpoints::{
    ComposerRecord, ComposerRef, ComposersApi, InstrumentationCategory, ListParams, Page, Period,
    TagRef, WorkRecord, WorksApi,
};
pub use error::{ApiError, ApiResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::CatalogClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{ComposersApi, ListParams, Page, WorksApi};
    pub use crate::error::{ApiError, ApiResult};
}
