//! Client-side search over the guitar catalog.
//!
//! Whole corpora of composers and works are bulk-loaded once through a
//! [`PageSource`] and searched in memory:
//!
//! - **Corpus cache**: `Empty → Loading → Ready`, one in-flight load per entity type
//! - **Fast path**: case-insensitive substring match on the primary field
//! - **Fuzzy fallback**: weighted-field edit-distance index, only when the fast path finds nothing
//! - **Filters**: period, country, instrumentation and year constraints applied before ranking
//! - **Combined search**: composer and work lists side by side, stale answers dropped
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_api_client::CatalogClient;
//! use catalog_search::{CatalogSearch, SearchOutcome, SearchSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new()?;
//!     let search = CatalogSearch::new(&client, SearchSettings::default());
//!
//!     match search.search_composers_ready("vila-lobos").await? {
//!         SearchOutcome::Matches(results) => {
//!             for result in results {
//!                 println!("{} ({:.3})", result.item.full_name, result.score);
//!             }
//!         }
//!         SearchOutcome::NoMatches => println!("no matches"),
//!         SearchOutcome::NotReady => unreachable!("ready search waits for the corpus"),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod corpus;
pub mod entity;
pub mod error;
pub mod filter;
pub mod fuzzy;
pub mod index;
pub mod merger;
pub mod resolver;
pub mod service;
pub mod source;
pub mod summary;

#[cfg(test)]
mod testing;

pub use corpus::{Corpus, CorpusCache, CorpusState, LoaderConfig, load_corpus};
pub use entity::{EntityKind, Searchable, WeightedKey};
pub use error::{Result, SearchError};
pub use filter::{AcceptAll, ComposerFilter, RecordFilter, WorkFilter};
pub use index::{EditDistanceScorer, IndexCache, IndexOptions, MatchIndex, ScoringStrategy, WholeFieldScorer};
pub use merger::{CombinedResults, CombinedSearch, CombinedState, Delivery, RequestToken};
pub use resolver::{MatchPath, QueryResolver, SearchOutcome, SearchResult};
pub use service::{CatalogSearch, EntitySearch, SearchSettings};
pub use source::{PageRequest, PageSource};
pub use summary::CatalogSummary;
