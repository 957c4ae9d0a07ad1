//! "Search everything": composer and work searches combined.
//!
//! Each call takes a [`RequestToken`] from a monotonically increasing
//! counter. When both sides finish, the result is only accepted if no newer
//! token has been issued in the meantime; otherwise it is dropped.

use crate::error::{Result, SearchError};
use crate::resolver::SearchResult;
use crate::service::CatalogSearch;
use catalog_api_client::{ComposerRecord, WorkRecord};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, instrument};

/// Identifies one combined search; later requests have larger tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Composer and work results for one query, kept as separate lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedResults {
    pub token: RequestToken,
    pub query: String,
    pub composers: Vec<SearchResult<ComposerRecord>>,
    pub works: Vec<SearchResult<WorkRecord>>,
}

impl CombinedResults {
    /// Neither list has anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.composers.is_empty() && self.works.is_empty()
    }
}

/// Outcome of delivering a finished combined search
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery<T> {
    /// The result belongs to the newest request
    Accepted(T),
    /// A newer request was issued first; the result was dropped
    Superseded { token: RequestToken },
}

impl<T> Delivery<T> {
    #[must_use]
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Superseded { .. } => None,
        }
    }
}

/// Latest accepted state, as seen by subscribers
#[derive(Debug, Clone, Default)]
pub enum CombinedState {
    /// Nothing accepted yet
    #[default]
    Idle,
    Ready(Arc<CombinedResults>),
    Failed { token: RequestToken, error: SearchError },
}

impl CombinedState {
    /// Token the state belongs to; `None` while idle
    #[must_use]
    pub fn token(&self) -> Option<RequestToken> {
        match self {
            Self::Idle => None,
            Self::Ready(results) => Some(results.token),
            Self::Failed { token, .. } => Some(*token),
        }
    }
}

/// Runs combined searches and keeps only the freshest answer
pub struct CombinedSearch {
    search: Arc<CatalogSearch>,
    latest: AtomicU64,
    state: watch::Sender<CombinedState>,
}

impl CombinedSearch {
    pub fn new(search: Arc<CatalogSearch>) -> Self {
        let (state, _) = watch::channel(CombinedState::Idle);
        Self {
            search,
            latest: AtomicU64::new(0),
            state,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogSearch> {
        &self.search
    }

    /// Take the next token, superseding every earlier one
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` is still the newest issued
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Observe accepted results and failures
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CombinedState> {
        self.state.subscribe()
    }

    /// Most recently accepted state
    #[must_use]
    pub fn current(&self) -> CombinedState {
        self.state.borrow().clone()
    }

    /// Search composers and works concurrently for `query`.
    ///
    /// Waits for both corpora if needed. Fails as a whole if either side
    /// fails; a result that lost the race to a newer call comes back as
    /// [`Delivery::Superseded`] instead.
    #[instrument(skip(self))]
    pub async fn search_all(&self, query: &str) -> Result<Delivery<Arc<CombinedResults>>> {
        let token = self.issue();
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let (composers, works) = tokio::join!(
            self.search.search_composers_ready(query),
            self.search.search_works_ready(query),
        );

        let result = match (composers, works) {
            (Ok(composers), Ok(works)) => Ok(CombinedResults {
                token,
                query: query.to_string(),
                composers: composers.into_results(),
                works: works.into_results(),
            }),
            (composers, works) => Err(SearchError::CombinedFailure {
                composers: composers.err().map(Box::new),
                works: works.err().map(Box::new),
            }),
        };

        self.deliver(token, result)
    }

    /// Accept or drop a finished result for `token`
    pub fn deliver(
        &self,
        token: RequestToken,
        result: Result<CombinedResults>,
    ) -> Result<Delivery<Arc<CombinedResults>>> {
        if !self.is_current(token) {
            debug!(%token, latest = self.latest.load(Ordering::SeqCst), "Discarding stale combined result");
            return Ok(Delivery::Superseded { token });
        }

        match result {
            Ok(results) => {
                let results = Arc::new(results);
                self.publish(token, CombinedState::Ready(Arc::clone(&results)));
                Ok(Delivery::Accepted(results))
            }
            Err(error) => {
                self.publish(
                    token,
                    CombinedState::Failed {
                        token,
                        error: error.clone(),
                    },
                );
                Err(error)
            }
        }
    }

    fn publish(&self, token: RequestToken, next: CombinedState) {
        self.state.send_if_modified(|state| {
            if state.token().is_some_and(|current| current >= token) {
                return false;
            }
            *state = next;
            true
        });
    }
}
