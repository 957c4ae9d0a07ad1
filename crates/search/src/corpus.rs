//! Corpus loading and the per-entity corpus cache.
//!
//! A [`CorpusCache`] moves through `Empty → Loading → Ready`. Exactly one
//! load runs at a time; every caller that asks while it is in flight awaits
//! the same shared future. A failed load puts the cache back to `Empty` so
//! the next call retries from page one.

use crate::entity::{EntityKind, Searchable};
use crate::error::{Result, SearchError};
use crate::source::{PageRequest, PageSource};
use catalog_telemetry::{Timer, metrics};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Default records per page; the backend's `max_page_size`
pub const DEFAULT_PAGE_SIZE: u32 = 20_000;

/// Default cap on pages fetched for one corpus
pub const DEFAULT_MAX_PAGES: u32 = 1_000;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Bulk-load parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Records requested per page
    pub page_size: u32,
    /// Pages fetched before the load is declared runaway
    pub max_pages: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Complete in-memory snapshot of one entity type, in backend order
#[derive(Debug)]
pub struct Corpus<T> {
    records: Vec<T>,
    primary_lower: Vec<String>,
    pages: u32,
    load_time: Duration,
    generation: u64,
}

impl<T: Searchable> Corpus<T> {
    /// Wrap loaded records
    #[must_use]
    pub fn new(records: Vec<T>, pages: u32, load_time: Duration) -> Self {
        let primary_lower = records.iter().map(|r| r.primary_text().to_lowercase()).collect();
        Self {
            records,
            primary_lower,
            pages,
            load_time,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Entity type of the records
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    /// Records in backend order
    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pages the load took
    #[must_use]
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Wall time of the load
    #[must_use]
    pub fn load_time(&self) -> Duration {
        self.load_time
    }

    /// Identity of this snapshot; distinct for every constructed corpus
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Lowercased primary fields, parallel to [`Corpus::records`]
    pub(crate) fn primary_lower(&self) -> &[String] {
        &self.primary_lower
    }
}

/// Fetch every page of `T` sequentially and concatenate them.
///
/// Pages already fetched are discarded if a later page fails.
#[instrument(skip(source, config), fields(kind = %T::KIND, page_size = config.page_size))]
pub async fn load_corpus<T: Searchable>(
    source: &dyn PageSource<T>,
    config: &LoaderConfig,
) -> Result<Corpus<T>> {
    let timer = Timer::start(format!("corpus.load.{}", T::KIND));
    let mut request = PageRequest::first(T::KIND, config.page_size);
    let mut records = Vec::new();
    let mut pages = 0;

    loop {
        let page = source
            .fetch_page(&request)
            .await
            .map_err(|e| SearchError::load_failure(T::KIND, e))?;
        pages += 1;

        let more = page.has_next() && !page.results.is_empty();
        debug!(page = request.page, records = page.results.len(), total = page.count, more, "Fetched page");
        records.extend(page.results);

        if !more {
            break;
        }
        if pages >= config.max_pages {
            return Err(SearchError::RunawayPagination {
                kind: T::KIND,
                pages,
            });
        }
        request = request.next();
    }

    let elapsed = timer.stop();
    metrics().increment(&format!("corpus.loaded.{}", T::KIND));
    info!(
        kind = %T::KIND,
        records = records.len(),
        pages,
        elapsed_ms = elapsed.as_millis(),
        "Corpus loaded"
    );

    Ok(Corpus::new(records, pages, elapsed))
}

/// Observable cache lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusState {
    Empty,
    Loading,
    Ready,
}

type SharedLoad<T> = Shared<BoxFuture<'static, Result<Arc<Corpus<T>>>>>;

struct InFlight<T> {
    load: SharedLoad<T>,
    // Set once a caller awaits the load and so receives its error directly
    awaited: Arc<AtomicBool>,
}

enum Slot<T> {
    Empty,
    Loading(InFlight<T>),
    Ready(Arc<Corpus<T>>),
}

struct CacheInner<T: Searchable> {
    source: Arc<dyn PageSource<T>>,
    config: LoaderConfig,
    slot: Mutex<Slot<T>>,
    last_error: Mutex<Option<SearchError>>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, lazily populated corpus of one entity type
pub struct CorpusCache<T: Searchable> {
    inner: Arc<CacheInner<T>>,
}

impl<T: Searchable> Clone for CorpusCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Searchable> CorpusCache<T> {
    /// Empty cache over `source`
    pub fn new(source: Arc<dyn PageSource<T>>, config: LoaderConfig) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                config,
                slot: Mutex::new(Slot::Empty),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Entity type held by this cache
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        T::KIND
    }

    #[must_use]
    pub fn state(&self) -> CorpusState {
        match &*lock(&self.inner.slot) {
            Slot::Empty => CorpusState::Empty,
            Slot::Loading(_) => CorpusState::Loading,
            Slot::Ready(_) => CorpusState::Ready,
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state() == CorpusState::Ready
    }

    /// The loaded corpus, without waiting
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Corpus<T>>> {
        match &*lock(&self.inner.slot) {
            Slot::Ready(corpus) => Some(Arc::clone(corpus)),
            _ => None,
        }
    }

    /// Return the corpus, loading it first if needed.
    ///
    /// Concurrent callers share one in-flight load. Once ready, no further
    /// fetches are made.
    pub async fn load(&self) -> Result<Arc<Corpus<T>>> {
        let pending = {
            let mut slot = lock(&self.inner.slot);
            match &*slot {
                Slot::Ready(corpus) => return Ok(Arc::clone(corpus)),
                Slot::Loading(in_flight) => {
                    in_flight.awaited.store(true, Ordering::Relaxed);
                    in_flight.load.clone()
                }
                Slot::Empty => {
                    let in_flight = self.begin_load(true);
                    let pending = in_flight.load.clone();
                    *slot = Slot::Loading(in_flight);
                    pending
                }
            }
        };
        pending.await
    }

    /// Start a load in the background if the cache is empty.
    ///
    /// Needs a Tokio runtime to make progress on its own; without one the
    /// load is driven by the next [`CorpusCache::load`] call.
    pub fn start_loading(&self) {
        let Some(pending) = self.begin_background_load() else {
            return;
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                // Failures are kept for take_last_error
                let _ = pending.await;
            });
        }
    }

    /// Error from the most recent failed load that no caller awaited.
    ///
    /// Cleared on read and whenever a new load starts. Failures already
    /// returned from [`CorpusCache::load`] are not kept here.
    pub fn take_last_error(&self) -> Option<SearchError> {
        lock(&self.inner.last_error).take()
    }

    /// Speculatively load after `delay`, unless something else got there first
    pub fn preload_after(&self, delay: Duration) -> Option<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let cache = self.clone();
        Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(pending) = cache.begin_background_load() {
                debug!(kind = %T::KIND, "Preloading corpus");
                if let Err(e) = pending.await {
                    debug!(kind = %T::KIND, error = %e, "Preload failed");
                }
            }
        }))
    }

    fn begin_background_load(&self) -> Option<SharedLoad<T>> {
        let mut slot = lock(&self.inner.slot);
        if !matches!(*slot, Slot::Empty) {
            return None;
        }
        let in_flight = self.begin_load(false);
        let pending = in_flight.load.clone();
        *slot = Slot::Loading(in_flight);
        Some(pending)
    }

    fn begin_load(&self, awaited: bool) -> InFlight<T> {
        lock(&self.inner.last_error).take();

        let awaited = Arc::new(AtomicBool::new(awaited));
        let observed = Arc::clone(&awaited);

        let source = Arc::clone(&self.inner.source);
        let config = self.inner.config;
        let owner: Weak<CacheInner<T>> = Arc::downgrade(&self.inner);

        let load = async move {
            let result = load_corpus(source.as_ref(), &config).await.map(Arc::new);
            if let Some(inner) = owner.upgrade() {
                let mut slot = lock(&inner.slot);
                match &result {
                    Ok(corpus) => *slot = Slot::Ready(Arc::clone(corpus)),
                    Err(e) => {
                        warn!(kind = %T::KIND, error = %e, "Corpus load failed");
                        *slot = Slot::Empty;
                        if !observed.load(Ordering::Relaxed) {
                            *lock(&inner.last_error) = Some(e.clone());
                        }
                    }
                }
            }
            result
        }
        .boxed()
        .shared();

        InFlight { load, awaited }
    }
}
