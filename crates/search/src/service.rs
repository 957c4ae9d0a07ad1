//! Per-entity search services and the catalog-wide facade.

use crate::corpus::{Corpus, CorpusCache, LoaderConfig};
use crate::entity::Searchable;
use crate::error::{Result, SearchError};
use crate::filter::{AcceptAll, ComposerFilter, RecordFilter, WorkFilter};
use crate::index::{EditDistanceScorer, IndexCache, IndexOptions, ScoringStrategy};
use crate::resolver::{QueryResolver, SearchOutcome};
use crate::source::PageSource;
use crate::summary::CatalogSummary;
use catalog_api_client::{CatalogClient, ComposerRecord, WorkRecord};
use catalog_core::config::ConfigSchema;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

/// Everything tunable about loading and matching
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub loader: LoaderConfig,
    pub threshold: f64,
    pub min_match_char_length: usize,
    pub ignore_location: bool,
    pub distance: usize,
    /// Maximum results per entity type
    pub limit: Option<NonZeroUsize>,
    pub preload_delay: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&ConfigSchema::default())
    }
}

impl SearchSettings {
    /// Settings from the `[api]` and `[search]` sections
    #[must_use]
    pub fn from_config(config: &ConfigSchema) -> Self {
        Self {
            loader: LoaderConfig {
                page_size: config.api.page_size,
                max_pages: config.api.max_pages,
            },
            threshold: config.search.threshold,
            min_match_char_length: config.search.min_match_char_length,
            ignore_location: config.search.ignore_location,
            distance: config.search.distance,
            limit: config.search.limit.and_then(NonZeroUsize::new),
            preload_delay: Duration::from_millis(config.search.preload_delay_ms),
        }
    }

    fn index_options<T: Searchable>(&self) -> IndexOptions {
        IndexOptions::for_entity::<T>()
            .with_threshold(self.threshold)
            .with_location(self.ignore_location, self.distance)
    }

    fn resolver(&self) -> QueryResolver {
        QueryResolver::new(self.min_match_char_length, self.limit)
    }
}

/// Cache, index and resolver for one entity type
pub struct EntitySearch<T: Searchable> {
    cache: CorpusCache<T>,
    index: IndexCache<T>,
    resolver: QueryResolver,
}

impl<T: Searchable> EntitySearch<T> {
    pub fn new(
        source: Arc<dyn PageSource<T>>,
        settings: &SearchSettings,
        scorer: Arc<dyn ScoringStrategy>,
    ) -> Self {
        Self {
            cache: CorpusCache::new(source, settings.loader),
            index: IndexCache::new(settings.index_options::<T>(), scorer),
            resolver: settings.resolver(),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &CorpusCache<T> {
        &self.cache
    }

    #[must_use]
    pub fn index(&self) -> &IndexCache<T> {
        &self.index
    }

    /// Search without waiting for the corpus.
    ///
    /// A cold cache starts loading and yields [`SearchOutcome::NotReady`].
    /// If the previous background load failed, that failure is returned once
    /// and the following call starts a fresh load.
    pub fn search(&self, query: &str) -> Result<SearchOutcome<T>> {
        self.search_filtered(query, &AcceptAll)
    }

    /// [`EntitySearch::search`] restricted to records `filter` keeps
    pub fn search_filtered<F: RecordFilter<T> + ?Sized>(
        &self,
        query: &str,
        filter: &F,
    ) -> Result<SearchOutcome<T>> {
        let query = non_empty(query)?;
        let Some(corpus) = self.cache.snapshot() else {
            if let Some(err) = self.cache.take_last_error() {
                return Err(err);
            }
            self.cache.start_loading();
            debug!(kind = %T::KIND, "Corpus not ready");
            return Ok(SearchOutcome::NotReady);
        };
        Ok(self.resolver.resolve_filtered(query, Some(&corpus), &self.index, filter))
    }

    /// Search once the corpus is loaded, loading it if needed
    pub async fn search_ready(&self, query: &str) -> Result<SearchOutcome<T>> {
        self.search_ready_filtered(query, &AcceptAll).await
    }

    /// [`EntitySearch::search_ready`] restricted to records `filter` keeps
    #[instrument(skip(self, filter), fields(kind = %T::KIND))]
    pub async fn search_ready_filtered<F: RecordFilter<T> + ?Sized>(
        &self,
        query: &str,
        filter: &F,
    ) -> Result<SearchOutcome<T>> {
        let query = non_empty(query)?;
        let corpus = self.cache.load().await?;
        Ok(self.resolver.resolve_filtered(query, Some(&corpus), &self.index, filter))
    }

    /// The loaded corpus, loading it if needed
    pub async fn load(&self) -> Result<Arc<Corpus<T>>> {
        self.cache.load().await
    }
}

fn non_empty(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        Err(SearchError::EmptyQuery)
    } else {
        Ok(query)
    }
}

/// Composer and work search over one backend
pub struct CatalogSearch {
    composers: EntitySearch<ComposerRecord>,
    works: EntitySearch<WorkRecord>,
    settings: SearchSettings,
}

impl CatalogSearch {
    /// Search backed by the REST client
    #[must_use]
    pub fn new(client: &CatalogClient, settings: SearchSettings) -> Self {
        Self::with_sources(Arc::new(client.composers()), Arc::new(client.works()), settings)
    }

    /// Search backed by arbitrary page sources
    #[must_use]
    pub fn with_sources(
        composers: Arc<dyn PageSource<ComposerRecord>>,
        works: Arc<dyn PageSource<WorkRecord>>,
        settings: SearchSettings,
    ) -> Self {
        Self::with_scorer(composers, works, settings, Arc::new(EditDistanceScorer))
    }

    /// As [`CatalogSearch::with_sources`] with a custom fuzzy scorer
    #[must_use]
    pub fn with_scorer(
        composers: Arc<dyn PageSource<ComposerRecord>>,
        works: Arc<dyn PageSource<WorkRecord>>,
        settings: SearchSettings,
        scorer: Arc<dyn ScoringStrategy>,
    ) -> Self {
        Self {
            composers: EntitySearch::new(composers, &settings, Arc::clone(&scorer)),
            works: EntitySearch::new(works, &settings, scorer),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    #[must_use]
    pub fn composers(&self) -> &EntitySearch<ComposerRecord> {
        &self.composers
    }

    #[must_use]
    pub fn works(&self) -> &EntitySearch<WorkRecord> {
        &self.works
    }

    pub fn search_composers(&self, query: &str) -> Result<SearchOutcome<ComposerRecord>> {
        self.composers.search(query)
    }

    pub fn search_works(&self, query: &str) -> Result<SearchOutcome<WorkRecord>> {
        self.works.search(query)
    }

    pub async fn search_composers_ready(&self, query: &str) -> Result<SearchOutcome<ComposerRecord>> {
        self.composers.search_ready(query).await
    }

    pub async fn search_works_ready(&self, query: &str) -> Result<SearchOutcome<WorkRecord>> {
        self.works.search_ready(query).await
    }

    pub async fn search_composers_where(
        &self,
        query: &str,
        filter: &ComposerFilter,
    ) -> Result<SearchOutcome<ComposerRecord>> {
        self.composers.search_ready_filtered(query, filter).await
    }

    pub async fn search_works_where(&self, query: &str, filter: &WorkFilter) -> Result<SearchOutcome<WorkRecord>> {
        self.works.search_ready_filtered(query, filter).await
    }

    /// Load both corpora and count them by period, country and instrumentation
    pub async fn summary(&self) -> Result<CatalogSummary> {
        let (composers, works) = self.load_all().await?;
        Ok(CatalogSummary::from_corpora(&composers, &works))
    }

    /// Load both corpora, one after the other
    pub async fn load_all(&self) -> Result<(Arc<Corpus<ComposerRecord>>, Arc<Corpus<WorkRecord>>)> {
        let composers = self.composers.load().await?;
        let works = self.works.load().await?;
        Ok((composers, works))
    }

    /// Schedule speculative loads of both corpora after the configured delay
    pub fn preload(&self) -> Vec<JoinHandle<()>> {
        self.preload_after(self.settings.preload_delay)
    }

    /// Schedule speculative loads of both corpora after `delay`
    pub fn preload_after(&self, delay: Duration) -> Vec<JoinHandle<()>> {
        self.composers
            .cache()
            .preload_after(delay)
            .into_iter()
            .chain(self.works.cache().preload_after(delay))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusState;
    use crate::resolver::MatchPath;
    use crate::testing::{CountingScorer, FakeSource, composers, works};

    struct Fixture {
        composers: Arc<FakeSource<ComposerRecord>>,
        works: Arc<FakeSource<WorkRecord>>,
        search: CatalogSearch,
    }

    fn fixture(composers: FakeSource<ComposerRecord>, works: FakeSource<WorkRecord>) -> Fixture {
        let composers = Arc::new(composers);
        let works = Arc::new(works);
        let search = CatalogSearch::with_sources(composers.clone(), works.clone(), SearchSettings::default());
        Fixture {
            composers,
            works,
            search,
        }
    }

    fn catalog() -> Fixture {
        fixture(
            FakeSource::single(composers(&[(1, "Johann Sebastian Bach"), (2, "Heitor Villa-Lobos")])),
            FakeSource::single(works(&[(10, "Bach's Prelude", "Johann Sebastian Bach")])),
        )
    }

    #[tokio::test]
    async fn test_cold_search_is_not_ready_then_matches() {
        let f = catalog();

        let outcome = f.search.search_composers("bach").unwrap();
        assert_eq!(outcome, SearchOutcome::NotReady);

        f.search.composers().load().await.unwrap();
        let outcome = f.search.search_composers("bach").unwrap();
        assert_eq!(outcome.into_items().iter().map(|c| c.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(f.composers.fetches(), 1);
        assert_eq!(f.works.fetches(), 0);
    }

    #[tokio::test]
    async fn test_ready_search_loads_once() {
        let f = catalog();
        for _ in 0..3 {
            let outcome = f.search.search_composers_ready("Vila-Lobos").await.unwrap();
            assert_eq!(outcome.path(), Some(MatchPath::Fuzzy));
            assert_eq!(outcome.results()[0].item.id, 2);
        }
        assert_eq!(f.composers.fetches(), 1);
        assert_eq!(f.search.composers().index().builds(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let f = catalog();
        assert!(matches!(f.search.search_works("   "), Err(SearchError::EmptyQuery)));
        assert!(matches!(f.search.search_works_ready("").await, Err(SearchError::EmptyQuery)));
        assert_eq!(f.works.fetches(), 0);
    }

    #[tokio::test]
    async fn test_background_failure_surfaces_once_then_retries() {
        let f = catalog();
        f.composers.fail_page(1);

        assert_eq!(f.search.search_composers("bach").unwrap(), SearchOutcome::NotReady);
        f.composers.wait_for_fetches(1).await;
        while f.search.composers().cache().state() == CorpusState::Loading {
            tokio::task::yield_now().await;
        }

        let err = f.search.search_composers("bach").unwrap_err();
        assert!(err.is_retryable());

        f.composers.heal();
        assert_eq!(f.search.search_composers("bach").unwrap(), SearchOutcome::NotReady);
        let outcome = f.search.search_composers_ready("bach").await.unwrap();
        assert_eq!(outcome.results().len(), 1);
        assert_eq!(f.composers.fetches(), 2);
    }

    #[tokio::test]
    async fn test_ready_search_propagates_load_failure() {
        let f = catalog();
        f.works.fail_page(1);
        let err = f.search.search_works_ready("prelude").await.unwrap_err();
        assert!(matches!(err, SearchError::LoadFailure { .. }));
        assert_eq!(f.search.works().cache().state(), CorpusState::Empty);
    }

    #[tokio::test]
    async fn test_delivered_failure_is_not_reported_again() {
        let f = catalog();
        f.composers.fail_page(1);
        assert!(f.search.search_composers_ready("bach").await.is_err());

        f.composers.heal();
        assert_eq!(f.search.search_composers("bach").unwrap(), SearchOutcome::NotReady);
        let outcome = f.search.search_composers_ready("bach").await.unwrap();
        assert_eq!(outcome.results().len(), 1);
    }

    #[tokio::test]
    async fn test_filtered_search_narrows_results() {
        let mut segovia = ComposerRecord::new(1, "Andrés Segovia").with_country("Spain");
        segovia.birth_year = Some(1893);
        let mut sor = ComposerRecord::new(2, "Fernando Sor").with_country("Spain");
        sor.birth_year = Some(1778);
        let search = CatalogSearch::with_sources(
            Arc::new(FakeSource::single(vec![segovia, sor])),
            Arc::new(FakeSource::single(works(&[(10, "Sonata", "Fernando Sor")]))),
            SearchSettings::default(),
        );

        let filter = ComposerFilter::new().with_country("spain").with_birth_years(None, Some(1800));
        let outcome = search.search_composers_where("o", &filter).await.unwrap();
        assert_eq!(outcome.into_items().iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);

        let filter = WorkFilter::new().with_composer(99);
        let outcome = search.search_works_where("sonata", &filter).await.unwrap();
        assert_eq!(outcome, SearchOutcome::NoMatches);
    }

    #[tokio::test]
    async fn test_summary_loads_both_corpora() {
        let f = catalog();
        let summary = f.search.summary().await.unwrap();
        assert_eq!(summary.total_composers, 2);
        assert_eq!(summary.total_works, 1);
        assert_eq!(f.composers.fetches(), 1);
        assert_eq!(f.works.fetches(), 1);
    }

    #[tokio::test]
    async fn test_custom_scorer_is_used() {
        let scorer = Arc::new(CountingScorer::default());
        let search = CatalogSearch::with_scorer(
            Arc::new(FakeSource::single(composers(&[(1, "Heitor Villa-Lobos")]))),
            Arc::new(FakeSource::single(Vec::new())),
            SearchSettings::default(),
            scorer.clone(),
        );
        search.search_composers_ready("Vila-Lobos").await.unwrap();
        assert!(scorer.calls() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_warms_both_caches() {
        let f = catalog();
        for handle in f.search.preload() {
            handle.await.unwrap();
        }
        assert!(f.search.composers().cache().is_loaded());
        assert!(f.search.works().cache().is_loaded());
        assert!(f.search.search_works("prelude").unwrap().is_ready());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = ConfigSchema::default();
        config.search.limit = Some(5);
        config.api.page_size = 500;
        let settings = SearchSettings::from_config(&config);
        assert_eq!(settings.limit, NonZeroUsize::new(5));
        assert_eq!(settings.loader.page_size, 500);
        assert_eq!(settings.preload_delay, Duration::from_secs(1));
        assert!((settings.threshold - 0.35).abs() < f64::EPSILON);
    }
}
