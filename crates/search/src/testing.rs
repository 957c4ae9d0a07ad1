//! In-memory fakes shared by the unit tests.

use crate::entity::Searchable;
use crate::index::{EditDistanceScorer, IndexOptions, ScoringStrategy};
use crate::source::{PageRequest, PageSource};
use async_trait::async_trait;
use catalog_api_client::{ApiError, ComposerRecord, Page, WorkRecord};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Page source serving fixed pages, counting every fetch
pub(crate) struct FakeSource<T> {
    pages: Vec<Vec<T>>,
    endless: Option<T>,
    dangling_next: bool,
    fetches: AtomicUsize,
    requests: Mutex<Vec<PageRequest>>,
    fail_page: Mutex<Option<u32>>,
    gate: Option<Semaphore>,
}

impl<T: Searchable> FakeSource<T> {
    pub(crate) fn paged(pages: Vec<Vec<T>>) -> Self {
        Self {
            pages,
            endless: None,
            dangling_next: false,
            fetches: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            fail_page: Mutex::new(None),
            gate: None,
        }
    }

    pub(crate) fn single(records: Vec<T>) -> Self {
        Self::paged(vec![records])
    }

    /// Every page holds `record` and claims another page follows
    pub(crate) fn endless(record: T) -> Self {
        Self {
            endless: Some(record),
            ..Self::paged(Vec::new())
        }
    }

    /// Fetches block until [`FakeSource::release`]
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Every page, including the last, carries a `next` link
    pub(crate) fn with_dangling_next(mut self) -> Self {
        self.dangling_next = true;
        self
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub(crate) fn fail_page(&self, page: u32) {
        *self.fail_page.lock().unwrap() = Some(page);
    }

    pub(crate) fn heal(&self) {
        *self.fail_page.lock().unwrap() = None;
    }

    pub(crate) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn requested_pages(&self) -> Vec<u32> {
        self.requests.lock().unwrap().iter().map(|r| r.page).collect()
    }

    pub(crate) fn last_request(&self) -> Option<PageRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub(crate) async fn wait_for_fetches(&self, n: usize) {
        while self.fetches() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl<T: Searchable> PageSource<T> for FakeSource<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        if *self.fail_page.lock().unwrap() == Some(request.page) {
            return Err(ApiError::api_response(503, "service unavailable"));
        }

        if let Some(record) = &self.endless {
            return Ok(Page {
                count: u64::MAX,
                next: Some(format!("?page={}", request.page + 1)),
                previous: None,
                results: vec![record.clone()],
            });
        }

        let index = (request.page - 1) as usize;
        let results = self.pages.get(index).cloned().unwrap_or_default();
        let has_more = index + 1 < self.pages.len() || self.dangling_next;
        Ok(Page {
            count: self.pages.iter().map(Vec::len).sum::<usize>() as u64,
            next: has_more.then(|| format!("?page={}", request.page + 1)),
            previous: None,
            results,
        })
    }
}

pub(crate) fn composers(rows: &[(i64, &str)]) -> Vec<ComposerRecord> {
    rows.iter().map(|(id, name)| ComposerRecord::new(*id, *name)).collect()
}

pub(crate) fn works(rows: &[(i64, &str, &str)]) -> Vec<WorkRecord> {
    rows.iter()
        .map(|(id, title, composer)| WorkRecord::new(*id, *title).with_composer(0, *composer))
        .collect()
}

/// Delegates to [`EditDistanceScorer`] and counts invocations
#[derive(Default)]
pub(crate) struct CountingScorer {
    calls: AtomicUsize,
}

impl CountingScorer {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringStrategy for CountingScorer {
    fn field_score(&self, pattern: &[char], field: &[char], options: &IndexOptions) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EditDistanceScorer.field_score(pattern, field, options)
    }
}
