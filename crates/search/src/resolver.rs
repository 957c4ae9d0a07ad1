//! Two-phase query resolution: substring fast path, fuzzy fallback.

use crate::corpus::Corpus;
use crate::entity::Searchable;
use crate::filter::{AcceptAll, RecordFilter};
use crate::index::IndexCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

/// Which phase produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPath {
    /// Case-insensitive containment in the primary field
    Substring,
    /// Approximate match through the index
    Fuzzy,
}

/// One matched record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<T> {
    pub item: T,
    /// Lower is better; substring hits are always `0.0`
    pub score: f64,
    pub path: MatchPath,
}

/// What a search produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "results", rename_all = "snake_case")]
pub enum SearchOutcome<T> {
    /// The corpus has not finished its first load
    NotReady,
    /// Neither phase found anything
    NoMatches,
    Matches(Vec<SearchResult<T>>),
}

impl<T> SearchOutcome<T> {
    fn from_results(results: Vec<SearchResult<T>>) -> Self {
        if results.is_empty() {
            Self::NoMatches
        } else {
            Self::Matches(results)
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::NotReady)
    }

    /// Matched results; empty for the other states
    #[must_use]
    pub fn results(&self) -> &[SearchResult<T>] {
        match self {
            Self::Matches(results) => results,
            Self::NotReady | Self::NoMatches => &[],
        }
    }

    #[must_use]
    pub fn into_results(self) -> Vec<SearchResult<T>> {
        match self {
            Self::Matches(results) => results,
            Self::NotReady | Self::NoMatches => Vec::new(),
        }
    }

    /// Matched records without scores
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.into_results().into_iter().map(|r| r.item).collect()
    }

    /// Phase that produced the results, if any
    #[must_use]
    pub fn path(&self) -> Option<MatchPath> {
        self.results().first().map(|r| r.path)
    }
}

/// Resolves queries against a corpus snapshot and its index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryResolver {
    min_match_char_length: usize,
    limit: Option<NonZeroUsize>,
}

impl Default for QueryResolver {
    fn default() -> Self {
        Self::new(2, None)
    }
}

impl QueryResolver {
    #[must_use]
    pub fn new(min_match_char_length: usize, limit: Option<NonZeroUsize>) -> Self {
        Self {
            min_match_char_length,
            limit,
        }
    }

    /// Resolve `query`.
    ///
    /// `None` for the corpus means it is still cold and yields
    /// [`SearchOutcome::NotReady`]. The index is only consulted when the
    /// substring pass finds nothing and the query is long enough.
    pub fn resolve<T: Searchable>(
        &self,
        query: &str,
        corpus: Option<&Arc<Corpus<T>>>,
        index: &IndexCache<T>,
    ) -> SearchOutcome<T> {
        self.resolve_filtered(query, corpus, index, &AcceptAll)
    }

    /// Resolve `query` over the records `filter` keeps.
    ///
    /// Rejected records take no part in either pass, so a substring hit that
    /// the filter removes does not suppress the fuzzy pass, and the limit
    /// counts only kept records.
    pub fn resolve_filtered<T: Searchable, F: RecordFilter<T> + ?Sized>(
        &self,
        query: &str,
        corpus: Option<&Arc<Corpus<T>>>,
        index: &IndexCache<T>,
        filter: &F,
    ) -> SearchOutcome<T> {
        let Some(corpus) = corpus else {
            return SearchOutcome::NotReady;
        };
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::NoMatches;
        }

        let substring = self.substring_matches(query, corpus, filter);
        if !substring.is_empty() {
            trace!(kind = %T::KIND, query, hits = substring.len(), "Substring matches");
            return SearchOutcome::from_results(substring);
        }

        if query.graphemes(true).count() < self.min_match_char_length {
            trace!(kind = %T::KIND, query, "Query too short for fuzzy matching");
            return SearchOutcome::NoMatches;
        }

        let index = index.get_or_build(corpus);
        let records = corpus.records();
        let fuzzy: Vec<SearchResult<T>> = index
            .search(query)
            .into_iter()
            .filter(|(position, _)| filter.matches(&records[*position]))
            .take(self.limit.map_or(usize::MAX, NonZeroUsize::get))
            .map(|(position, score)| SearchResult {
                item: records[position].clone(),
                score,
                path: MatchPath::Fuzzy,
            })
            .collect();
        trace!(kind = %T::KIND, query, hits = fuzzy.len(), "Fuzzy matches");

        SearchOutcome::from_results(fuzzy)
    }

    fn substring_matches<T: Searchable, F: RecordFilter<T> + ?Sized>(
        &self,
        query: &str,
        corpus: &Corpus<T>,
        filter: &F,
    ) -> Vec<SearchResult<T>> {
        let needle = query.to_lowercase();
        corpus
            .primary_lower()
            .iter()
            .zip(corpus.records())
            .filter(|(primary, record)| primary.contains(&needle) && filter.matches(record))
            .take(self.limit.map_or(usize::MAX, NonZeroUsize::get))
            .map(|(_, record)| SearchResult {
                item: record.clone(),
                score: 0.0,
                path: MatchPath::Substring,
            })
            .collect()
    }
}
