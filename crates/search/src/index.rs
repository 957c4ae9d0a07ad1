//! Weighted-field fuzzy index over a loaded corpus.
//!
//! Each record's search keys are folded once (see [`normalize`]) and kept
//! as char vectors. Lookups score every field with a [`ScoringStrategy`]
//! and combine matched fields into one record score where lower is better.

use crate::corpus::Corpus;
use crate::entity::{Searchable, WeightedKey};
use crate::fuzzy::{best_substring_match, levenshtein_distance, normalize, substring_distances};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Floor applied to perfect field scores so weights still matter
const EPSILON: f64 = 1e-3;

/// Fuzzy matching configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexOptions {
    /// Highest field score still accepted; 0 = exact, 1 = unrelated
    pub threshold: f64,
    /// Accept a match anywhere in a field
    pub ignore_location: bool,
    /// How far from the field start a match may begin when location matters
    pub distance: usize,
    /// Weighted keys, read through [`Searchable::field_value`]
    pub keys: Vec<WeightedKey>,
}

impl IndexOptions {
    /// Defaults for `T` with its standard keys
    #[must_use]
    pub fn for_entity<T: Searchable>() -> Self {
        Self {
            threshold: 0.35,
            ignore_location: true,
            distance: 100,
            keys: T::default_keys(),
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_location(mut self, ignore_location: bool, distance: usize) -> Self {
        self.ignore_location = ignore_location;
        self.distance = distance;
        self
    }

    #[must_use]
    pub fn with_keys(mut self, keys: Vec<WeightedKey>) -> Self {
        self.keys = keys;
        self
    }
}

/// Scores one normalized query against one normalized field value.
///
/// Implementations return `None` when the field does not match, otherwise a
/// score in `[0, threshold]`.
pub trait ScoringStrategy: Send + Sync {
    fn field_score(&self, pattern: &[char], field: &[char], options: &IndexOptions) -> Option<f64>;
}

/// Best approximate substring occurrence, scored as edits per query character
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceScorer;

impl ScoringStrategy for EditDistanceScorer {
    fn field_score(&self, pattern: &[char], field: &[char], options: &IndexOptions) -> Option<f64> {
        if pattern.is_empty() {
            return None;
        }
        let len = pattern.len() as f64;

        let score = if options.ignore_location {
            let (distance, _) = best_substring_match(pattern, field);
            distance as f64 / len
        } else {
            substring_distances(pattern, field)
                .into_iter()
                .enumerate()
                .filter_map(|(end, edits)| {
                    let start = end.saturating_sub(pattern.len());
                    let proximity = match (start, options.distance) {
                        (0, _) => 0.0,
                        (_, 0) => return None,
                        (start, distance) => start as f64 / distance as f64,
                    };
                    Some(edits as f64 / len + proximity)
                })
                .min_by(f64::total_cmp)?
        };

        (score <= options.threshold).then_some(score)
    }
}

/// Edit distance against the whole field rather than its best substring.
///
/// Stricter than [`EditDistanceScorer`]; suited to short fields such as
/// catalog numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeFieldScorer;

impl ScoringStrategy for WholeFieldScorer {
    fn field_score(&self, pattern: &[char], field: &[char], options: &IndexOptions) -> Option<f64> {
        let longest = pattern.len().max(field.len());
        if pattern.is_empty() || longest == 0 {
            return None;
        }
        let a: String = pattern.iter().collect();
        let b: String = field.iter().collect();
        let score = levenshtein_distance(&a, &b) as f64 / longest as f64;
        (score <= options.threshold).then_some(score)
    }
}

/// Built fuzzy index for one corpus snapshot
pub struct MatchIndex<T> {
    corpus: Arc<Corpus<T>>,
    options: IndexOptions,
    scorer: Arc<dyn ScoringStrategy>,
    /// Normalized key values per record, parallel to `options.keys`
    fields: Vec<Vec<Option<Vec<char>>>>,
    /// Key weights scaled to sum to one
    weights: Vec<f64>,
}

impl<T: Searchable> MatchIndex<T> {
    /// Fold every record's keys. An empty corpus gives an index that matches nothing.
    pub fn build(corpus: Arc<Corpus<T>>, options: IndexOptions, scorer: Arc<dyn ScoringStrategy>) -> Self {
        let fields: Vec<Vec<Option<Vec<char>>>> = corpus
            .records()
            .iter()
            .map(|record| {
                options
                    .keys
                    .iter()
                    .map(|key| {
                        record
                            .field_value(key.name)
                            .map(normalize)
                            .filter(|value| !value.trim().is_empty())
                            .map(|value| value.chars().collect::<Vec<char>>())
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let total: f64 = options.keys.iter().map(|k| k.weight.max(0.0)).sum();
        let weights = options
            .keys
            .iter()
            .map(|k| if total > 0.0 { k.weight.max(0.0) / total } else { 0.0 })
            .collect();

        debug!(kind = %T::KIND, records = corpus.len(), keys = options.keys.len(), "Built match index");

        Self {
            corpus,
            options,
            scorer,
            fields,
            weights,
        }
    }

    /// Snapshot the index was built from
    #[must_use]
    pub fn corpus(&self) -> &Arc<Corpus<T>> {
        &self.corpus
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Corpus positions and scores of matching records, best first.
    ///
    /// Ties keep corpus order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<(usize, f64)> {
        let pattern: Vec<char> = normalize(query.trim()).chars().collect();
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(usize, f64)> = self
            .fields
            .iter()
            .enumerate()
            .filter_map(|(position, fields)| self.score_record(&pattern, fields).map(|s| (position, s)))
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits
    }

    fn score_record(&self, pattern: &[char], fields: &[Option<Vec<char>>]) -> Option<f64> {
        let mut matched = false;
        let mut total = 1.0;

        for (field, weight) in fields.iter().zip(&self.weights) {
            let Some(value) = field else { continue };
            if let Some(score) = self.scorer.field_score(pattern, value, &self.options) {
                matched = true;
                total *= score.max(EPSILON).powf(*weight);
            }
        }

        matched.then_some(total)
    }

    pub(crate) fn is_built_from(&self, corpus: &Corpus<T>) -> bool {
        self.corpus.generation() == corpus.generation() && self.corpus.len() == corpus.len()
    }
}

/// Memoized [`MatchIndex`], rebuilt only when the corpus changes
pub struct IndexCache<T> {
    options: IndexOptions,
    scorer: Arc<dyn ScoringStrategy>,
    current: Mutex<Option<Arc<MatchIndex<T>>>>,
    builds: AtomicUsize,
}

impl<T: Searchable> IndexCache<T> {
    pub fn new(options: IndexOptions, scorer: Arc<dyn ScoringStrategy>) -> Self {
        Self {
            options,
            scorer,
            current: Mutex::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Index for `corpus`, building it on first use
    pub fn get_or_build(&self, corpus: &Arc<Corpus<T>>) -> Arc<MatchIndex<T>> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = current.as_ref().filter(|index| index.is_built_from(corpus)) {
            return Arc::clone(index);
        }

        let index = Arc::new(MatchIndex::build(
            Arc::clone(corpus),
            self.options.clone(),
            Arc::clone(&self.scorer),
        ));
        self.builds.fetch_add(1, Ordering::Relaxed);
        *current = Some(Arc::clone(&index));
        index
    }

    /// How many times an index has been built
    #[must_use]
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::composers;
    use catalog_api_client::{ComposerRecord, WorkRecord};
    use proptest::prelude::*;
    use std::time::Duration;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn corpus(rows: &[(i64, &str)]) -> Arc<Corpus<ComposerRecord>> {
        Arc::new(Corpus::new(composers(rows), 1, Duration::ZERO))
    }

    fn index(corpus: Arc<Corpus<ComposerRecord>>) -> MatchIndex<ComposerRecord> {
        MatchIndex::build(
            corpus,
            IndexOptions::for_entity::<ComposerRecord>(),
            Arc::new(EditDistanceScorer),
        )
    }

    #[test]
    fn test_single_typo_matches() {
        let index = index(corpus(&[(1, "Johann Sebastian Bach"), (2, "Heitor Villa-Lobos")]));
        let hits = index.search("Vila-Lobos");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);
    }

    #[test]
    fn test_unrelated_word_matches_nothing() {
        let index = index(corpus(&[(1, "Johann Sebastian Bach"), (2, "Heitor Villa-Lobos")]));
        assert!(index.search("xyzzy").is_empty());
    }

    #[test]
    fn test_accents_are_folded() {
        let index = index(corpus(&[(1, "Antonín Dvořák")]));
        assert_eq!(index.search("dvorak").len(), 1);
    }

    #[test]
    fn test_closer_match_ranks_first() {
        let index = index(corpus(&[(1, "Fernando Sar"), (2, "Fernando Sor")]));
        let hits = index.search("fernando sor");
        let positions: Vec<usize> = hits.iter().map(|h| h.0).collect();
        assert_eq!(positions, vec![1, 0]);
        assert!(hits[0].1 < hits[1].1);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let index = index(corpus(&[(1, "Tarrega"), (2, "Tarrega"), (3, "Tarrega")]));
        let positions: Vec<usize> = index.search("tarega").into_iter().map(|h| h.0).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_secondary_key_can_match() {
        let corpus = Arc::new(Corpus::new(
            vec![ComposerRecord::new(1, "Leo Brouwer").with_country("Cuba")],
            1,
            Duration::ZERO,
        ));
        let hits = index(corpus).search("cuba");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_work_composer_key_matches() {
        let corpus = Arc::new(Corpus::new(
            vec![WorkRecord::new(1, "Recuerdos de la Alhambra").with_composer(9, "Francisco Tárrega")],
            1,
            Duration::ZERO,
        ));
        let index = MatchIndex::build(
            corpus,
            IndexOptions::for_entity::<WorkRecord>(),
            Arc::new(EditDistanceScorer),
        );
        assert_eq!(index.search("tarrega").len(), 1);
    }

    #[test]
    fn test_empty_corpus_matches_nothing() {
        assert!(index(corpus(&[])).search("bach").is_empty());
    }

    #[test]
    fn test_location_limits_match_start() {
        let options = IndexOptions::for_entity::<ComposerRecord>().with_location(false, 0);
        let field = chars("johann sebastian bach");
        assert!(EditDistanceScorer.field_score(&chars("bach"), &field, &options).is_none());
        assert_eq!(
            EditDistanceScorer.field_score(&chars("johan"), &field, &options),
            Some(0.0)
        );

        let options = options.with_location(false, 100);
        let score = EditDistanceScorer.field_score(&chars("bach"), &field, &options).unwrap();
        assert!(score > 0.0 && score < 0.35);
    }

    #[test]
    fn test_whole_field_scorer() {
        let options = IndexOptions::for_entity::<ComposerRecord>();
        assert_eq!(WholeFieldScorer.field_score(&chars("op. 9"), &chars("op. 9"), &options), Some(0.0));
        assert!(WholeFieldScorer.field_score(&chars("bach"), &chars("johann sebastian bach"), &options).is_none());
    }

    #[test]
    fn test_index_cache_memoizes_on_corpus_identity() {
        let cache: IndexCache<ComposerRecord> =
            IndexCache::new(IndexOptions::for_entity::<ComposerRecord>(), Arc::new(EditDistanceScorer));
        let first = corpus(&[(1, "Bach")]);

        let a = cache.get_or_build(&first);
        let b = cache.get_or_build(&first);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.builds(), 1);

        let second = corpus(&[(1, "Bach")]);
        cache.get_or_build(&second);
        assert_eq!(cache.builds(), 2);
    }

    proptest! {
        #[test]
        fn prop_search_is_deterministic(names in proptest::collection::vec("[a-z]{3,10}", 0..20), query in "[a-z]{2,6}") {
            let rows: Vec<(i64, &str)> = names.iter().enumerate().map(|(i, n)| (i as i64, n.as_str())).collect();
            let index = index(corpus(&rows));
            prop_assert_eq!(index.search(&query), index.search(&query));
        }

        #[test]
        fn prop_scores_are_sorted(names in proptest::collection::vec("[a-e]{3,8}", 0..20), query in "[a-e]{2,5}") {
            let rows: Vec<(i64, &str)> = names.iter().enumerate().map(|(i, n)| (i as i64, n.as_str())).collect();
            let hits = index(corpus(&rows)).search(&query);
            prop_assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
        }
    }
}
