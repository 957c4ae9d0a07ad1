//! Attribute filters applied to search candidates.
//!
//! Filters narrow the corpus before ranking and truncation, so a limit
//! always counts records that passed the filter. A record missing a field
//! that a filter constrains never matches that constraint.

use crate::fuzzy::normalize;
use catalog_api_client::{ComposerRecord, Period, WorkRecord};
use serde::Serialize;

/// Predicate over records of one type
pub trait RecordFilter<T>: Send + Sync {
    /// Whether `record` should be kept
    fn matches(&self, record: &T) -> bool;
}

/// Keeps every record
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<T> RecordFilter<T> for AcceptAll {
    fn matches(&self, _record: &T) -> bool {
        true
    }
}

fn within(value: Option<i32>, min: Option<i32>, max: Option<i32>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    value.is_some_and(|v| min.is_none_or(|min| v >= min) && max.is_none_or(|max| v <= max))
}

fn same_label(value: Option<&str>, wanted: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| value.is_some_and(|value| normalize(value.trim()) == wanted))
}

/// Composer constraints: period, country, living status and birth year range
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComposerFilter {
    period: Option<Period>,
    country: Option<String>,
    is_living: Option<bool>,
    birth_year_min: Option<i32>,
    birth_year_max: Option<i32>,
}

impl ComposerFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Country name, compared without case or accents
    #[must_use]
    pub fn with_country(mut self, country: impl AsRef<str>) -> Self {
        self.country = Some(normalize(country.as_ref().trim()));
        self
    }

    #[must_use]
    pub fn with_living(mut self, is_living: bool) -> Self {
        self.is_living = Some(is_living);
        self
    }

    /// Inclusive birth year bounds
    #[must_use]
    pub fn with_birth_years(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.birth_year_min = min;
        self.birth_year_max = max;
        self
    }

    /// True when no constraint is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RecordFilter<ComposerRecord> for ComposerFilter {
    fn matches(&self, record: &ComposerRecord) -> bool {
        self.period.as_ref().is_none_or(|p| record.period.as_ref() == Some(p))
            && same_label(record.country_name.as_deref(), self.country.as_deref())
            && self.is_living.is_none_or(|living| record.is_living == living)
            && within(record.birth_year, self.birth_year_min, self.birth_year_max)
    }
}

/// Work constraints: composer, instrumentation, difficulty and year ranges
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkFilter {
    composer_id: Option<i64>,
    instrumentation: Option<String>,
    difficulty_min: Option<i32>,
    difficulty_max: Option<i32>,
    year_min: Option<i32>,
    year_max: Option<i32>,
}

impl WorkFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_composer(mut self, composer_id: i64) -> Self {
        self.composer_id = Some(composer_id);
        self
    }

    /// Instrumentation category name, compared without case or accents
    #[must_use]
    pub fn with_instrumentation(mut self, category: impl AsRef<str>) -> Self {
        self.instrumentation = Some(normalize(category.as_ref().trim()));
        self
    }

    /// Inclusive difficulty bounds
    #[must_use]
    pub fn with_difficulty(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.difficulty_min = min;
        self.difficulty_max = max;
        self
    }

    /// Inclusive composition year bounds
    #[must_use]
    pub fn with_years(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.year_min = min;
        self.year_max = max;
        self
    }

    /// True when no constraint is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl RecordFilter<WorkRecord> for WorkFilter {
    fn matches(&self, record: &WorkRecord) -> bool {
        self.composer_id
            .is_none_or(|id| record.composer.as_ref().is_some_and(|c| c.id == id))
            && same_label(
                record.instrumentation_category.as_ref().map(|c| c.name.as_str()),
                self.instrumentation.as_deref(),
            )
            && within(record.difficulty_level, self.difficulty_min, self.difficulty_max)
            && within(record.composition_year, self.year_min, self.year_max)
    }
}
