//! Catalog-wide counts computed from loaded corpora.

use crate::corpus::Corpus;
use catalog_api_client::{ComposerRecord, WorkRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Group label for records that leave the grouped field unset
pub const UNSPECIFIED: &str = "Unspecified";

/// Totals and breakdowns over the composer and work corpora
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub total_composers: usize,
    pub total_works: usize,
    /// Distinct composer countries
    pub total_countries: usize,
    pub living_composers: usize,
    /// Composer count per style period
    pub composers_by_period: BTreeMap<String, usize>,
    /// Work count per instrumentation category
    pub works_by_instrumentation: BTreeMap<String, usize>,
}

impl CatalogSummary {
    #[must_use]
    pub fn from_corpora(composers: &Corpus<ComposerRecord>, works: &Corpus<WorkRecord>) -> Self {
        let composers = composers.records();
        let works = works.records();

        let total_countries = composers
            .iter()
            .filter_map(|c| c.country_name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            total_composers: composers.len(),
            total_works: works.len(),
            total_countries,
            living_composers: composers.iter().filter(|c| c.is_living).count(),
            composers_by_period: tally(composers.iter().map(|c| c.period.as_ref().map(|p| p.as_str()))),
            works_by_instrumentation: tally(
                works
                    .iter()
                    .map(|w| w.instrumentation_category.as_ref().map(|c| c.name.as_str())),
            ),
        }
    }
}

fn tally<'a>(labels: impl Iterator<Item = Option<&'a str>>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.unwrap_or(UNSPECIFIED).to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_api_client::{InstrumentationCategory, Period};
    use std::time::Duration;

    fn composer(id: i64, period: Option<Period>, country: Option<&str>, living: bool) -> ComposerRecord {
        let mut record = ComposerRecord::new(id, format!("Composer {id}"));
        record.period = period;
        record.country_name = country.map(str::to_string);
        record.is_living = living;
        record
    }

    fn work(id: i64, category: Option<&str>) -> WorkRecord {
        let mut record = WorkRecord::new(id, format!("Work {id}"));
        record.instrumentation_category = category.map(|name| InstrumentationCategory {
            id: 1,
            name: name.to_string(),
            description: None,
            sort_order: 0,
        });
        record
    }

    #[test]
    fn test_summary_groups_and_counts() {
        let composers = Corpus::new(
            vec![
                composer(1, Some(Period::Romantic), Some("Spain"), false),
                composer(2, Some(Period::Romantic), Some("Spain"), false),
                composer(3, Some(Period::Contemporary), Some("Cuba"), true),
                composer(4, None, None, false),
            ],
            1,
            Duration::ZERO,
        );
        let works = Corpus::new(
            vec![work(10, Some("Solo Guitar")), work(11, Some("Solo Guitar")), work(12, None)],
            1,
            Duration::ZERO,
        );

        let summary = CatalogSummary::from_corpora(&composers, &works);
        assert_eq!(summary.total_composers, 4);
        assert_eq!(summary.total_works, 3);
        assert_eq!(summary.total_countries, 2);
        assert_eq!(summary.living_composers, 1);
        assert_eq!(summary.composers_by_period["Romantic"], 2);
        assert_eq!(summary.composers_by_period["Contemporary"], 1);
        assert_eq!(summary.composers_by_period[UNSPECIFIED], 1);
        assert_eq!(summary.works_by_instrumentation["Solo Guitar"], 2);
        assert_eq!(summary.works_by_instrumentation[UNSPECIFIED], 1);
    }

    #[test]
    fn test_empty_corpora() {
        let summary = CatalogSummary::from_corpora(
            &Corpus::new(Vec::new(), 1, Duration::ZERO),
            &Corpus::new(Vec::new(), 1, Duration::ZERO),
        );
        assert_eq!(summary.total_composers, 0);
        assert!(summary.composers_by_period.is_empty());
        assert!(summary.works_by_instrumentation.is_empty());
    }
}
