//! Searchable entity types and their weighted search keys.

use catalog_api_client::{ComposerRecord, WorkRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two record kinds the catalog can search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Composer records from `/composers/`
    Composer,
    /// Work records from `/works/`
    Work,
}

impl EntityKind {
    /// Stable backend ordering used when bulk-loading this kind
    #[must_use]
    pub fn default_ordering(self) -> &'static [&'static str] {
        match self {
            Self::Composer => &["last_name", "first_name"],
            Self::Work => &["title"],
        }
    }

    /// Singular label for logs and messages
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Composer => "composer",
            Self::Work => "work",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A search key and its relative weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedKey {
    /// Key name understood by [`Searchable::field_value`]
    pub name: &'static str,
    /// Relative importance; weights are normalized over all keys
    pub weight: f64,
}

impl WeightedKey {
    /// Create a key
    #[must_use]
    pub const fn new(name: &'static str, weight: f64) -> Self {
        Self { name, weight }
    }
}

/// A record type that can be cached and searched.
pub trait Searchable: Clone + Send + Sync + 'static {
    /// Which backend collection the type comes from
    const KIND: EntityKind;

    /// Unique, stable identifier
    fn id(&self) -> i64;

    /// Display field the substring pass runs against
    fn primary_text(&self) -> &str;

    /// Fuzzy search keys, primary first
    fn default_keys() -> Vec<WeightedKey>;

    /// Value of a search key; `None` when the record leaves it unset or the
    /// key is unknown
    fn field_value(&self, key: &str) -> Option<&str>;
}

impl Searchable for ComposerRecord {
    const KIND: EntityKind = EntityKind::Composer;

    fn id(&self) -> i64 {
        self.id
    }

    fn primary_text(&self) -> &str {
        &self.full_name
    }

    fn default_keys() -> Vec<WeightedKey> {
        vec![
            WeightedKey::new("full_name", 0.7),
            WeightedKey::new("country_name", 0.3),
        ]
    }

    fn field_value(&self, key: &str) -> Option<&str> {
        match key {
            "full_name" => Some(&self.full_name),
            "country_name" => self.country_name.as_deref(),
            _ => None,
        }
    }
}

impl Searchable for WorkRecord {
    const KIND: EntityKind = EntityKind::Work;

    fn id(&self) -> i64 {
        self.id
    }

    fn primary_text(&self) -> &str {
        &self.title
    }

    fn default_keys() -> Vec<WeightedKey> {
        vec![
            WeightedKey::new("title", 0.5),
            WeightedKey::new("composer.full_name", 0.3),
            WeightedKey::new("instrumentation", 0.1),
            WeightedKey::new("catalog_number", 0.1),
        ]
    }

    fn field_value(&self, key: &str) -> Option<&str> {
        match key {
            "title" => Some(&self.title),
            "composer.full_name" => self.composer_name(),
            "instrumentation" => self.instrumentation(),
            "catalog_number" => self.catalog_number.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_key_is_readable() {
        let composer = ComposerRecord::new(1, "Fernando Sor").with_country("Spain");
        for key in ComposerRecord::default_keys() {
            assert!(composer.field_value(key.name).is_some(), "{}", key.name);
        }

        let work = WorkRecord::new(2, "Variations on a Theme of Mozart")
            .with_composer(1, "Fernando Sor")
            .with_catalog_number("Op. 9")
            .with_instrumentation("Solo guitar");
        for key in WorkRecord::default_keys() {
            assert!(work.field_value(key.name).is_some(), "{}", key.name);
        }
    }

    #[test]
    fn test_primary_key_has_highest_weight() {
        for keys in [ComposerRecord::default_keys(), WorkRecord::default_keys()] {
            let first = keys[0].weight;
            assert!(keys.iter().skip(1).all(|k| k.weight < first));
        }
    }

    #[test]
    fn test_orderings() {
        assert_eq!(EntityKind::Composer.default_ordering(), &["last_name", "first_name"]);
        assert_eq!(EntityKind::Work.default_ordering(), &["title"]);
        assert_eq!(EntityKind::Work.to_string(), "work");
    }
}
