//! Object catalog: named objects and their offsets from the anchor.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Case-folded form of an object name used for every name comparison.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Error returned when constructing an invalid [`CatalogEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogEntryError {
    /// The name was empty or whitespace.
    #[error("catalog entry name cannot be empty")]
    EmptyName,
    /// One of the offset components was NaN or infinite.
    #[error("catalog entry `{0}` has a non-finite offset")]
    NonFiniteOffset(String),
}

/// A known object and its displacement from the anchor, in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    name: String,
    offset: DVec3,
}

impl CatalogEntry {
    /// Validate and build an entry.
    pub fn new(name: impl Into<String>, offset: DVec3) -> Result<Self, CatalogEntryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogEntryError::EmptyName);
        }
        if !offset.is_finite() {
            return Err(CatalogEntryError::NonFiniteOffset(name));
        }
        Ok(Self { name, offset })
    }

    /// Display name, as stored by the backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset relative to the anchor.
    pub fn offset(&self) -> DVec3 {
        self.offset
    }

    /// Case-insensitive name comparison.
    pub fn matches(&self, name: &str) -> bool {
        name_key(&self.name) == name_key(name)
    }
}

/// How entries sharing a (case-insensitive) name are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Every matching entry gets its own placement.
    #[default]
    PlaceAll,
    /// Only the first entry per name, in catalog order.
    FirstMatch,
}

/// Ordered set of catalog entries for one session.
///
/// Entries keep fetch order; duplicates by name are retained and resolved at
/// placement time via [`DuplicatePolicy`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from entries in fetch order.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Catalog with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Entries in fetch order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Iterate entries in fetch order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Number of entries (duplicates included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose name matches `name` case-insensitively.
    pub fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.matches(name))
    }

    /// Distinct object names, case-insensitively deduplicated.
    ///
    /// The first spelling seen wins; output is sorted by the folded name so
    /// search lists are stable across fetches.
    pub fn names(&self) -> Vec<String> {
        let mut names: BTreeMap<String, &str> = BTreeMap::new();
        for entry in &self.entries {
            names.entry(name_key(entry.name())).or_insert(entry.name());
        }
        names.into_values().map(str::to_string).collect()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<T: IntoIterator<Item = CatalogEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, x: f64, y: f64, z: f64) -> CatalogEntry {
        CatalogEntry::new(name, DVec3::new(x, y, z)).expect("valid entry")
    }

    #[test]
    fn entry_rejects_empty_name() {
        assert_eq!(
            CatalogEntry::new("", DVec3::ZERO),
            Err(CatalogEntryError::EmptyName)
        );
        assert_eq!(
            CatalogEntry::new("   ", DVec3::ZERO),
            Err(CatalogEntryError::EmptyName)
        );
    }

    #[test]
    fn entry_rejects_non_finite_offset() {
        let err = CatalogEntry::new("keys", DVec3::new(0.0, f64::INFINITY, 0.0)).unwrap_err();
        assert_eq!(err, CatalogEntryError::NonFiniteOffset("keys".into()));
    }

    #[test]
    fn entry_matches_case_insensitively() {
        let laptop = entry("Laptop", 0.0, 0.0, 0.0);
        assert!(laptop.matches("laptop"));
        assert!(laptop.matches("LAPTOP"));
        assert!(!laptop.matches("lap top"));
    }

    #[test]
    fn names_are_distinct_and_sorted() {
        let catalog: Catalog = vec![
            entry("cup", 0.0, 0.0, 0.0),
            entry("Keys", 1.0, 0.0, 0.0),
            entry("keys", 2.0, 0.0, 0.0),
            entry("book", 0.0, 1.0, 0.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.names(), vec!["book", "cup", "Keys"]);
    }

    #[test]
    fn find_returns_all_duplicates_in_order() {
        let catalog = Catalog::new(vec![
            entry("keys", 1.0, 0.0, 0.0),
            entry("cup", 0.0, 0.0, 0.0),
            entry("KEYS", 2.0, 0.0, 0.0),
        ]);
        let offsets: Vec<_> = catalog.find("Keys").map(CatalogEntry::offset).collect();
        assert_eq!(offsets, vec![DVec3::X, DVec3::new(2.0, 0.0, 0.0)]);
    }
}
