use std::collections::HashMap;

use crate::domain::{OrganismName, TaxonKey};

/// Matches accumulated during one analysis run, keyed genus then species
/// (normalized, lowercase). Each leaf holds the (name, subject sequence)
/// pairs discovered for that species. Created empty per run and discarded
/// with the report.
#[derive(Debug, Default)]
pub struct TaxonomyTree {
    genera: HashMap<String, HashMap<String, Vec<(OrganismName, String)>>>,
}

impl TaxonomyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently create empty containers for a genus/species pair. Used
    /// to pre-populate organisms of interest so "zero hits" is representable
    /// and later lookups need no existence checks.
    pub fn ensure_path(&mut self, key: &TaxonKey) {
        self.genera
            .entry(key.genus().to_string())
            .or_default()
            .entry(key.species().to_string())
            .or_default();
    }

    /// Append a match under genus/species, creating the path if absent.
    /// Species discovered only through matches (never declared of interest)
    /// land in their own branch and surface as "others" in the report.
    pub fn add(&mut self, key: &TaxonKey, name: OrganismName, payload: String) {
        self.genera
            .entry(key.genus().to_string())
            .or_default()
            .entry(key.species().to_string())
            .or_default()
            .push((name, payload));
    }

    /// Number of entries at the path; 0 when the path is absent.
    pub fn count(&self, key: &TaxonKey) -> usize {
        self.genera
            .get(key.genus())
            .and_then(|species| species.get(key.species()))
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Entries at the path in lexicographic order by organism name; empty
    /// when the path is absent.
    pub fn sorted_entries(&self, key: &TaxonKey) -> Vec<(OrganismName, String)> {
        let mut entries = self
            .genera
            .get(key.genus())
            .and_then(|species| species.get(key.species()))
            .cloned()
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        entries
    }
}
