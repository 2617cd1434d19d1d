use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::abundance::{abundance, percent};
use crate::blast::SearchResultSet;
use crate::domain::TaxonKey;
use crate::extract::{ExtractionPolicy, OrganismExtractor};
use crate::filter::{CoverageBasis, QualityFilter, Thresholds};
use crate::taxonomy::TaxonomyTree;

/// Final analysis output. Immutable once produced; a pure function of the
/// inputs, so identical inputs yield identical reports.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Distinct organisms found across all passing alignments.
    pub total: usize,
    /// Per-genus breakdown, in interest-list order.
    pub genera: Vec<GenusReport>,
    /// Organisms that matched but fall outside all taxa of interest (or
    /// could not be resolved to a genus/species), sorted by name.
    pub others: Vec<String>,
    /// Data-quality conditions encountered: missing or zero genome-count
    /// baselines. Never fatal.
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenusReport {
    pub genus: String,
    pub species: Vec<SpeciesReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesReport {
    pub species: String,
    pub hits: usize,
    /// `None` when the baseline has no usable entry for this species; the
    /// species is then excluded from abundance reporting but keeps its raw
    /// hit count.
    pub genome_count: Option<u64>,
    pub abundance: Option<f64>,
    pub percent: Option<u32>,
    /// Matched (organism, subject sequence) pairs, sorted by organism name.
    pub matches: Vec<MatchedSequence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedSequence {
    pub organism: String,
    pub sequence: String,
}

/// Drives the classification pipeline: quality filter, organism extraction,
/// taxonomy accumulation, abundance against the genome-count baseline.
/// Performs no I/O; every invocation gets fresh accumulator state, so
/// concurrent analyses are independent.
#[derive(Debug, Clone)]
pub struct Analyzer {
    thresholds: Thresholds,
    coverage_basis: CoverageBasis,
    policy: ExtractionPolicy,
}

impl Analyzer {
    pub fn new(
        thresholds: Thresholds,
        coverage_basis: CoverageBasis,
        policy: ExtractionPolicy,
    ) -> Self {
        Self {
            thresholds,
            coverage_basis,
            policy,
        }
    }

    pub fn analyze(
        &self,
        results: &SearchResultSet,
        interest: &[TaxonKey],
        baseline: &HashMap<TaxonKey, u64>,
    ) -> AnalysisReport {
        let filter = QualityFilter::new(self.thresholds.clone(), self.coverage_basis);
        let mut extractor = OrganismExtractor::new(self.policy);
        let mut tree = TaxonomyTree::new();

        let interest_set: HashSet<&TaxonKey> = interest.iter().collect();
        for key in interest {
            tree.ensure_path(key);
        }

        let mut total: HashSet<String> = HashSet::new();
        let mut others: Vec<String> = Vec::new();

        for alignment in &results.alignments {
            if !filter.passes(alignment, results.query_len) {
                continue;
            }
            // passes() guarantees at least one HSP
            let subject_seq = &alignment.hsps[0].subject_seq;
            for name in extractor.extract(&alignment.title) {
                if !total.insert(name.as_str().to_string()) {
                    continue;
                }
                match name.taxon_key() {
                    Some(key) => {
                        if !interest_set.contains(&key) {
                            others.push(name.as_str().to_string());
                        }
                        tree.add(&key, name, subject_seq.clone());
                    }
                    None => {
                        debug!(name = name.as_str(), "organism name not genus/species shaped");
                        others.push(name.as_str().to_string());
                    }
                }
            }
        }

        let mut diagnostics = Vec::new();
        let genera = self.build_genera(interest, baseline, &tree, &mut diagnostics);
        others.sort();

        AnalysisReport {
            total: total.len(),
            genera,
            others,
            diagnostics,
        }
    }

    fn build_genera(
        &self,
        interest: &[TaxonKey],
        baseline: &HashMap<TaxonKey, u64>,
        tree: &TaxonomyTree,
        diagnostics: &mut Vec<String>,
    ) -> Vec<GenusReport> {
        // Genus order follows the interest list, deduplicated by first
        // occurrence; species keep the order given within their genus.
        let mut genus_order: Vec<&str> = Vec::new();
        let mut by_genus: HashMap<&str, Vec<&TaxonKey>> = HashMap::new();
        let mut seen_keys: HashSet<&TaxonKey> = HashSet::new();
        for key in interest {
            if !seen_keys.insert(key) {
                continue;
            }
            if !by_genus.contains_key(key.genus()) {
                genus_order.push(key.genus());
            }
            by_genus.entry(key.genus()).or_default().push(key);
        }

        genus_order
            .into_iter()
            .map(|genus| GenusReport {
                genus: genus.to_string(),
                species: by_genus[genus]
                    .iter()
                    .map(|key| self.build_species(key, baseline, tree, diagnostics))
                    .collect(),
            })
            .collect()
    }

    fn build_species(
        &self,
        key: &TaxonKey,
        baseline: &HashMap<TaxonKey, u64>,
        tree: &TaxonomyTree,
        diagnostics: &mut Vec<String>,
    ) -> SpeciesReport {
        let hits = tree.count(key);
        let matches = tree
            .sorted_entries(key)
            .into_iter()
            .map(|(name, sequence)| MatchedSequence {
                organism: name.as_str().to_string(),
                sequence,
            })
            .collect();

        let (genome_count, ratio) = match baseline.get(key) {
            None => {
                diagnostics.push(format!(
                    "could not determine genome count for {key}; dropped from abundance reporting"
                ));
                (None, None)
            }
            Some(&count) => match abundance(key, hits, count) {
                Ok(ratio) => (Some(count), Some(ratio)),
                Err(err) => {
                    diagnostics.push(err.to_string());
                    (None, None)
                }
            },
        };

        SpeciesReport {
            species: key.species().to_string(),
            hits,
            genome_count,
            abundance: ratio,
            percent: ratio.map(percent),
            matches,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(
            Thresholds::default(),
            CoverageBasis::default(),
            ExtractionPolicy::default(),
        )
    }
}

/// Convenience enumeration of all matched (organism, sequence) pairs in
/// report order, for FASTA export.
pub fn matched_sequences(report: &AnalysisReport) -> impl Iterator<Item = &MatchedSequence> {
    report
        .genera
        .iter()
        .flat_map(|genus| genus.species.iter())
        .flat_map(|species| species.matches.iter())
}
