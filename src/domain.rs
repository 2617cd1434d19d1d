use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BlastatsError;

/// Case-insensitive (genus, species) identifier. Both components are stored
/// lowercased so that interest lists, tree lookups and baseline keys compare
/// directly regardless of the casing convention of their source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonKey {
    genus: String,
    species: String,
}

impl TaxonKey {
    pub fn new(genus: &str, species: &str) -> Self {
        Self {
            genus: genus.trim().to_lowercase(),
            species: species.trim().to_lowercase(),
        }
    }

    pub fn genus(&self) -> &str {
        &self.genus
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    /// Query term for NCBI's genome catalog, e.g. `bacillus+cereus`.
    pub fn query_term(&self) -> String {
        format!("{}+{}", self.genus, self.species)
    }
}

impl fmt::Display for TaxonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.genus, self.species)
    }
}

impl FromStr for TaxonKey {
    type Err = BlastatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        let [genus, species] = tokens.as_slice() else {
            return Err(BlastatsError::InvalidOrganism(value.to_string()));
        };
        Ok(Self::new(genus, species))
    }
}

/// A full free-text organism name as reported in an alignment title, e.g.
/// `Bacillus cereus strain ABC`. Kept verbatim for listings and FASTA
/// headers; the first two tokens identify the taxon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganismName(String);

impl OrganismName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The (genus, species) this name belongs to, or `None` when the name
    /// does not carry two tokens. Callers route `None` to the "others"
    /// bucket rather than failing.
    pub fn taxon_key(&self) -> Option<TaxonKey> {
        let mut tokens = self.0.split_whitespace();
        let genus = tokens.next()?;
        let species = tokens.next()?;
        Some(TaxonKey::new(genus, species))
    }

    /// FASTA header form: spaces replaced with underscores.
    pub fn fasta_header(&self) -> String {
        self.0.replace(' ', "_")
    }
}

impl fmt::Display for OrganismName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A protein query sequence validated against the amino-acid alphabet
/// accepted by NCBI BLAST (ambiguity codes, stops and gaps included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinSequence(String);

impl ProteinSequence {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProteinSequence {
    type Err = BlastatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        if normalized.is_empty() {
            return Err(BlastatsError::InvalidSequence(
                "empty sequence".to_string(),
            ));
        }
        let is_valid = normalized
            .chars()
            .all(|ch| matches!(ch, 'A'..='E' | 'F'..='I' | 'K'..='N' | 'P'..='T' | 'U' | 'V' | 'W' | 'Y' | 'Z' | 'X' | '*' | '-'));
        if !is_valid {
            return Err(BlastatsError::InvalidSequence(format!(
                "allowed characters are ABCDEFGHIKLMNPQRSTUVWYZX*- (got {value:?})"
            )));
        }
        Ok(Self(normalized))
    }
}

impl fmt::Display for ProteinSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
