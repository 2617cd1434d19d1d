use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::TaxonKey;

#[derive(Debug, Error, Diagnostic)]
pub enum BlastatsError {
    #[error("invalid organism name (expected \"Genus species\"): {0}")]
    InvalidOrganism(String),

    #[error("invalid protein sequence: {0}")]
    InvalidSequence(String),

    #[error("invalid {name} threshold {value}: must be within [0, 1]")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("abundance undefined for {taxon}: zero sequenced genomes in baseline")]
    UndefinedAbundance { taxon: TaxonKey },

    #[error("NCBI request failed: {0}")]
    NcbiHttp(String),

    #[error("NCBI returned status {status}: {message}")]
    NcbiStatus { status: u16, message: String },

    #[error("BLAST request failed: {0}")]
    BlastHttp(String),

    #[error("BLAST returned status {status}: {message}")]
    BlastStatus { status: u16, message: String },

    #[error("could not obtain a BLAST request id: {0}")]
    BlastRid(String),

    #[error("BLAST search did not finish: {0}")]
    BlastPending(String),

    #[error("failed to read results file at {0}")]
    ResultsRead(PathBuf),

    #[error("could not parse BLAST XML results: {0}")]
    ResultsParse(String),

    #[error("missing config file blastats.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
