use crate::blast::{Alignment, Hsp};
use crate::error::BlastatsError;

/// Which HSP fields back the query-coverage ratio. The two forms are not
/// equivalent: `QuerySpan` is `(query_end - query_start + 1) / query_len`,
/// `SubjectSpan` is the older `(subject_len - subject_start) / query_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverageBasis {
    #[default]
    QuerySpan,
    SubjectSpan,
}

/// Quality thresholds for accepting an alignment as a functional homolog.
/// Identity and coverage are fractions in [0, 1]; all comparisons are strict
/// (a ratio exactly equal to its threshold fails).
#[derive(Debug, Clone)]
pub struct Thresholds {
    identity: f64,
    query_cover: f64,
    evalue: Option<f64>,
    reject_stop_codons: bool,
}

impl Thresholds {
    pub const DEFAULT_IDENTITY: f64 = 0.80;
    pub const DEFAULT_QUERY_COVER: f64 = 0.95;
    pub const DEFAULT_EVALUE: f64 = 1e-5;

    pub fn new(
        identity: f64,
        query_cover: f64,
        evalue: Option<f64>,
        reject_stop_codons: bool,
    ) -> Result<Self, BlastatsError> {
        if !(0.0..=1.0).contains(&identity) {
            return Err(BlastatsError::InvalidThreshold {
                name: "identity",
                value: identity,
            });
        }
        if !(0.0..=1.0).contains(&query_cover) {
            return Err(BlastatsError::InvalidThreshold {
                name: "query coverage",
                value: query_cover,
            });
        }
        Ok(Self {
            identity,
            query_cover,
            evalue,
            reject_stop_codons,
        })
    }

    pub fn identity(&self) -> f64 {
        self.identity
    }

    pub fn query_cover(&self) -> f64 {
        self.query_cover
    }

    pub fn evalue(&self) -> Option<f64> {
        self.evalue
    }

    pub fn reject_stop_codons(&self) -> bool {
        self.reject_stop_codons
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            identity: Self::DEFAULT_IDENTITY,
            query_cover: Self::DEFAULT_QUERY_COVER,
            evalue: Some(Self::DEFAULT_EVALUE),
            reject_stop_codons: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QualityFilter {
    thresholds: Thresholds,
    coverage_basis: CoverageBasis,
}

impl QualityFilter {
    pub fn new(thresholds: Thresholds, coverage_basis: CoverageBasis) -> Self {
        Self {
            thresholds,
            coverage_basis,
        }
    }

    /// Evaluate one alignment against the thresholds. Only the first HSP is
    /// considered; trailing HSPs of the same alignment are ignored (one hit
    /// per alignment, a deliberate scope limit).
    /// An alignment with no HSPs fails.
    pub fn passes(&self, alignment: &Alignment, query_len: u64) -> bool {
        let Some(hsp) = alignment.hsps.first() else {
            return false;
        };
        self.passes_hsp(hsp, query_len)
    }

    fn passes_hsp(&self, hsp: &Hsp, query_len: u64) -> bool {
        if query_len == 0 {
            return false;
        }
        let subject_len = hsp.subject_seq.len() as f64;
        if subject_len == 0.0 {
            return false;
        }

        let identity = hsp.identity as f64 / subject_len;
        if identity <= self.thresholds.identity {
            return false;
        }

        let coverage = match self.coverage_basis {
            CoverageBasis::QuerySpan => {
                (hsp.query_end.saturating_sub(hsp.query_start) + 1) as f64 / query_len as f64
            }
            CoverageBasis::SubjectSpan => {
                (subject_len - hsp.subject_start as f64) / query_len as f64
            }
        };
        if coverage <= self.thresholds.query_cover {
            return false;
        }

        if let Some(e_threshold) = self.thresholds.evalue {
            if hsp.evalue >= e_threshold {
                return false;
            }
        }

        if self.thresholds.reject_stop_codons && hsp.subject_seq.contains('*') {
            return false;
        }

        true
    }
}
