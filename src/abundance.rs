use crate::domain::TaxonKey;
use crate::error::BlastatsError;

/// Fraction of sequenced genomes for a species in which the query protein
/// was detected. A zero denominator is a data-quality problem, not a zero
/// result, and is reported as such.
pub fn abundance(taxon: &TaxonKey, hits: usize, genome_count: u64) -> Result<f64, BlastatsError> {
    if genome_count == 0 {
        return Err(BlastatsError::UndefinedAbundance {
            taxon: taxon.clone(),
        });
    }
    Ok(hits as f64 / genome_count as f64)
}

/// Display percentage, rounded to the nearest whole percent.
pub fn percent(abundance: f64) -> u32 {
    (abundance * 100.0).round() as u32
}
