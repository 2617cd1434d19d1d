use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::analyzer::{AnalysisReport, matched_sequences};
use crate::domain::OrganismName;
use crate::error::BlastatsError;

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The distribution banner tree:
///
/// ```text
/// ==============================
/// Total: 42
/// |-Bacillus
/// |---cereus: 25%        3/12
/// |---subtilis: 5%       1/20
/// |-Other: 2
/// ==============================
/// ```
pub fn render_tree(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "==============================");
    let _ = writeln!(out, "Total: {}", report.total);
    for genus in &report.genera {
        let _ = writeln!(out, "|-{}", capitalize(&genus.genus));
        for species in &genus.species {
            match (species.percent, species.genome_count) {
                (Some(pct), Some(genomes)) => {
                    let _ = writeln!(
                        out,
                        "|---{}: {}%\t\t{}/{}",
                        species.species, pct, species.hits, genomes
                    );
                }
                _ => {
                    let _ = writeln!(
                        out,
                        "|---{}: {} hits\t\t(genome count unavailable)",
                        species.species, species.hits
                    );
                }
            }
        }
    }
    let _ = writeln!(out, "|-Other: {}", report.others.len());
    let _ = writeln!(out, "==============================");
    for diagnostic in &report.diagnostics {
        let _ = writeln!(out, "Note: {diagnostic}");
    }
    out
}

/// Full per-species strain listing, plus the others bucket.
pub fn render_details(report: &AnalysisReport) -> String {
    let mut out = String::new();
    for genus in &report.genera {
        let genus_name = capitalize(&genus.genus);
        let _ = writeln!(out, "\n{genus_name}\n==============================");
        for species in &genus.species {
            let _ = writeln!(out, "\n{}\n------------------------------", species.species);
            for matched in &species.matches {
                let _ = writeln!(out, "{}", matched.organism);
            }
        }
    }
    if !report.others.is_empty() {
        let _ = writeln!(out, "\nOther\n==============================");
        for name in &report.others {
            let _ = writeln!(out, "{name}");
        }
    }
    out
}

/// Write every matched (organism, sequence) pair as a FASTA record, header
/// being the organism name with spaces replaced by underscores.
pub fn write_fasta(report: &AnalysisReport, path: &Path) -> Result<(), BlastatsError> {
    let mut file = File::create(path).map_err(|err| BlastatsError::Filesystem(err.to_string()))?;
    for matched in matched_sequences(report) {
        let header = OrganismName::new(matched.organism.clone()).fasta_header();
        writeln!(file, ">{header}\n{}\n", matched.sequence)
            .map_err(|err| BlastatsError::Filesystem(err.to_string()))?;
    }
    Ok(())
}

/// Print the report as pretty JSON on stdout.
pub fn print_json(report: &AnalysisReport) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    let mut stdout = io::stdout();
    stdout.write_all(json.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{GenusReport, MatchedSequence, SpeciesReport};

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            total: 3,
            genera: vec![GenusReport {
                genus: "bacillus".to_string(),
                species: vec![SpeciesReport {
                    species: "cereus".to_string(),
                    hits: 1,
                    genome_count: Some(4),
                    abundance: Some(0.25),
                    percent: Some(25),
                    matches: vec![MatchedSequence {
                        organism: "Bacillus cereus strain ABC".to_string(),
                        sequence: "MKVL".to_string(),
                    }],
                }],
            }],
            others: vec!["Clostridium botulinum A".to_string()],
            diagnostics: vec![],
        }
    }

    #[test]
    fn tree_shows_percent_and_counts() {
        let text = render_tree(&sample_report());
        assert!(text.contains("Total: 3"));
        assert!(text.contains("|-Bacillus"));
        assert!(text.contains("|---cereus: 25%\t\t1/4"));
        assert!(text.contains("|-Other: 1"));
    }

    #[test]
    fn details_list_strains() {
        let text = render_details(&sample_report());
        assert!(text.contains("Bacillus cereus strain ABC"));
        assert!(text.contains("Clostridium botulinum A"));
    }

    #[test]
    fn fasta_headers_use_underscores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sequences.fa");
        write_fasta(&sample_report(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(">Bacillus_cereus_strain_ABC\nMKVL\n"));
    }
}
