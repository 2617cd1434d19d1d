use assert_matches::assert_matches;

use blastats::domain::{OrganismName, ProteinSequence, TaxonKey};
use blastats::error::BlastatsError;

#[test]
fn taxon_key_parse_valid() {
    let key: TaxonKey = "Bacillus cereus".parse().unwrap();
    assert_eq!(key.genus(), "bacillus");
    assert_eq!(key.species(), "cereus");
    assert_eq!(key.to_string(), "bacillus cereus");
    assert_eq!(key.query_term(), "bacillus+cereus");
}

#[test]
fn taxon_key_parse_invalid() {
    let err = "Bacillus".parse::<TaxonKey>().unwrap_err();
    assert_matches!(err, BlastatsError::InvalidOrganism(_));
    let err = "Bacillus cereus group".parse::<TaxonKey>().unwrap_err();
    assert_matches!(err, BlastatsError::InvalidOrganism(_));
}

#[test]
fn taxon_key_is_case_insensitive() {
    let upper: TaxonKey = "BACILLUS CEREUS".parse().unwrap();
    let lower: TaxonKey = "bacillus cereus".parse().unwrap();
    assert_eq!(upper, lower);
}

#[test]
fn organism_name_derives_taxon_from_first_two_tokens() {
    let name = OrganismName::new("Bacillus thuringiensis serovar kurstaki");
    assert_eq!(
        name.taxon_key(),
        Some(TaxonKey::new("bacillus", "thuringiensis"))
    );
}

#[test]
fn organism_name_fasta_header() {
    let name = OrganismName::new("Bacillus cereus strain ABC");
    assert_eq!(name.fasta_header(), "Bacillus_cereus_strain_ABC");
}

#[test]
fn protein_sequence_normalizes_and_validates() {
    let seq: ProteinSequence = "mkvl str".parse().unwrap();
    assert_eq!(seq.as_str(), "MKVLSTR");

    let err = "MKV7".parse::<ProteinSequence>().unwrap_err();
    assert_matches!(err, BlastatsError::InvalidSequence(_));
}
