use assert_matches::assert_matches;

use blastats::config::ConfigLoader;
use blastats::domain::TaxonKey;
use blastats::error::BlastatsError;

#[test]
fn resolve_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blastats.json");
    std::fs::write(
        &path,
        r#"{
            "organisms": [
                "Bacillus cereus",
                { "genus": "Bacillus", "species": "subtilis" }
            ],
            "identity": 0.85,
            "evalue": 1e-6
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(
        resolved.organisms,
        vec![
            TaxonKey::new("bacillus", "cereus"),
            TaxonKey::new("bacillus", "subtilis"),
        ]
    );
    assert_eq!(resolved.identity, Some(0.85));
    assert_eq!(resolved.coverage, None);
    assert_eq!(resolved.evalue, Some(1e-6));
}

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blastats.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, BlastatsError::ConfigParse(_));
}

#[test]
fn one_word_organism_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blastats.json");
    std::fs::write(&path, r#"{ "organisms": ["Bacillus"] }"#).unwrap();

    let err = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap_err();
    assert_matches!(err, BlastatsError::InvalidOrganism(_));
}
