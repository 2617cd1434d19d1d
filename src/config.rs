use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::TaxonKey;
use crate::error::BlastatsError;

/// On-disk shape of `blastats.json`: organisms of interest plus optional
/// threshold overrides. CLI flags take precedence over these values.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub organisms: Vec<OrganismEntry>,
    #[serde(default)]
    pub identity: Option<f64>,
    #[serde(default)]
    pub coverage: Option<f64>,
    #[serde(default)]
    pub evalue: Option<f64>,
    #[serde(default)]
    pub reject_stop_codons: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OrganismEntry {
    Shorthand(String),
    Detailed(OrganismEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OrganismEntryObject {
    pub genus: String,
    pub species: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub organisms: Vec<TaxonKey>,
    pub identity: Option<f64>,
    pub coverage: Option<f64>,
    pub evalue: Option<f64>,
    pub reject_stop_codons: Option<bool>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, BlastatsError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("blastats.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(BlastatsError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| BlastatsError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| BlastatsError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, BlastatsError> {
        let organisms = config
            .organisms
            .into_iter()
            .map(|entry| match entry {
                OrganismEntry::Shorthand(value) => value.parse(),
                OrganismEntry::Detailed(obj) => {
                    format!("{} {}", obj.genus, obj.species).parse()
                }
            })
            .collect::<Result<Vec<TaxonKey>, BlastatsError>>()?;

        Ok(ResolvedConfig {
            organisms,
            identity: config.identity,
            coverage: config.coverage,
            evalue: config.evalue,
            reject_stop_codons: config.reject_stop_codons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_shorthand_and_detailed_entries() {
        let config = Config {
            organisms: vec![
                OrganismEntry::Shorthand("Bacillus cereus".to_string()),
                OrganismEntry::Detailed(OrganismEntryObject {
                    genus: "Bacillus".to_string(),
                    species: "subtilis".to_string(),
                }),
            ],
            identity: Some(0.85),
            coverage: None,
            evalue: None,
            reject_stop_codons: None,
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.organisms.len(), 2);
        assert_eq!(resolved.organisms[0], TaxonKey::new("bacillus", "cereus"));
        assert_eq!(resolved.identity, Some(0.85));
    }

    #[test]
    fn malformed_organism_is_rejected() {
        let config = Config {
            organisms: vec![OrganismEntry::Shorthand("Bacillus".to_string())],
            identity: None,
            coverage: None,
            evalue: None,
            reject_stop_codons: None,
        };
        assert!(ConfigLoader::resolve_config(config).is_err());
    }
}
