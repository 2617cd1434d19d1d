use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::TaxonKey;
use crate::error::BlastatsError;
use crate::http;

/// Why a single organism's genome count could not be obtained. One failed
/// organism never aborts the batch; it is dropped with a diagnostic.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not reach the genome catalog: {0}")]
    Unreachable(String),

    #[error("organism not found in the genome catalog")]
    NotFound,

    #[error("catalog page did not match the expected shape: {0}")]
    UnexpectedShape(String),
}

pub trait GenomeCatalog: Send + Sync {
    /// Number of sequenced genome assemblies known for the organism.
    fn fetch_count(&self, taxon: &TaxonKey) -> Result<u64, FetchError>;
}

/// Scrapes the per-organism overview page of NCBI's genome catalog. The page
/// is free-text HTML, so this interface is inherently fragile; failures are
/// classified, not retried here.
pub struct NcbiGenomeCatalog {
    client: Client,
    base_url: String,
}

impl NcbiGenomeCatalog {
    pub fn new() -> Result<Self, BlastatsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("blastats/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| BlastatsError::NcbiHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| BlastatsError::NcbiHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: "https://www.ncbi.nlm.nih.gov/genome".to_string(),
        })
    }
}

impl GenomeCatalog for NcbiGenomeCatalog {
    fn fetch_count(&self, taxon: &TaxonKey) -> Result<u64, FetchError> {
        let url = format!("{}/?term={}", self.base_url, taxon.query_term());
        let response = http::send_with_retries(|| self.client.get(&url))
            .map_err(|err| FetchError::Unreachable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(FetchError::Unreachable(format!(
                "status {}",
                response.status().as_u16()
            )));
        }
        let page = response
            .text()
            .map_err(|err| FetchError::Unreachable(err.to_string()))?;
        parse_catalog_page(&page)
    }
}

/// Classify one catalog page body. The overview page exists only for
/// organisms the catalog knows; a search term it cannot resolve renders a
/// result listing instead, which counts as `NotFound`.
pub fn parse_catalog_page(page: &str) -> Result<u64, FetchError> {
    if !page.contains("Organism Overview") {
        return Err(FetchError::NotFound);
    }

    let pattern = Regex::new(r"genome assemblies: (\d+)").expect("static pattern");
    let captures = pattern.captures(page).ok_or_else(|| {
        FetchError::UnexpectedShape("no \"genome assemblies\" figure on page".to_string())
    })?;
    captures[1]
        .parse()
        .map_err(|_| FetchError::UnexpectedShape("unparseable assembly count".to_string()))
}

/// Fetch the genome-count baseline for every organism of interest, one task
/// per organism joined before returning. Returns the baseline plus the
/// surviving interest list: organisms whose fetch failed are dropped with a
/// warning and the run continues with whatever succeeded.
pub fn fetch_baseline(
    catalog: &dyn GenomeCatalog,
    interest: &[TaxonKey],
) -> (HashMap<TaxonKey, u64>, Vec<TaxonKey>) {
    let results: Vec<(TaxonKey, Result<u64, FetchError>)> = thread::scope(|scope| {
        let handles: Vec<_> = interest
            .iter()
            .map(|taxon| scope.spawn(move || (taxon.clone(), catalog.fetch_count(taxon))))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("catalog fetch task panicked"))
            .collect()
    });

    let mut baseline = HashMap::new();
    let mut surviving = Vec::new();
    for (taxon, result) in results {
        match result {
            Ok(count) => {
                debug!(%taxon, count, "genome count fetched");
                baseline.insert(taxon.clone(), count);
                surviving.push(taxon);
            }
            Err(err) => {
                warn!(%taxon, %err, "dropping organism from analysis");
            }
        }
    }
    (baseline, surviving)
}
