use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::domain::ProteinSequence;
use crate::error::BlastatsError;
use crate::http;

/// One reported match between the query and a database sequence.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Free-text hit description, carrying organism names and database ids.
    pub title: String,
    pub hsps: Vec<Hsp>,
}

/// A high-scoring segment pair within one alignment.
#[derive(Debug, Clone)]
pub struct Hsp {
    /// Aligned subject sequence (may contain gaps and `*` stops).
    pub subject_seq: String,
    /// Start of the alignment in the subject (1-based).
    pub subject_start: u64,
    /// Start of the alignment in the query (1-based).
    pub query_start: u64,
    /// End of the alignment in the query (1-based, inclusive).
    pub query_end: u64,
    /// Number of identical positions.
    pub identity: u64,
    /// Expect value.
    pub evalue: f64,
}

/// A parsed similarity-search result document.
#[derive(Debug, Clone)]
pub struct SearchResultSet {
    /// Length of the query sequence in residues.
    pub query_len: u64,
    /// Alignments in document order.
    pub alignments: Vec<Alignment>,
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)?;
    let content_start = start + open.len();
    let end = xml[content_start..].find(&close)?;
    Some(unescape_xml(&xml[content_start..content_start + end]))
}

/// Resolve the five predefined XML entities in tag text. NCBI titles carry
/// `&amp;` and friends verbatim; `&amp;` goes last so an escaped escape is
/// not unescaped twice.
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn extract_blocks(xml: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut blocks = Vec::new();
    let mut search_from = 0;

    while search_from < xml.len() {
        let start = match xml[search_from..].find(&open) {
            Some(pos) => search_from + pos,
            None => break,
        };
        let content_start = start + open.len();
        let end = match xml[content_start..].find(&close) {
            Some(pos) => content_start + pos,
            None => break,
        };
        blocks.push(xml[content_start..end].to_string());
        search_from = end + close.len();
    }

    blocks
}

/// Parse a BLAST XML document (`-outfmt 5` shape, also what the NCBI URL API
/// returns with `FORMAT_TYPE=XML`). Tag extraction only; the input must be
/// well-formed BLAST XML.
pub fn parse_results_str(xml: &str) -> Result<SearchResultSet, BlastatsError> {
    if !xml.contains("<BlastOutput>") {
        return Err(BlastatsError::ResultsParse(
            "missing <BlastOutput> (is the file empty?)".to_string(),
        ));
    }

    let query_len_str = extract_tag(xml, "BlastOutput_query-len").ok_or_else(|| {
        BlastatsError::ResultsParse("missing <BlastOutput_query-len>".to_string())
    })?;
    let query_len: u64 = query_len_str.trim().parse().map_err(|_| {
        BlastatsError::ResultsParse(format!("invalid query length: {:?}", query_len_str.trim()))
    })?;

    let mut alignments = Vec::new();
    for hit_xml in extract_blocks(xml, "Hit") {
        let title = extract_tag(&hit_xml, "Hit_def").unwrap_or_default();
        let mut hsps = Vec::new();
        for hsp_xml in extract_blocks(&hit_xml, "Hsp") {
            hsps.push(parse_hsp(&hsp_xml)?);
        }
        alignments.push(Alignment { title, hsps });
    }

    Ok(SearchResultSet {
        query_len,
        alignments,
    })
}

fn parse_hsp(hsp_xml: &str) -> Result<Hsp, BlastatsError> {
    let text = |tag: &str| -> Result<String, BlastatsError> {
        extract_tag(hsp_xml, tag)
            .ok_or_else(|| BlastatsError::ResultsParse(format!("missing <{tag}>")))
    };
    let number = |tag: &str| -> Result<u64, BlastatsError> {
        let value = text(tag)?;
        value.trim().parse().map_err(|_| {
            BlastatsError::ResultsParse(format!("invalid <{tag}>: {:?}", value.trim()))
        })
    };

    let evalue_str = text("Hsp_evalue")?;
    let evalue: f64 = evalue_str.trim().parse().map_err(|_| {
        BlastatsError::ResultsParse(format!("invalid <Hsp_evalue>: {:?}", evalue_str.trim()))
    })?;

    Ok(Hsp {
        subject_seq: text("Hsp_hseq")?,
        subject_start: number("Hsp_hit-from")?,
        query_start: number("Hsp_query-from")?,
        query_end: number("Hsp_query-to")?,
        identity: number("Hsp_identity")?,
        evalue,
    })
}

/// Read and parse a results file saved by an earlier search.
pub fn parse_results_file(path: &Path) -> Result<SearchResultSet, BlastatsError> {
    let xml =
        fs::read_to_string(path).map_err(|_| BlastatsError::ResultsRead(path.to_path_buf()))?;
    parse_results_str(&xml)
}

pub trait BlastClient: Send + Sync {
    /// Submit the query against nr and block until the XML result document
    /// is available.
    fn search(&self, sequence: &ProteinSequence) -> Result<String, BlastatsError>;
}

pub struct NcbiBlastClient {
    client: Client,
    base_url: String,
    poll_interval: Duration,
    max_polls: usize,
}

impl NcbiBlastClient {
    pub fn new() -> Result<Self, BlastatsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("blastats/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| BlastatsError::BlastHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| BlastatsError::BlastHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: "https://blast.ncbi.nlm.nih.gov/Blast.cgi".to_string(),
            // NCBI asks clients to poll no more often than once a minute.
            poll_interval: Duration::from_secs(60),
            max_polls: 60,
        })
    }

    fn submit(&self, sequence: &ProteinSequence) -> Result<String, BlastatsError> {
        let response = http::send_with_retries(|| {
            self.client.post(&self.base_url).form(&[
                ("CMD", "Put"),
                ("PROGRAM", "blastp"),
                ("DATABASE", "nr"),
                ("HITLIST_SIZE", "500"),
                ("QUERY", sequence.as_str()),
            ])
        })
        .map_err(|err| BlastatsError::BlastHttp(err.to_string()))?;
        let body = Self::success_text(response)?;
        let rid = extract_rid(&body)?;
        debug!(%rid, "BLAST search submitted");
        Ok(rid)
    }

    fn wait_ready(&self, rid: &str) -> Result<(), BlastatsError> {
        for attempt in 0..self.max_polls {
            let response = http::send_with_retries(|| {
                self.client.get(&self.base_url).query(&[
                    ("CMD", "Get"),
                    ("FORMAT_OBJECT", "SearchInfo"),
                    ("RID", rid),
                ])
            })
            .map_err(|err| BlastatsError::BlastHttp(err.to_string()))?;
            let body = Self::success_text(response)?;
            let status = search_status(&body);
            match status.as_str() {
                "READY" => return Ok(()),
                "FAILED" | "UNKNOWN" => {
                    return Err(BlastatsError::BlastPending(format!(
                        "search {rid} reported status {status}"
                    )));
                }
                _ => {
                    debug!(rid, attempt, %status, "BLAST search still running");
                    thread::sleep(self.poll_interval);
                }
            }
        }
        Err(BlastatsError::BlastPending(format!(
            "search {rid} still not ready after {} polls",
            self.max_polls
        )))
    }

    fn retrieve(&self, rid: &str) -> Result<String, BlastatsError> {
        let response = http::send_with_retries(|| {
            self.client
                .get(&self.base_url)
                .query(&[("CMD", "Get"), ("FORMAT_TYPE", "XML"), ("RID", rid)])
        })
        .map_err(|err| BlastatsError::BlastHttp(err.to_string()))?;
        Self::success_text(response)
    }

    fn success_text(response: reqwest::blocking::Response) -> Result<String, BlastatsError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "BLAST request failed".to_string());
            return Err(BlastatsError::BlastStatus { status, message });
        }
        response
            .text()
            .map_err(|err| BlastatsError::BlastHttp(err.to_string()))
    }
}

/// The request id assigned by a `CMD=Put` submission body.
pub fn extract_rid(body: &str) -> Result<String, BlastatsError> {
    let pattern = Regex::new(r"RID = (\S+)").expect("static pattern");
    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| BlastatsError::BlastRid("submission response carried no RID".to_string()))
}

/// The `Status=` field of a `FORMAT_OBJECT=SearchInfo` poll body, or
/// `UNKNOWN` when the body carries none.
pub fn search_status(body: &str) -> String {
    let pattern = Regex::new(r"Status=(\S+)").expect("static pattern");
    pattern
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

impl BlastClient for NcbiBlastClient {
    fn search(&self, sequence: &ProteinSequence) -> Result<String, BlastatsError> {
        let rid = self.submit(sequence)?;
        self.wait_ready(&rid)?;
        self.retrieve(&rid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_XML: &str = r#"<?xml version="1.0"?>
<BlastOutput>
  <BlastOutput_program>blastp</BlastOutput_program>
  <BlastOutput_query-len>120</BlastOutput_query-len>
  <BlastOutput_iterations>
    <Iteration>
      <Iteration_hits>
        <Hit>
          <Hit_def>chaperone protein [Bacillus cereus strain ABC]</Hit_def>
          <Hit_hsps>
            <Hsp>
              <Hsp_evalue>1e-40</Hsp_evalue>
              <Hsp_query-from>1</Hsp_query-from>
              <Hsp_query-to>120</Hsp_query-to>
              <Hsp_hit-from>1</Hsp_hit-from>
              <Hsp_identity>118</Hsp_identity>
              <Hsp_hseq>MKVLSTR</Hsp_hseq>
            </Hsp>
          </Hit_hsps>
        </Hit>
      </Iteration_hits>
    </Iteration>
  </BlastOutput_iterations>
</BlastOutput>"#;

    #[test]
    fn parse_minimal_document() {
        let results = parse_results_str(MINIMAL_XML).unwrap();
        assert_eq!(results.query_len, 120);
        assert_eq!(results.alignments.len(), 1);
        let alignment = &results.alignments[0];
        assert_eq!(
            alignment.title,
            "chaperone protein [Bacillus cereus strain ABC]"
        );
        let hsp = &alignment.hsps[0];
        assert_eq!(hsp.identity, 118);
        assert_eq!(hsp.query_start, 1);
        assert_eq!(hsp.query_end, 120);
        assert_eq!(hsp.subject_seq, "MKVLSTR");
        assert!((hsp.evalue - 1e-40).abs() < 1e-50);
    }

    #[test]
    fn parse_rejects_non_blast_document() {
        let err = parse_results_str("<html>not blast</html>").unwrap_err();
        assert!(err.to_string().contains("BlastOutput"));
    }

    #[test]
    fn tag_text_entities_are_unescaped() {
        let xml = MINIMAL_XML.replace(
            "chaperone protein",
            "chaperone &amp; transport protein &lt;partial&gt;",
        );
        let results = parse_results_str(&xml).unwrap();
        assert_eq!(
            results.alignments[0].title,
            "chaperone & transport protein <partial> [Bacillus cereus strain ABC]"
        );
    }

    #[test]
    fn escaped_escape_is_unescaped_once() {
        assert_eq!(unescape_xml("a &amp;lt; b"), "a &lt; b");
        assert_eq!(unescape_xml("Q&amp;A"), "Q&A");
    }

    #[test]
    fn rid_extraction() {
        let body = "<!--QBlastInfoBegin\n    RID = ABC123XYZ\n    RTOE = 25\nQBlastInfoEnd-->";
        assert_eq!(extract_rid(body).unwrap(), "ABC123XYZ");

        let err = extract_rid("<html>no id here</html>").unwrap_err();
        assert!(matches!(err, BlastatsError::BlastRid(_)));
    }

    #[test]
    fn status_extraction() {
        let body = "QBlastInfoBegin\n\tStatus=WAITING\nQBlastInfoEnd";
        assert_eq!(search_status(body), "WAITING");
        assert_eq!(search_status("no status field"), "UNKNOWN");
    }
}
