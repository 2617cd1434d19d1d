use std::collections::HashSet;

use regex::Regex;

use crate::domain::OrganismName;

/// How organism names are recovered from a free-text alignment title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionPolicy {
    /// Collect every bracketed `[...]` substring; a title may name several
    /// organisms hit by the same alignment set.
    #[default]
    Bracket,
    /// Take the description after the last `|` database identifier; at most
    /// one organism per title.
    Prefix,
}

/// Extracts organism names from alignment titles. Holds per-run state for
/// the prefix policy's duplicate handling, so one extractor lives exactly as
/// long as one analysis run.
#[derive(Debug)]
pub struct OrganismExtractor {
    policy: ExtractionPolicy,
    bracket_pattern: Regex,
    seen: HashSet<String>,
}

impl OrganismExtractor {
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self {
            policy,
            bracket_pattern: Regex::new(r"\[(.*?)\]").expect("static pattern"),
            seen: HashSet::new(),
        }
    }

    /// Zero or more organism names found in `title`. A title yielding no
    /// valid candidate is not an error, just zero matches.
    pub fn extract(&mut self, title: &str) -> Vec<OrganismName> {
        match self.policy {
            ExtractionPolicy::Bracket => self.extract_bracketed(title),
            ExtractionPolicy::Prefix => self.extract_prefixed(title).into_iter().collect(),
        }
    }

    /// Names are filtered to ignore short names like `[Bacillus cereus]`,
    /// names containing "group", and names repeated within a single title.
    fn extract_bracketed(&self, title: &str) -> Vec<OrganismName> {
        let mut names: Vec<&str> = Vec::new();
        for caps in self.bracket_pattern.captures_iter(title) {
            let Some(candidate) = caps.get(1) else {
                continue;
            };
            let candidate = candidate.as_str();
            if names.contains(&candidate) {
                continue;
            }
            if candidate.contains("group") {
                continue;
            }
            if candidate.split_whitespace().count() <= 2 {
                continue;
            }
            names.push(candidate);
        }
        names.into_iter().map(OrganismName::new).collect()
    }

    /// The description follows the last `|`-delimited database id and runs to
    /// the first comma; trailing "genome" / "complete" / "chromosome"
    /// qualifiers are stripped. A name already produced earlier in the run is
    /// uniquified with a `*` marker rather than dropped, so per-match detail
    /// is retained.
    fn extract_prefixed(&mut self, title: &str) -> Option<OrganismName> {
        let description = title.rsplit('|').next().unwrap_or(title);
        let description = description.split(',').next().unwrap_or(description);

        let mut tokens: Vec<&str> = description.split_whitespace().collect();
        while let Some(last) = tokens.last() {
            let qualifier = matches!(
                last.trim_end_matches('.').to_lowercase().as_str(),
                "genome" | "complete" | "chromosome"
            );
            if !qualifier {
                break;
            }
            tokens.pop();
        }
        if tokens.len() < 2 {
            return None;
        }

        let mut name = tokens.join(" ");
        while self.seen.contains(&name) {
            name.push('*');
        }
        self.seen.insert(name.clone());
        Some(OrganismName::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_policy_filters_group_and_short_names() {
        let mut extractor = OrganismExtractor::new(ExtractionPolicy::Bracket);
        let names = extractor.extract(
            "hypothetical protein [Bacillus cereus group][Bacillus cereus strain ABC][Bacillus]",
        );
        let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Bacillus cereus strain ABC"]);
    }

    #[test]
    fn bracket_policy_skips_intra_title_duplicates() {
        let mut extractor = OrganismExtractor::new(ExtractionPolicy::Bracket);
        let names = extractor
            .extract("[Bacillus cereus strain X] protein [Bacillus cereus strain X]");
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn prefix_policy_takes_last_description() {
        let mut extractor = OrganismExtractor::new(ExtractionPolicy::Prefix);
        let names =
            extractor.extract("gi|1234|ref|NC_000001| Bacillus subtilis strain 168, complete genome");
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].as_str(), "Bacillus subtilis strain 168");
    }

    #[test]
    fn prefix_policy_strips_trailing_qualifiers() {
        let mut extractor = OrganismExtractor::new(ExtractionPolicy::Prefix);
        let names = extractor.extract("gi|99|emb|X| Bacillus anthracis str. Ames chromosome");
        assert_eq!(names[0].as_str(), "Bacillus anthracis str. Ames");
    }

    #[test]
    fn prefix_policy_uniquifies_cross_title_duplicates() {
        let mut extractor = OrganismExtractor::new(ExtractionPolicy::Prefix);
        let first = extractor.extract("gi|1|ref|A| Bacillus cereus ATCC 14579");
        let second = extractor.extract("gi|2|ref|B| Bacillus cereus ATCC 14579");
        assert_eq!(first[0].as_str(), "Bacillus cereus ATCC 14579");
        assert_eq!(second[0].as_str(), "Bacillus cereus ATCC 14579*");
    }
}
