use assert_matches::assert_matches;

use blastats::blast::{Alignment, Hsp};
use blastats::error::BlastatsError;
use blastats::filter::{CoverageBasis, QualityFilter, Thresholds};

fn hsp() -> Hsp {
    Hsp {
        subject_seq: "A".repeat(100),
        subject_start: 1,
        query_start: 1,
        query_end: 100,
        identity: 99,
        evalue: 1e-40,
    }
}

fn alignment(hsps: Vec<Hsp>) -> Alignment {
    Alignment {
        title: "protein [Bacillus cereus strain X]".to_string(),
        hsps,
    }
}

#[test]
fn thresholds_outside_unit_interval_rejected() {
    let err = Thresholds::new(1.5, 0.95, None, false).unwrap_err();
    assert_matches!(
        err,
        BlastatsError::InvalidThreshold {
            name: "identity",
            ..
        }
    );
    let err = Thresholds::new(0.8, 1.01, None, false).unwrap_err();
    assert_matches!(
        err,
        BlastatsError::InvalidThreshold {
            name: "query coverage",
            ..
        }
    );
}

#[test]
fn identity_exactly_at_threshold_fails() {
    let filter = QualityFilter::new(
        Thresholds::new(0.8, 0.5, None, false).unwrap(),
        CoverageBasis::QuerySpan,
    );
    let mut exact = hsp();
    exact.identity = 80;
    assert!(!filter.passes(&alignment(vec![exact]), 100));

    let mut above = hsp();
    above.identity = 81;
    assert!(filter.passes(&alignment(vec![above]), 100));
}

#[test]
fn coverage_exactly_at_threshold_fails() {
    let filter = QualityFilter::new(
        Thresholds::new(0.5, 0.95, None, false).unwrap(),
        CoverageBasis::QuerySpan,
    );
    // span 95 of 100 = exactly 0.95
    let mut exact = hsp();
    exact.query_start = 1;
    exact.query_end = 95;
    assert!(!filter.passes(&alignment(vec![exact]), 100));

    let mut above = hsp();
    above.query_start = 1;
    above.query_end = 96;
    assert!(filter.passes(&alignment(vec![above]), 100));
}

#[test]
fn alignment_without_hsps_fails() {
    let filter = QualityFilter::new(Thresholds::default(), CoverageBasis::QuerySpan);
    assert!(!filter.passes(&alignment(vec![]), 100));
}

#[test]
fn default_thresholds_reject_stop_codons() {
    let filter = QualityFilter::new(Thresholds::default(), CoverageBasis::QuerySpan);
    let mut with_stop = hsp();
    with_stop.subject_seq.replace_range(50..51, "*");
    assert!(!filter.passes(&alignment(vec![with_stop]), 100));
    assert!(filter.passes(&alignment(vec![hsp()]), 100));
}
