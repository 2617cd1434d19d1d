use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blastats::analyzer::Analyzer;
use blastats::blast::{self, BlastClient, NcbiBlastClient};
use blastats::config::ConfigLoader;
use blastats::domain::{ProteinSequence, TaxonKey};
use blastats::error::BlastatsError;
use blastats::extract::ExtractionPolicy;
use blastats::filter::{CoverageBasis, Thresholds};
use blastats::genomes::{NcbiGenomeCatalog, fetch_baseline};
use blastats::output;

#[derive(Parser)]
#[command(name = "blastats")]
#[command(about = "See how your protein of interest is distributed among related organisms")]
#[command(version, author)]
struct Cli {
    /// BLAST this protein sequence against NCBI nr before analyzing
    #[arg(long, value_name = "SEQUENCE")]
    www: Option<String>,

    /// BLAST XML results file to analyze (and to save --www results to)
    #[arg(long, default_value = "blast_results.xml")]
    results: PathBuf,

    /// Organism of interest as "Genus species" (repeatable)
    #[arg(long = "organism", value_name = "NAME")]
    organisms: Vec<String>,

    /// Config file with organisms and threshold overrides
    #[arg(long)]
    config: Option<String>,

    /// Required identity fraction between query and subject
    #[arg(long)]
    identity: Option<f64>,

    /// Required query coverage fraction
    #[arg(long)]
    coverage: Option<f64>,

    /// Maximum accepted expect value
    #[arg(long)]
    evalue: Option<f64>,

    /// Accept subjects containing stop-codon artifacts
    #[arg(long)]
    allow_stop_codons: bool,

    /// Reject subjects containing stop-codon artifacts, even when the config
    /// file allows them
    #[arg(long, conflicts_with = "allow_stop_codons")]
    reject_stop_codons: bool,

    /// Use the subject-span coverage formula instead of the query span
    #[arg(long)]
    subject_coverage: bool,

    /// Extract one organism per title from the description prefix instead of
    /// collecting bracketed names
    #[arg(long)]
    prefix_names: bool,

    /// Print the full list of organisms in which the protein was found
    #[arg(short = 'l', long)]
    list: bool,

    /// Save matched sequences as FASTA to this file
    #[arg(long, value_name = "FILE")]
    fasta: Option<PathBuf>,

    /// Print the report as JSON instead of the tree
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<BlastatsError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BlastatsError) -> u8 {
    match error {
        BlastatsError::MissingConfig
        | BlastatsError::ConfigRead(_)
        | BlastatsError::ConfigParse(_)
        | BlastatsError::ResultsRead(_)
        | BlastatsError::ResultsParse(_) => 2,
        BlastatsError::NcbiHttp(_)
        | BlastatsError::NcbiStatus { .. }
        | BlastatsError::BlastHttp(_)
        | BlastatsError::BlastStatus { .. }
        | BlastatsError::BlastRid(_)
        | BlastatsError::BlastPending(_) => 3,
        _ => 1,
    }
}

/// CLI stop-codon flags win over the config value; the default rejects.
fn resolve_stop_codons(allow_flag: bool, reject_flag: bool, config: Option<bool>) -> bool {
    if allow_flag {
        return false;
    }
    if reject_flag {
        return true;
    }
    config.unwrap_or(true)
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Config file is optional unless asked for explicitly; CLI flags win.
    let config = match &cli.config {
        Some(path) => Some(ConfigLoader::resolve(Some(path)).into_diagnostic()?),
        None => match ConfigLoader::resolve(None) {
            Ok(resolved) => Some(resolved),
            Err(BlastatsError::MissingConfig) => None,
            Err(err) => return Err(err).into_diagnostic(),
        },
    };

    let mut interest: Vec<TaxonKey> = cli
        .organisms
        .iter()
        .map(|name| name.parse())
        .collect::<Result<_, BlastatsError>>()
        .into_diagnostic()?;
    if interest.is_empty() {
        if let Some(config) = &config {
            interest = config.organisms.clone();
        }
    }
    if interest.is_empty() {
        return Err(miette::Report::msg(
            "no organisms of interest (pass --organism \"Genus species\" or add them to blastats.json)",
        ));
    }

    let pick = |flag: Option<f64>, from_config: Option<f64>, fallback: f64| {
        flag.or(from_config).unwrap_or(fallback)
    };
    let config_ref = config.as_ref();
    let thresholds = Thresholds::new(
        pick(
            cli.identity,
            config_ref.and_then(|c| c.identity),
            Thresholds::DEFAULT_IDENTITY,
        ),
        pick(
            cli.coverage,
            config_ref.and_then(|c| c.coverage),
            Thresholds::DEFAULT_QUERY_COVER,
        ),
        Some(pick(
            cli.evalue,
            config_ref.and_then(|c| c.evalue),
            Thresholds::DEFAULT_EVALUE,
        )),
        resolve_stop_codons(
            cli.allow_stop_codons,
            cli.reject_stop_codons,
            config_ref.and_then(|c| c.reject_stop_codons),
        ),
    )
    .into_diagnostic()?;

    if let Some(sequence) = &cli.www {
        let sequence: ProteinSequence = sequence.parse().into_diagnostic()?;
        info!("BLASTing sequence at NCBI...");
        let client = NcbiBlastClient::new().into_diagnostic()?;
        let xml = client.search(&sequence).into_diagnostic()?;
        fs::write(&cli.results, &xml)
            .map_err(|err| BlastatsError::Filesystem(err.to_string()))
            .into_diagnostic()?;
        info!(path = %cli.results.display(), "results saved");
    }

    info!("Parsing BLAST results...");
    let results = blast::parse_results_file(&cli.results).into_diagnostic()?;

    info!("Retrieving genome counts from NCBI...");
    let catalog = NcbiGenomeCatalog::new().into_diagnostic()?;
    let (baseline, surviving) = fetch_baseline(&catalog, &interest);

    let coverage_basis = if cli.subject_coverage {
        CoverageBasis::SubjectSpan
    } else {
        CoverageBasis::QuerySpan
    };
    let policy = if cli.prefix_names {
        ExtractionPolicy::Prefix
    } else {
        ExtractionPolicy::Bracket
    };

    let analyzer = Analyzer::new(thresholds, coverage_basis, policy);
    let report = analyzer.analyze(&results, &surviving, &baseline);

    if cli.json {
        output::print_json(&report).into_diagnostic()?;
    } else {
        print!("{}", output::render_tree(&report));
        if cli.list {
            print!("{}", output::render_details(&report));
        }
    }

    if let Some(path) = &cli.fasta {
        output::write_fasta(&report, path).into_diagnostic()?;
        info!(path = %path.display(), "matched sequences saved");
    }

    Ok(())
}
