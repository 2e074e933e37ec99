//! The report pipeline: load the election inputs, build the model and write
//! the HTML pages.

use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use results_report::{contest_detail_path, contest_rcv_path, ModelError, Phrases, Renderer};
use text_diff::print_diff;

pub mod loader;
pub mod tsv;

/// Stat id that carries the continuing-ballots total of each RCV round in
/// the input data.
pub const CONTINUING_STAT_ID: &str = "RSCon";

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Error opening file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading delimited file {path}"))]
    ReadingDelimited { source: csv::Error, path: String },
    #[snafu(display("No delimiter found in the header of {path}"))]
    MissingDelimiter { path: String },
    #[snafu(display(
        "Mismatched columns in {path} (line {lineno}): expected {expected}, found {found}"
    ))]
    MismatchedColumns {
        path: String,
        lineno: usize,
        expected: usize,
        found: usize,
    },
    #[snafu(display(
        "Mismatched RCV row label in {path} (line {lineno}): expected {expected:?}, found {found:?}"
    ))]
    MismatchedRcvRow {
        path: String,
        lineno: usize,
        expected: String,
        found: String,
    },
    #[snafu(display(
        "Mismatched reporting groups in {path}: expected {expected}, found {found}"
    ))]
    MismatchedGroups {
        path: String,
        expected: usize,
        found: usize,
    },
    #[snafu(display("Invalid numeric value {value:?} in {path} (line {lineno})"))]
    InvalidNumber {
        path: String,
        lineno: usize,
        value: String,
    },
    #[snafu(display("Unknown {kind} id {id:?} referenced by {referrer}"))]
    UnknownId {
        kind: &'static str,
        id: String,
        referrer: String,
    },
    #[snafu(display("Error rendering pages"))]
    Rendering { source: ModelError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

pub fn run_report(args: &crate::args::Args) -> ReportResult<()> {
    let input_dir = Path::new(&args.input_dir);
    let loaded = loader::load_election(input_dir)?;
    let loader::LoadedElection {
        election,
        languages,
        translations,
    } = loaded;
    info!(
        "Loaded election {:?} with {} contests",
        election.ballot_title.get(&args.lang),
        election.contests.len()
    );
    if !languages.is_empty() && !languages.iter().any(|l| l == &args.lang) {
        warn!(
            "Language {:?} is not among the declared languages {:?}",
            args.lang, languages
        );
    }

    let phrases = Phrases::new(&args.lang, translations);
    let renderer = Renderer {
        election: &election,
        phrases: &phrases,
        continuing_stat_id: CONTINUING_STAT_ID,
    };

    let out_dir = Path::new(&args.output_dir);
    fs::create_dir_all(out_dir).context(WritingOutputSnafu {
        path: args.output_dir.clone(),
    })?;

    let index = renderer.election_page().context(RenderingSnafu)?;
    write_page(out_dir, "index.html", &index)?;
    let mut num_pages = 1;
    for contest in &election.contests {
        let detail = renderer.contest_detail_page(contest).context(RenderingSnafu)?;
        write_page(out_dir, &contest_detail_path(contest), &detail)?;
        num_pages += 1;
        if contest.is_rcv {
            let rcv_page = renderer.contest_rcv_page(contest).context(RenderingSnafu)?;
            write_page(out_dir, &contest_rcv_path(contest), &rcv_page)?;
            num_pages += 1;
        }
    }
    info!("Wrote {} pages to {}", num_pages, args.output_dir);

    // The reference page, if provided for comparison.
    if let Some(reference) = &args.reference {
        check_reference(reference, &index)?;
    }
    Ok(())
}

fn write_page(out_dir: &Path, name: &str, contents: &str) -> ReportResult<()> {
    let path = out_dir.join(name);
    debug!("writing {}", path.display());
    fs::write(&path, contents).context(WritingOutputSnafu {
        path: path.display().to_string(),
    })
}

fn check_reference(reference_path: &str, generated: &str) -> ReportResult<()> {
    let reference = fs::read_to_string(reference_path).context(OpeningInputSnafu {
        path: reference_path,
    })?;
    if reference != generated {
        warn!("Found differences with the reference page");
        print_diff(reference.as_str(), generated, "\n");
        whatever!("Difference detected between generated page and reference page");
    }
    Ok(())
}
