use clap::Parser;

/// This is an election results report generator.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (directory path) The directory containing the election input data:
    /// election.json plus the resultdata/ directory with the contest status
    /// file and the per-contest results files.
    #[clap(short, long, value_parser)]
    pub input_dir: String,

    /// (directory path) Where the generated HTML pages are written. The
    /// directory is created if it does not exist.
    #[clap(short, long, value_parser, default_value = "out")]
    pub output_dir: String,

    /// (language code, default en) The language used when picking translated
    /// text out of the input data.
    #[clap(short, long, value_parser, default_value = "en")]
    pub lang: String,

    /// (file path) A reference copy of the summary page. If provided,
    /// votereport will check that the generated page matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
