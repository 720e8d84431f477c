use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Score a multiple-choice question CSV with a local language model
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "mcqeval",
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// CSV with id, category, question and options columns
    #[arg(allow_hyphen_values = true)]
    pub input: PathBuf,

    /// Where to write the table with the answer column
    #[arg(allow_hyphen_values = true)]
    pub output: PathBuf,
}

impl Cli {
    /// Parses the process arguments. `None` means they were not exactly two
    /// paths; the caller prints [`usage`] and exits.
    ///
    /// Every argument after the program name is a path, including ones that
    /// start with `-` and a bare `--`.
    pub fn from_args<I, T>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let [program, input, output] = <[OsString; 3]>::try_from(args).ok()?;

        // Behind an escape clap takes even "--" as a value
        Self::try_parse_from([program, "--".into(), input, output]).ok()
    }
}

pub fn usage() -> String {
    Cli::command().render_usage().to_string()
}
