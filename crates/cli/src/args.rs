//! CLI argument definitions via clap derive.

use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser};

use crate::config::MODEL_VAR;

/// Generates a concise gist from a software engineering task description.
#[derive(Debug, Parser)]
#[command(
    name = "taskgist",
    version,
    disable_version_flag = true
)]
pub struct Cli {
    /// The task description, or a file path prefixed with '@:'.
    ///
    /// Example: taskgist "Create a new user authentication system"
    /// Example: taskgist "@:./mytask.txt"
    pub task: String,

    /// Gemini model used for keyword extraction.
    #[arg(
        long,
        env = MODEL_VAR,
        value_name = "MODEL",
        default_value = taskgist_extraction::gemini::DEFAULT_MODEL
    )]
    pub model: String,
}

/// Parse process arguments. `-v`/`--version` prints the version and exits.
pub fn parse() -> Cli {
    let matches = command().get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn command() -> clap::Command {
    Cli::command().arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("Print version"),
    )
}
