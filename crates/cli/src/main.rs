//! taskgist
//!
//! Turns a free-form task description into a short hyphenated gist
//! (`add-dark-mode-settings`) for branch names and commit prefixes.
//! Only the gist is ever written to stdout; everything else goes to stderr.

mod args;
mod config;
mod diag;
mod gist;
mod input;
mod isolate;
mod logging;
mod pipeline;

use taskgist_extraction::GeminiExtractor;
use tracing::debug;

use crate::diag::Diag;
use crate::pipeline::{Isolation, Outcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let env_file = config::load_dotenv();
    let cli = args::parse();

    let _logging = logging::init_logging(&config::LogSettings::from_env())?;
    debug!(
        component = "main",
        event = "main.started",
        env_file = ?env_file,
        model = %cli.model,
    );

    let model = cli.model;
    let outcome = pipeline::run(
        &cli.task,
        || GeminiExtractor::from_env().map(|extractor| extractor.with_model(model)),
        Isolation::Stdout,
        &mut std::io::stdout(),
        &mut Diag::stderr(),
    )
    .await;

    match &outcome {
        Outcome::Emitted(gist) => debug!(component = "main", event = "main.finished", gist = %gist),
        Outcome::Failed(failure) => debug!(
            component = "main",
            event = "main.finished",
            failure = %failure,
        ),
    }

    // Handled failures still exit 0; stdout being empty is the signal.
    Ok(())
}
