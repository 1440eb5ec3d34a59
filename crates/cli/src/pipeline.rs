//! Single-shot gist pipeline.
//!
//! resolve input → empty check → credential check → isolated extraction →
//! normalize → emit. Every failure ends the run with diagnostics on the
//! diagnostic sink and nothing on `out`.

use std::fmt;
use std::io::{self, Write};

use taskgist_extraction::{ExtractionError, KeywordExtractor};
use tracing::{debug, info, warn};

use crate::diag::Diag;
use crate::gist::{self, Gist};
use crate::input::{self, InputError};
use crate::isolate;

/// Whether extraction runs with stdout redirected to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    Stdout,
    Disabled,
}

#[derive(Debug)]
pub enum Failure {
    Input(InputError),
    EmptyInput,
    Extraction(ExtractionError),
    EmptyExtraction,
    EmptyGist,
    Emit(io::Error),
}

impl Failure {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::EmptyInput => "empty_input",
            Self::Extraction(ExtractionError::ConfigurationMissing { .. }) => "configuration",
            Self::Extraction(_) => "extraction",
            Self::EmptyExtraction => "empty_extraction",
            Self::EmptyGist => "empty_gist",
            Self::Emit(_) => "emit",
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(e) => write!(f, "{}: {e}", self.label()),
            Self::Extraction(e) => write!(f, "{}: {e}", self.label()),
            Self::Emit(e) => write!(f, "{}: {e}", self.label()),
            _ => f.write_str(self.label()),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Emitted(Gist),
    Failed(Failure),
}

pub async fn run<E, C, O, D>(
    task_arg: &str,
    connect: C,
    isolation: Isolation,
    out: &mut O,
    diag: &mut Diag<D>,
) -> Outcome
where
    E: KeywordExtractor,
    C: FnOnce() -> Result<E, ExtractionError>,
    O: Write,
    D: Write,
{
    let task = match input::resolve(task_arg) {
        Ok(task) => task,
        Err(e) => {
            match &e {
                InputError::FileNotFound(_) => diag.error(&e),
                InputError::Read { .. } => diag.line(&format!("Error processing task input: {e}")),
            }
            return Outcome::Failed(Failure::Input(e));
        }
    };

    if task.is_empty() {
        diag.error("No task description provided or file is empty.");
        return Outcome::Failed(Failure::EmptyInput);
    }

    let extractor = match connect() {
        Ok(extractor) => extractor,
        Err(e) => return extraction_failed(diag, e),
    };

    debug!(
        component = "pipeline",
        event = "pipeline.extract_start",
        task_chars = task.chars().count(),
        isolation = ?isolation,
    );

    let extracted = match isolation {
        Isolation::Stdout => isolate::isolated(extractor.extract(&task)).await,
        Isolation::Disabled => extractor.extract(&task).await,
    };
    let keywords = match extracted {
        Ok(keywords) => keywords,
        Err(e) => return extraction_failed(diag, e),
    };

    if keywords.is_empty() {
        diag.warning("LLM returned empty actionVerb and phrase. Cannot generate gist.");
        return Outcome::Failed(Failure::EmptyExtraction);
    }

    let gist = gist::normalize(&keywords);
    if gist.is_empty() {
        diag.warning(
            "Generated gist is empty after processing. Check LLM output and input task.",
        );
        return Outcome::Failed(Failure::EmptyGist);
    }

    if let Err(e) = writeln!(out, "{gist}").and_then(|()| out.flush()) {
        warn!(
            component = "pipeline",
            event = "pipeline.emit_failed",
            error = %e,
            "Failed to write gist to stdout"
        );
        diag.error(format!("Failed to write gist: {e}"));
        return Outcome::Failed(Failure::Emit(e));
    }

    info!(
        component = "pipeline",
        event = "pipeline.gist_emitted",
        gist = gist.as_str(),
    );
    Outcome::Emitted(gist)
}

fn extraction_failed<D: Write>(diag: &mut Diag<D>, err: ExtractionError) -> Outcome {
    warn!(
        component = "pipeline",
        event = "pipeline.extraction_failed",
        error = %err,
    );
    for line in err.diagnostic_lines() {
        diag.line(&line);
    }
    Outcome::Failed(Failure::Extraction(err))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use taskgist_extraction::KeywordResult;

    use super::*;

    type Reply = Box<dyn Fn() -> Result<KeywordResult, ExtractionError> + Send + Sync>;

    struct FakeExtractor {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl KeywordExtractor for FakeExtractor {
        async fn extract(&self, _task: &str) -> Result<KeywordResult, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            (self.reply)()
        }
    }

    struct Run {
        outcome: Outcome,
        stdout: String,
        stderr: String,
        calls: usize,
    }

    async fn run_with(task: &str, reply: Reply) -> Run {
        let calls = Arc::new(AtomicUsize::new(0));
        let extractor = FakeExtractor {
            reply,
            calls: calls.clone(),
        };
        run_connected(task, move || Ok(extractor), calls).await
    }

    async fn run_connected<C>(task: &str, connect: C, calls: Arc<AtomicUsize>) -> Run
    where
        C: FnOnce() -> Result<FakeExtractor, ExtractionError>,
    {
        let mut out = Vec::new();
        let mut diag = Diag::plain(Vec::new());
        let outcome = run(task, connect, Isolation::Disabled, &mut out, &mut diag).await;
        Run {
            outcome,
            stdout: String::from_utf8(out).unwrap(),
            stderr: String::from_utf8(diag.into_inner()).unwrap(),
            calls: calls.load(Ordering::SeqCst),
        }
    }

    fn keywords(verb: &str, phrase: &[&str]) -> Reply {
        let result = KeywordResult::new(verb, phrase.iter().map(|p| p.to_string()).collect());
        Box::new(move || Ok(result.clone()))
    }

    #[tokio::test]
    async fn emits_exactly_one_gist_line() {
        let run = run_with(
            "Create user authentication",
            keywords("Create", &["create", "user", "user", "authentication"]),
        )
        .await;
        assert!(matches!(run.outcome, Outcome::Emitted(_)));
        assert_eq!(run.stdout, "create-user-authentication\n");
        assert_eq!(run.stderr, "");
        assert_eq!(run.calls, 1);
    }

    #[tokio::test]
    async fn empty_input_never_calls_extractor() {
        let run = run_with("   \n", keywords("add", &["x"])).await;
        assert!(matches!(run.outcome, Outcome::Failed(Failure::EmptyInput)));
        assert_eq!(run.stdout, "");
        assert_eq!(
            run.stderr,
            "Error: No task description provided or file is empty.\n"
        );
        assert_eq!(run.calls, 0);
    }

    #[tokio::test]
    async fn empty_file_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.txt");
        std::fs::write(&path, "  \n").unwrap();

        let run = run_with(&format!("@:{}", path.display()), keywords("add", &[])).await;
        assert!(matches!(run.outcome, Outcome::Failed(Failure::EmptyInput)));
        assert_eq!(run.calls, 0);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let run = run_with(&format!("@:{}", path.display()), keywords("add", &[])).await;
        assert!(matches!(
            run.outcome,
            Outcome::Failed(Failure::Input(InputError::FileNotFound(_)))
        ));
        assert!(run.stderr.starts_with("Error: File not found: "));
        assert!(run.stderr.trim_end().ends_with("missing.txt"));
        assert_eq!(run.stdout, "");
        assert_eq!(run.calls, 0);
    }

    #[tokio::test]
    async fn missing_credential_skips_extraction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let run = run_connected(
            "Add caching",
            || {
                Err(ExtractionError::ConfigurationMissing {
                    var: "GEMINI_API_KEY",
                })
            },
            calls,
        )
        .await;

        match &run.outcome {
            Outcome::Failed(failure) => assert_eq!(failure.label(), "configuration"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(run
            .stderr
            .starts_with("Error: GEMINI_API_KEY environment variable not set.\n"));
        assert_eq!(run.stdout, "");
        assert_eq!(run.calls, 0);
    }

    #[tokio::test]
    async fn validation_failure_renders_all_fields() {
        let reply: Reply = Box::new(|| {
            Err(ExtractionError::validation(
                "missing field `phrase`",
                Some("PROMPT".into()),
                Some("RAW".into()),
            ))
        });
        let run = run_with("Add caching", reply).await;

        assert!(matches!(
            run.outcome,
            Outcome::Failed(Failure::Extraction(ExtractionError::Validation { .. }))
        ));
        assert!(run.stderr.contains("  Message: missing field `phrase`\n"));
        assert!(run.stderr.contains("  Prompt: PROMPT\n"));
        assert!(run.stderr.contains("  Raw LLM Output: RAW\n"));
        assert_eq!(run.stdout, "");
        assert_eq!(run.calls, 1);
    }

    #[tokio::test]
    async fn provider_failure_emits_nothing() {
        let reply: Reply = Box::new(|| Err(ExtractionError::provider("connection refused")));
        let run = run_with("Add caching", reply).await;

        assert_eq!(run.stdout, "");
        assert!(run
            .stderr
            .starts_with("Extraction error: Provider error: connection refused\n"));
    }

    #[tokio::test]
    async fn empty_extraction_is_a_warning() {
        let run = run_with("Add caching", keywords("", &[])).await;
        assert!(matches!(
            run.outcome,
            Outcome::Failed(Failure::EmptyExtraction)
        ));
        assert_eq!(
            run.stderr,
            "Warning: LLM returned empty actionVerb and phrase. Cannot generate gist.\n"
        );
        assert_eq!(run.stdout, "");
    }

    #[tokio::test]
    async fn whitespace_only_extraction_yields_empty_gist_warning() {
        let run = run_with("Add caching", keywords(" ", &["\u{a0}"])).await;
        assert!(matches!(run.outcome, Outcome::Failed(Failure::EmptyGist)));
        assert!(run.stderr.starts_with("Warning: Generated gist is empty"));
        assert_eq!(run.stdout, "");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_gist_write_is_not_reported_as_emitted() {
        let extractor = FakeExtractor {
            reply: keywords("Add", &["caching"]),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let mut diag = Diag::plain(Vec::new());
        let outcome = run(
            "Add caching",
            move || Ok(extractor),
            Isolation::Disabled,
            &mut BrokenPipe,
            &mut diag,
        )
        .await;

        match outcome {
            Outcome::Failed(Failure::Emit(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected emit failure, got {other:?}"),
        }
        let stderr = String::from_utf8(diag.into_inner()).unwrap();
        assert!(stderr.starts_with("Error: Failed to write gist: reader went away"));
    }

    struct NoisyExtractor;

    #[async_trait]
    impl KeywordExtractor for NoisyExtractor {
        async fn extract(&self, _task: &str) -> Result<KeywordResult, ExtractionError> {
            let noise = b"provider banner\n";
            unsafe { libc::write(libc::STDOUT_FILENO, noise.as_ptr().cast(), noise.len()) };
            Ok(KeywordResult::new("Add", vec!["dark mode".to_string()]))
        }
    }

    fn read_all(mut file: &std::fs::File) -> String {
        use std::io::{Read, Seek, SeekFrom};
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut s = String::new();
        file.read_to_string(&mut s).unwrap();
        s
    }

    #[tokio::test]
    async fn stdout_isolation_routes_extractor_output_to_stderr() {
        use std::os::fd::AsRawFd;

        use crate::isolate::FdRedirect;

        let stdout_file = tempfile::tempfile().unwrap();
        let stderr_file = tempfile::tempfile().unwrap();

        let outcome = {
            // Process fds 1 and 2 point at temp files for this block only. Other
            // tests' harness output may land in them too, so assert with `contains`.
            let _stdout = FdRedirect::acquire(libc::STDOUT_FILENO, stdout_file.as_raw_fd()).unwrap();
            let _stderr = FdRedirect::acquire(libc::STDERR_FILENO, stderr_file.as_raw_fd()).unwrap();

            let mut diag = Diag::plain(Vec::new());
            run(
                "Add dark mode",
                || Ok(NoisyExtractor),
                Isolation::Stdout,
                &mut std::io::stdout(),
                &mut diag,
            )
            .await
        };

        assert!(matches!(outcome, Outcome::Emitted(_)));
        let out = read_all(&stdout_file);
        let err = read_all(&stderr_file);
        assert!(out.contains("add-dark-mode\n"));
        assert!(!out.contains("provider banner"));
        assert!(err.contains("provider banner\n"));
        assert!(!err.contains("add-dark-mode"));
    }

    #[tokio::test]
    async fn task_from_file_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.txt");
        std::fs::write(&path, "Refactor billing\n").unwrap();

        let run = run_with(
            &format!("@:{}", path.display()),
            keywords("Refactor", &["billing module"]),
        )
        .await;
        assert_eq!(run.stdout, "refactor-billing-module\n");
    }
}
