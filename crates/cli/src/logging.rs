use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LogSettings, DEFAULT_LOG_FILTER};

/// Keeps the non-blocking file writer alive; drop flushes pending lines.
pub struct LoggingHandle {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber. Logs go to stderr or a file, never stdout.
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<LoggingHandle> {
    let filter =
        EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (writer, guard, default_format) = match &settings.file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            (writer, Some(guard), LogFormat::Json)
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, LogFormat::Compact),
    };
    let format = settings.format.unwrap_or(default_format);
    let ansi = settings.file.is_none() && console::colors_enabled_stderr();

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer()
            .with_writer(writer)
            .json()
            .flatten_event(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .compact()
            .with_target(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;

    tracing::debug!(
        component = "logging",
        event = "logging.initialized",
        filter = %settings.filter,
        format = ?format,
        log_file = ?settings.file,
    );

    Ok(LoggingHandle { _guard: guard })
}

fn file_writer(path: &Path) -> anyhow::Result<(BoxMakeWriter, WorkerGuard)> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| anyhow::anyhow!("cannot open log file {}: {e}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((BoxMakeWriter::new(writer), guard))
}
