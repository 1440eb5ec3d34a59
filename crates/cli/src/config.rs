//! Environment-driven settings.
//!
//! A `.env` file in the working directory is loaded first; variables already
//! present in the process environment take precedence over it.

use std::path::PathBuf;

pub const LOG_FILTER_VAR: &str = "TASKGIST_LOG";
pub const LOG_FORMAT_VAR: &str = "TASKGIST_LOG_FORMAT";
pub const LOG_FILE_VAR: &str = "TASKGIST_LOG_FILE";
pub const MODEL_VAR: &str = "TASKGIST_MODEL";

/// Provider libraries are noisy; only errors surface unless asked otherwise.
pub const DEFAULT_LOG_FILTER: &str = "error";

/// Load `.env` if present. Returns the file that was loaded.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    /// `None` picks the sink's default: compact on stderr, json in a file.
    pub format: Option<LogFormat>,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let filter = non_empty(LOG_FILTER_VAR)
            .or_else(|| non_empty("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            filter,
            format: non_empty(LOG_FORMAT_VAR).and_then(|v| LogFormat::parse(&v)),
            file: non_empty(LOG_FILE_VAR).map(PathBuf::from),
        }
    }
}
