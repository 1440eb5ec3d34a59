use thiserror::Error;

/// Ways keyword extraction can fail.
///
/// Each variant carries exactly the diagnostic fields it has, so callers
/// render them without probing.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model answered, but not in the shape of a `KeywordResult`.
    #[error("Failed to validate model output: {message}")]
    Validation {
        message: String,
        prompt: Option<String>,
        raw_output: Option<String>,
    },

    /// Transport failure or non-success response from the provider.
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        status: Option<u16>,
    },

    /// A required credential is not set.
    #[error("{var} environment variable not set.")]
    ConfigurationMissing { var: &'static str },
}

impl ExtractionError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            status: None,
        }
    }

    pub fn validation(
        message: impl Into<String>,
        prompt: Option<String>,
        raw_output: Option<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            prompt,
            raw_output,
        }
    }

    /// HTTP status of the failed provider call, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }

    /// Multi-line, human-readable rendering for the diagnostic stream.
    pub fn diagnostic_lines(&self) -> Vec<String> {
        match self {
            Self::ConfigurationMissing { var } => vec![
                format!("Error: {self}"),
                format!(
                    "Please set it in your environment or in a .env file (e.g., {var}=\"your-key\")."
                ),
            ],
            Self::Validation {
                message,
                prompt,
                raw_output,
            } => {
                let mut lines = vec![
                    format!("Extraction error: {self}"),
                    format!("  Message: {message}"),
                ];
                if let Some(prompt) = prompt {
                    lines.push(format!("  Prompt: {prompt}"));
                }
                if let Some(raw) = raw_output {
                    lines.push(format!("  Raw LLM Output: {raw}"));
                }
                lines
            }
            Self::Provider { message, status } => {
                let mut lines = vec![
                    format!("Extraction error: {self}"),
                    format!("  Message: {message}"),
                ];
                if let Some(status) = status {
                    lines.push(format!("  Status: {status}"));
                }
                lines
            }
        }
    }
}
