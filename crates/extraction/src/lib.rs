//! taskgist extraction
//!
//! The boundary between the CLI and the language model. Defines the
//! structured keyword result, the closed error taxonomy, and the
//! `KeywordExtractor` trait, plus a Gemini-backed implementation.

mod error;
pub mod gemini;
pub mod prompt;

pub use error::ExtractionError;
pub use gemini::GeminiExtractor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured keywords pulled out of a task description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordResult {
    /// Leading action verb, e.g. "create". May be empty.
    #[serde(rename = "actionVerb")]
    pub action_verb: String,
    /// Supporting keyword phrases in the order the model returned them.
    pub phrase: Vec<String>,
}

impl KeywordResult {
    pub fn new(action_verb: impl Into<String>, phrase: Vec<String>) -> Self {
        Self {
            action_verb: action_verb.into(),
            phrase,
        }
    }

    /// True when the model returned neither a verb nor any phrase.
    pub fn is_empty(&self) -> bool {
        self.action_verb.is_empty() && self.phrase.is_empty()
    }
}

/// Anything that can turn a task description into a `KeywordResult`.
///
/// Implementations may take several seconds (network round trip). Callers
/// must not assume anything about internal concurrency.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract(&self, task: &str) -> Result<KeywordResult, ExtractionError>;
}
