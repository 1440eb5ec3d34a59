//! Prompt and response schema for keyword extraction.

use serde_json::{json, Value};

const INSTRUCTIONS: &str = "You summarize software engineering tasks for branch names.
From the task description below, extract:
- actionVerb: the single leading action verb of the task (e.g. \"add\", \"fix\", \"refactor\").
- phrase: 1-4 short keyword phrases naming what the task is about, most important first.
  Each phrase is 1-3 lowercase words. Do not repeat the action verb. No punctuation.
Reply with JSON only.";

/// Render the full prompt for one task description.
pub fn build_prompt(task: &str) -> String {
    format!("{INSTRUCTIONS}\n\nTask description:\n---\n{task}\n---")
}

/// Schema the model's JSON reply must satisfy.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "actionVerb": { "type": "STRING" },
            "phrase": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["actionVerb", "phrase"],
        "propertyOrdering": ["actionVerb", "phrase"]
    })
}
