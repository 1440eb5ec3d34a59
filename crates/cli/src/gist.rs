//! Deterministic gist normalization.
//!
//! Verb words first, then the words of each relevant phrase element,
//! lowercased, deduplicated in first-seen order and joined with `-`.

use std::collections::HashSet;
use std::fmt;

use taskgist_extraction::KeywordResult;

/// Hyphen-joined lowercase token sequence. Empty when nothing usable remained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gist(String);

impl Gist {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Gist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unicode whitespace plus the ASCII information separators U+001C..U+001F.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn clean(s: &str) -> String {
    s.trim_matches(is_separator).to_lowercase()
}

pub fn normalize(result: &KeywordResult) -> Gist {
    let verb = clean(&result.action_verb);
    let elements: Vec<String> = result.phrase.iter().map(|e| clean(e)).collect();

    let mut tokens: Vec<&str> = verb.split(is_separator).collect();

    // Models often echo the verb back as the first phrase element.
    let relevant = match elements.split_first() {
        Some((first, rest)) if *first == verb => rest,
        _ => &elements[..],
    };
    for element in relevant {
        tokens.extend(element.split(is_separator));
    }

    let mut seen = HashSet::new();
    let unique: Vec<&str> = tokens
        .into_iter()
        .filter(|t| !t.is_empty() && seen.insert(*t))
        .collect();

    Gist(unique.join("-"))
}
