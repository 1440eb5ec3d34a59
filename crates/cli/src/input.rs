//! Turns the raw `task` argument into a task description.
//!
//! `@:<path>` loads the description from a file; anything else is taken
//! literally. Both are trimmed. Emptiness is left to the caller.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const FILE_MARKER: &str = "@:";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn resolve(raw: &str) -> Result<String, InputError> {
    let Some(path) = raw.strip_prefix(FILE_MARKER) else {
        return Ok(raw.trim().to_string());
    };

    let path = absolute(path);
    if !path.is_file() {
        return Err(InputError::FileNotFound(path));
    }

    let contents = std::fs::read_to_string(&path).map_err(|source| InputError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(contents.trim().to_string())
}

fn absolute(path: &str) -> PathBuf {
    std::path::absolute(Path::new(path)).unwrap_or_else(|_| PathBuf::from(path))
}
