//! Reading raw incident values from dataset files.

use crate::incident::ValidationError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// One input position: a decoded JSON value, or the reason its line could
/// not be decoded.
pub type RawEntry = Result<Value, ValidationError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path:?}: {message}")]
    Json { path: PathBuf, message: String },
}

/// Load raw incident entries from a file.
///
/// A file whose first non-blank character is `[` is read as a JSON array,
/// and a broken array fails as a whole. Anything else is read as
/// newline-delimited JSON, one record per line, with blank lines skipped;
/// a line that is not JSON becomes a malformed entry at its position and
/// the remaining lines are still read. Checking the shape of decoded values
/// is the loader's job.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawEntry>, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_raw_records(&text, path)
}

fn parse_raw_records(text: &str, path: &Path) -> Result<Vec<RawEntry>, SourceError> {
    if text.trim_start().starts_with('[') {
        let values = serde_json::from_str::<Vec<Value>>(text).map_err(|e| SourceError::Json {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        return Ok(values.into_iter().map(Ok).collect());
    }

    let entries: Vec<RawEntry> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                warn!(path = ?path, line = i + 1, error = %e, "Skipping unparseable line");
                ValidationError::Malformed(format!("line {}: {}", i + 1, e))
            })
        })
        .collect();
    Ok(entries)
}
