//! Slit-pattern file parsers.
//!
//! Supported formats:
//! - [`.json`](json)
//! - [`.toml`](toml)

pub mod json;
pub mod toml;

use std::path::Path;

use slicesim_core::slit::SlitPatternError;
use thiserror::Error;

use crate::pattern::SlitPatternFile;

/// Errors while reading a slit-pattern file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    FormatError { line: usize, message: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No pattern named '{name}' (available: {})", available.join(", "))]
    PatternNotFound { name: String, available: Vec<String> },

    #[error(transparent)]
    InvalidPattern(#[from] SlitPatternError),
}

/// Read a pattern file, choosing the parser from the file extension.
pub fn load_file(path: impl AsRef<Path>) -> Result<SlitPatternFile, ParseError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => json::parse_json(&std::fs::read_to_string(path)?),
        "toml" => toml::parse_toml(&std::fs::read_to_string(path)?),
        _ => Err(ParseError::UnsupportedFormat(path.display().to_string())),
    }
}
