//! Parser for JSON slit-pattern files.

use super::ParseError;
use crate::pattern::SlitPatternFile;

/// Parse a JSON pattern file from a string.
pub fn parse_json(content: &str) -> Result<SlitPatternFile, ParseError> {
    serde_json::from_str(content).map_err(|e| ParseError::FormatError {
        line: e.line(),
        message: e.to_string(),
    })
}
