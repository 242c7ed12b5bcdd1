//! Parser for TOML slit-pattern files.
//!
//! ```toml
//! [[patterns]]
//! name = "default"
//!
//! [patterns.pattern_data]
//! n_slitlets = 5
//! slitlet_length = 2.0
//! n_spaxels_per_slitlet = 10
//! stack_wh_aspect_ratio = 1.0
//! lenslet_to_stack_magnification = 4.0
//! ```

use super::ParseError;
use crate::pattern::SlitPatternFile;

/// Parse a TOML pattern file from a string.
pub fn parse_toml(content: &str) -> Result<SlitPatternFile, ParseError> {
    ::toml::from_str(content).map_err(|e: ::toml::de::Error| {
        let line = e
            .span()
            .map(|span| content[..span.start.min(content.len())].lines().count().max(1))
            .unwrap_or(0);
        ParseError::FormatError {
            line,
            message: e.message().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicesim_core::types::StackingAxis;

    #[test]
    fn test_parse_toml_patterns() {
        let content = r#"
[[patterns]]
name = "default"
fields = [[0.0, -0.2], [0.0, 0.0], [0.0, 0.2]]

[patterns.pattern_data]
n_slitlets = 3
slitlet_length = 1.2
n_spaxels_per_slitlet = 6
stack_wh_aspect_ratio = 1.0
lenslet_to_stack_magnification = 3.0
"#;
        let file = parse_toml(content).unwrap();
        let entry = &file.patterns[0];

        assert_eq!(entry.pattern_data.stacking_axis, StackingAxis::Vertical);
        assert_eq!(entry.fields.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_parse_toml_missing_field() {
        let content = "[[patterns]]\nname = \"x\"\n\n[patterns.pattern_data]\nn_slitlets = 2\n";
        assert!(matches!(parse_toml(content), Err(ParseError::FormatError { .. })));
    }
}
