//! Interface to slit-pattern sources.

use thiserror::Error;

use crate::types::{FieldPoint, SlitPatternGeometry};

/// Errors from slit-pattern sources.
#[derive(Debug, Error)]
pub enum SlitPatternError {
    #[error("Pattern '{pattern}' has {available} slitlets, {requested} fields requested")]
    TooManyFields {
        pattern: String,
        requested: usize,
        available: usize,
    },

    #[error("Invalid slit pattern '{pattern}': {message}")]
    Invalid { pattern: String, message: String },
}

/// A loaded slicer pattern.
pub trait SlitPattern: Send + Sync {
    /// Pattern name within its file.
    fn name(&self) -> &str;

    /// Slicer geometry.
    fn geometry(&self) -> &SlitPatternGeometry;

    /// Field point of each of the first `n_fields` slitlets, in slitlet
    /// order.
    fn field_points(&self, n_fields: usize) -> Result<Vec<FieldPoint>, SlitPatternError>;
}
