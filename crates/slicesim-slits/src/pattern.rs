//! Named slit patterns.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use slicesim_core::slit::{SlitPattern, SlitPatternError};
use slicesim_core::types::{FieldPoint, SlitPatternGeometry, StackingAxis};

use crate::parsers::{load_file, ParseError};

/// Contents of a slit-pattern file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlitPatternFile {
    pub patterns: Vec<PatternEntry>,
}

/// One named pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub pattern_data: SlitPatternGeometry,
    /// Explicit `[x, y]` field point (arcsec) of every slitlet. When absent
    /// the slitlets are laid side by side about `field_centre`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<[f64; 2]>>,
}

impl SlitPatternFile {
    pub fn names(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.name.clone()).collect()
    }

    /// Build the pattern called `name`.
    pub fn pattern(&self, name: &str) -> Result<NamedSlitPattern, ParseError> {
        let entry = self
            .patterns
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ParseError::PatternNotFound {
                name: name.to_string(),
                available: self.names(),
            })?;
        Ok(NamedSlitPattern::from_entry(entry)?)
    }
}

/// Load the pattern `name` from the file at `path`.
pub fn load_pattern(path: impl AsRef<Path>, name: &str) -> Result<NamedSlitPattern, ParseError> {
    let path = path.as_ref();
    let file = load_file(path)?;
    debug!("Loaded {} slit patterns from {}", file.patterns.len(), path.display());
    file.pattern(name)
}

/// A validated slit pattern with one field point per slitlet.
#[derive(Debug, Clone)]
pub struct NamedSlitPattern {
    name: String,
    geometry: SlitPatternGeometry,
    fields: Vec<FieldPoint>,
}

impl NamedSlitPattern {
    pub fn new(name: impl Into<String>, geometry: SlitPatternGeometry) -> Result<Self, SlitPatternError> {
        let name = name.into();
        Self::build(name, geometry, None)
    }

    pub fn from_entry(entry: &PatternEntry) -> Result<Self, SlitPatternError> {
        Self::build(entry.name.clone(), entry.pattern_data.clone(), entry.fields.as_deref())
    }

    fn build(
        name: String,
        geometry: SlitPatternGeometry,
        explicit: Option<&[[f64; 2]]>,
    ) -> Result<Self, SlitPatternError> {
        let invalid = |message: String| SlitPatternError::Invalid {
            pattern: name.clone(),
            message,
        };
        geometry.validate().map_err(invalid)?;

        let fields = match explicit {
            Some(points) if points.len() != geometry.n_slitlets => {
                return Err(invalid(format!(
                    "{} field points listed for {} slitlets",
                    points.len(),
                    geometry.n_slitlets
                )));
            }
            Some(points) => {
                if points.iter().flatten().any(|v| !v.is_finite()) {
                    return Err(invalid("non-finite field point".into()));
                }
                points.iter().map(|&[x, y]| FieldPoint::new(x, y)).collect()
            }
            None => stacked_fields(&geometry),
        };

        Ok(Self { name, geometry, fields })
    }
}

/// Slitlet centres laid side by side, one slitlet width apart, along the
/// stacking axis and centred on the field centre.
fn stacked_fields(geometry: &SlitPatternGeometry) -> Vec<FieldPoint> {
    let [cx, cy] = geometry.field_centre;
    let pitch = geometry.slitlet_width();
    let mid = (geometry.n_slitlets as f64 - 1.0) / 2.0;

    (0..geometry.n_slitlets)
        .map(|s| {
            let offset = (s as f64 - mid) * pitch;
            match geometry.stacking_axis {
                StackingAxis::Vertical => FieldPoint::new(cx, cy + offset),
                StackingAxis::Horizontal => FieldPoint::new(cx + offset, cy),
            }
        })
        .collect()
}

impl SlitPattern for NamedSlitPattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&self) -> &SlitPatternGeometry {
        &self.geometry
    }

    fn field_points(&self, n_fields: usize) -> Result<Vec<FieldPoint>, SlitPatternError> {
        if n_fields > self.fields.len() {
            return Err(SlitPatternError::TooManyFields {
                pattern: self.name.clone(),
                requested: n_fields,
                available: self.fields.len(),
            });
        }
        Ok(self.fields[..n_fields].to_vec())
    }
}
