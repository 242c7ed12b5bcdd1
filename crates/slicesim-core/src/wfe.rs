//! Wavefront-error descriptors and the optical-component interfaces that
//! supply them.
//!
//! Component models (collimator, camera) live outside this crate and are
//! reached only through [`WfeProvider`], [`CameraModel`] and
//! [`CollimatorModel`].

use ndarray::Array2;
use serde::Serialize;
use thiserror::Error;

use crate::types::FieldPoint;

/// Errors from wavefront-error providers.
#[derive(Debug, Error)]
pub enum WfeError {
    #[error("Wavelength {wavelength_nm} nm is outside the model range [{min}, {max}] nm")]
    OutOfRange {
        wavelength_nm: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid WFE map sampling: {0}")]
    InvalidSampling(usize),

    #[error("Model error: {0}")]
    Model(String),
}

/// Wavefront error for one field point: a defocus-like map and a map of
/// everything else, both OPD in nanometres on the same square grid.
#[derive(Debug, Clone, PartialEq)]
pub struct WfeDescriptor {
    pub defocus: Array2<f64>,
    pub higher_order: Array2<f64>,
}

impl WfeDescriptor {
    /// Map samples across the pupil.
    pub fn sampling(&self) -> usize {
        self.defocus.ncols()
    }
}

/// Statistics of a WFE injected into a pupil, over its illuminated samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WfeSummary {
    pub rms_nm: f64,
    pub peak_to_valley_nm: f64,
    /// Number of pupil samples the statistics cover.
    pub samples: usize,
}

/// Supplies per-field wavefront error for an optical component.
pub trait WfeProvider: Send + Sync {
    /// Human-readable component name.
    fn name(&self) -> &str;

    /// One descriptor per field point, in the same order, each sampled on a
    /// `sampling x sampling` grid.
    fn wfe(
        &self,
        fields: &[FieldPoint],
        wavelength_nm: f64,
        sampling: usize,
    ) -> Result<Vec<WfeDescriptor>, WfeError>;

    /// Diameter (m) of the pupil the WFE maps are defined over.
    fn entrance_pupil_diameter(&self, wavelength_nm: f64) -> Result<f64, WfeError>;
}

/// A camera: WFE plus the focal-plane mapping used by conjugate transforms.
pub trait CameraModel: WfeProvider {
    /// Effective focal length (m).
    fn focal_length(&self) -> f64;
}

/// A collimator: WFE plus the mapping from slit fields onto the camera's
/// optical axis.
pub trait CollimatorModel: WfeProvider {
    /// Camera field angles for the given slit fields.
    fn optical_axis(&self, fields: &[FieldPoint], wavelength_nm: f64) -> Result<Vec<FieldPoint>, WfeError>;
}
