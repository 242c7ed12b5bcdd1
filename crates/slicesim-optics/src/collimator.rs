//! Spectrograph collimator and the mapping from slit fields onto the
//! camera's field angles.
//!
//! The mapping is affine, $\mathbf{a} = s(\lambda)\,M\mathbf{f} + \mathbf{o}$,
//! with a lateral-colour scale $s(\lambda) = 1 + k(\lambda - \lambda_{ref})$.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use slicesim_core::types::FieldPoint;
use slicesim_core::wfe::{CollimatorModel, WfeDescriptor, WfeError, WfeProvider};

use crate::curve::{Curve, TabulatedCurve};
use crate::error::OpticsError;
use crate::model::{ZernikeTermSpec, ZernikeWfeModel};

fn default_collimator_name() -> String {
    "collimator".into()
}

fn default_axis_matrix() -> [[f64; 2]; 2] {
    // arcsec on sky to degrees at the camera
    [[0.01, 0.0], [0.0, 0.01]]
}

fn default_reference_wavelength() -> f64 {
    650.0
}

/// Collimator configuration. Field points are slit positions (arcsec).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollimatorSpec {
    #[serde(default = "default_collimator_name")]
    pub name: String,
    /// Pupil diameter (m) the WFE maps are defined over.
    pub entrance_pupil_diameter: TabulatedCurve,
    /// Edge of the slit field (arcsec).
    pub field_radius: f64,
    /// Row-major 2x2 matrix taking slit fields to camera field angles.
    #[serde(default = "default_axis_matrix")]
    pub axis_matrix: [[f64; 2]; 2],
    /// Camera field angle (degrees) of the slit origin.
    #[serde(default)]
    pub axis_offset: [f64; 2],
    /// Fractional change of the mapping scale per nm.
    #[serde(default)]
    pub lateral_colour: f64,
    #[serde(default = "default_reference_wavelength")]
    pub reference_wavelength_nm: f64,
    #[serde(default)]
    pub zernike: Vec<ZernikeTermSpec>,
}

impl CollimatorSpec {
    /// A 120 mm collimator with small defocus and field curvature.
    pub fn nominal() -> Self {
        Self {
            name: default_collimator_name(),
            entrance_pupil_diameter: TabulatedCurve::Constant(0.12),
            field_radius: 5.0,
            axis_matrix: default_axis_matrix(),
            axis_offset: [0.0, 0.0],
            lateral_colour: 2.0e-5,
            reference_wavelength_nm: default_reference_wavelength(),
            zernike: vec![
                ZernikeTermSpec::new(4, TabulatedCurve::table(&[400.0, 700.0, 1000.0], &[12.0, 5.0, 10.0]), 1.0),
                ZernikeTermSpec::new(11, TabulatedCurve::Constant(3.0), 0.0),
            ],
        }
    }
}

/// A collimator with Zernike WFE and an affine optical-axis mapping.
#[derive(Debug, Clone)]
pub struct Collimator {
    name: String,
    enpd: Curve,
    model: ZernikeWfeModel,
    axis_matrix: Matrix2<f64>,
    axis_offset: Vector2<f64>,
    lateral_colour: f64,
    reference_wavelength_nm: f64,
}

impl Collimator {
    pub fn from_spec(spec: &CollimatorSpec) -> Result<Self, OpticsError> {
        let [[a, b], [c, d]] = spec.axis_matrix;
        let axis_matrix = Matrix2::new(a, b, c, d);
        if axis_matrix.iter().any(|v| !v.is_finite()) || axis_matrix.determinant() == 0.0 {
            return Err(OpticsError::InvalidParameter(format!(
                "collimator axis matrix must be finite and invertible, got {:?}",
                spec.axis_matrix
            )));
        }
        if !spec.reference_wavelength_nm.is_finite() || spec.reference_wavelength_nm <= 0.0 {
            return Err(OpticsError::InvalidParameter(format!(
                "reference wavelength must be positive, got {} nm",
                spec.reference_wavelength_nm
            )));
        }

        Ok(Self {
            name: spec.name.clone(),
            enpd: Curve::from_tabulated(&spec.entrance_pupil_diameter)?,
            model: ZernikeWfeModel::new(&spec.zernike, spec.field_radius)?,
            axis_matrix,
            axis_offset: Vector2::new(spec.axis_offset[0], spec.axis_offset[1]),
            lateral_colour: spec.lateral_colour,
            reference_wavelength_nm: spec.reference_wavelength_nm,
        })
    }

    fn map_field(&self, field: &FieldPoint, wavelength_nm: f64) -> FieldPoint {
        let scale = 1.0 + self.lateral_colour * (wavelength_nm - self.reference_wavelength_nm);
        let mapped = self.axis_matrix * Vector2::new(field.x, field.y) * scale + self.axis_offset;
        FieldPoint::new(mapped.x, mapped.y)
    }
}

impl WfeProvider for Collimator {
    fn name(&self) -> &str {
        &self.name
    }

    fn wfe(&self, fields: &[FieldPoint], wavelength_nm: f64, sampling: usize) -> Result<Vec<WfeDescriptor>, WfeError> {
        fields
            .iter()
            .map(|f| self.model.maps(f, wavelength_nm, sampling).map_err(WfeError::from))
            .collect()
    }

    fn entrance_pupil_diameter(&self, wavelength_nm: f64) -> Result<f64, WfeError> {
        Ok(self.enpd.evaluate(wavelength_nm)?)
    }
}

impl CollimatorModel for Collimator {
    fn optical_axis(&self, fields: &[FieldPoint], wavelength_nm: f64) -> Result<Vec<FieldPoint>, WfeError> {
        if !wavelength_nm.is_finite() || wavelength_nm <= 0.0 {
            return Err(WfeError::Model(format!("invalid wavelength {} nm", wavelength_nm)));
        }
        Ok(fields.iter().map(|f| self.map_field(f, wavelength_nm)).collect())
    }
}
