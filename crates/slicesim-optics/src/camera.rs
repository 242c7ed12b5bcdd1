//! Spectrograph camera.

use serde::{Deserialize, Serialize};
use slicesim_core::types::FieldPoint;
use slicesim_core::wfe::{CameraModel, WfeDescriptor, WfeError, WfeProvider};

use crate::curve::{Curve, TabulatedCurve};
use crate::error::OpticsError;
use crate::model::{ZernikeTermSpec, ZernikeWfeModel};

fn default_camera_name() -> String {
    "camera".into()
}

/// Camera configuration. Field points are camera field angles (degrees).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    #[serde(default = "default_camera_name")]
    pub name: String,
    /// Effective focal length (m).
    pub focal_length: f64,
    /// Entrance pupil diameter (m) against wavelength.
    pub entrance_pupil_diameter: TabulatedCurve,
    /// Edge of the camera field (degrees).
    pub field_radius: f64,
    #[serde(default)]
    pub zernike: Vec<ZernikeTermSpec>,
}

impl CameraSpec {
    /// An f/5 camera with a 100 mm pupil, covering 400-1000 nm, with mild
    /// chromatic defocus and field-dependent astigmatism and coma.
    pub fn nominal() -> Self {
        let bands = [400.0, 550.0, 700.0, 850.0, 1000.0];
        Self {
            name: default_camera_name(),
            focal_length: 0.5,
            entrance_pupil_diameter: TabulatedCurve::table(&bands, &[0.1000, 0.1001, 0.1002, 0.1004, 0.1006]),
            field_radius: 0.1,
            zernike: vec![
                ZernikeTermSpec::new(4, TabulatedCurve::table(&bands, &[38.0, 17.0, 9.0, 14.0, 29.0]), 0.2),
                ZernikeTermSpec::new(5, TabulatedCurve::Constant(4.0), 1.5),
                ZernikeTermSpec::new(6, TabulatedCurve::Constant(6.0), 1.5),
                ZernikeTermSpec::new(7, TabulatedCurve::Constant(3.0), 2.0),
                ZernikeTermSpec::new(8, TabulatedCurve::Constant(3.0), 2.0),
                ZernikeTermSpec::new(11, TabulatedCurve::table(&bands, &[9.0, 7.5, 6.5, 6.0, 5.8]), 0.0),
            ],
        }
    }
}

/// A camera with tabulated pupil diameter and Zernike WFE.
#[derive(Debug, Clone)]
pub struct Camera {
    name: String,
    focal_length: f64,
    enpd: Curve,
    model: ZernikeWfeModel,
}

impl Camera {
    pub fn from_spec(spec: &CameraSpec) -> Result<Self, OpticsError> {
        if !spec.focal_length.is_finite() || spec.focal_length <= 0.0 {
            return Err(OpticsError::InvalidParameter(format!(
                "camera focal length must be positive, got {} m",
                spec.focal_length
            )));
        }
        Ok(Self {
            name: spec.name.clone(),
            focal_length: spec.focal_length,
            enpd: Curve::from_tabulated(&spec.entrance_pupil_diameter)?,
            model: ZernikeWfeModel::new(&spec.zernike, spec.field_radius)?,
        })
    }
}

impl WfeProvider for Camera {
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

impl CameraModel for Camera {
    fn focal_length(&self) -> f64 {
        self.focal_length
    }
}
