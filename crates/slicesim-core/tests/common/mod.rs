//! Stand-in optical components and slit patterns for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ndarray::Array2;
use slicesim_core::slit::{SlitPattern, SlitPatternError};
use slicesim_core::types::{FieldPoint, SimulationConfig, SlitPatternGeometry, StackingAxis};
use slicesim_core::wfe::{CameraModel, CollimatorModel, WfeDescriptor, WfeError, WfeProvider};
use slicesim_core::{PupilPlane, SingleWavelengthSimulator};

pub const PUPIL_DIAMETER: f64 = 0.02;
pub const REFERENCE_WAVELENGTH: f64 = 650.0;

/// Defocus `a (2ρ² - 1)` plus an x tilt proportional to the field's y
/// coordinate, on a `sampling x sampling` unit disc.
fn test_maps(sampling: usize, defocus_nm: f64, tilt_nm: f64, field: &FieldPoint) -> WfeDescriptor {
    let half = sampling as f64 / 2.0;
    let disc = |i: usize, j: usize| {
        let x = (j as f64 + 0.5 - half) / half;
        let y = (i as f64 + 0.5 - half) / half;
        (x, y, x * x + y * y)
    };
    let defocus = Array2::from_shape_fn((sampling, sampling), |(i, j)| {
        let (_, _, rho2) = disc(i, j);
        if rho2 <= 1.0 {
            defocus_nm * (2.0 * rho2 - 1.0)
        } else {
            0.0
        }
    });
    let higher_order = Array2::from_shape_fn((sampling, sampling), |(i, j)| {
        let (x, _, rho2) = disc(i, j);
        if rho2 <= 1.0 {
            tilt_nm * (1.0 + field.y) * x
        } else {
            0.0
        }
    });
    WfeDescriptor { defocus, higher_order }
}

pub struct TestCamera {
    pub defocus_nm: f64,
    pub tilt_nm: f64,
}

impl WfeProvider for TestCamera {
    fn name(&self) -> &str {
        "test camera"
    }

    fn wfe(&self, fields: &[FieldPoint], _wavelength_nm: f64, sampling: usize) -> Result<Vec<WfeDescriptor>, WfeError> {
        Ok(fields
            .iter()
            .map(|f| test_maps(sampling, self.defocus_nm, self.tilt_nm, f))
            .collect())
    }

    fn entrance_pupil_diameter(&self, _wavelength_nm: f64) -> Result<f64, WfeError> {
        Ok(PUPIL_DIAMETER)
    }
}

impl CameraModel for TestCamera {
    fn focal_length(&self) -> f64 {
        0.5
    }
}

pub struct TestCollimator {
    pub defocus_nm: f64,
    /// Descriptors returned per request, cycling through the fields; `None`
    /// returns one per field.
    pub descriptor_count: Option<usize>,
}

impl WfeProvider for TestCollimator {
    fn name(&self) -> &str {
        "test collimator"
    }

    fn wfe(&self, fields: &[FieldPoint], _wavelength_nm: f64, sampling: usize) -> Result<Vec<WfeDescriptor>, WfeError> {
        let n = self.descriptor_count.unwrap_or(fields.len());
        Ok(fields
            .iter()
            .cycle()
            .take(n)
            .map(|f| test_maps(sampling, self.defocus_nm, 0.0, f))
            .collect())
    }

    fn entrance_pupil_diameter(&self, _wavelength_nm: f64) -> Result<f64, WfeError> {
        Ok(PUPIL_DIAMETER * 1.5)
    }
}

impl CollimatorModel for TestCollimator {
    fn optical_axis(&self, fields: &[FieldPoint], _wavelength_nm: f64) -> Result<Vec<FieldPoint>, WfeError> {
        Ok(fields.iter().map(|f| FieldPoint::new(f.x * 2.0, f.y * 2.0)).collect())
    }
}

pub struct TestPattern {
    pub geometry: SlitPatternGeometry,
}

impl TestPattern {
    pub fn new(n_slitlets: usize) -> Self {
        Self {
            geometry: SlitPatternGeometry {
                n_slitlets,
                slitlet_length: 1.0,
                n_spaxels_per_slitlet: 4,
                stack_width_height_aspect_ratio: 1.0,
                lenslet_to_stack_magnification: 2.0,
                stacking_axis: StackingAxis::Vertical,
                field_centre: [0.0, 0.0],
            },
        }
    }
}

impl SlitPattern for TestPattern {
    fn name(&self) -> &str {
        "test"
    }

    fn geometry(&self) -> &SlitPatternGeometry {
        &self.geometry
    }

    fn field_points(&self, n_fields: usize) -> Result<Vec<FieldPoint>, SlitPatternError> {
        let width = self.geometry.slitlet_width();
        let mid = (self.geometry.n_slitlets as f64 - 1.0) / 2.0;
        Ok((0..n_fields)
            .map(|s| FieldPoint::new(0.0, (s as f64 - mid) * width))
            .collect())
    }
}

pub fn config(camera: bool, collimator: bool) -> SimulationConfig {
    SimulationConfig {
        pupil_wfe_map_sampling: 32,
        slice_resel_per_slice: 1.0,
        pupil_resample_to_wavelength: REFERENCE_WAVELENGTH,
        sim_add_camera_wfe: camera,
        sim_add_collimator_wfe: collimator,
        ..Default::default()
    }
}

pub fn camera() -> Arc<TestCamera> {
    Arc::new(TestCamera { defocus_nm: 120.0, tilt_nm: 80.0 })
}

pub fn collimator() -> Arc<TestCollimator> {
    Arc::new(TestCollimator { defocus_nm: 60.0, descriptor_count: None })
}

/// 64-sample pupil, gamma 4, three vertically stacked slitlets.
pub fn simulator(config: SimulationConfig) -> SingleWavelengthSimulator {
    simulator_with(PupilPlane::circular(PUPIL_DIAMETER, 64, 4), config, collimator())
}

pub fn simulator_with(
    pupil: PupilPlane,
    config: SimulationConfig,
    collimator: Arc<TestCollimator>,
) -> SingleWavelengthSimulator {
    SingleWavelengthSimulator::new(pupil, camera(), collimator, Arc::new(TestPattern::new(3)), config).unwrap()
}
