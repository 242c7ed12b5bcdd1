//! Core types shared across slicesim.
//!
//! This module defines the data structures that travel between the simulator
//! and its collaborators: field points, the slicer description and the
//! simulator configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Nanometres to metres.
pub const NM_TO_M: f64 = 1e-9;

/// Radians to arcseconds.
pub const RAD_TO_ARCSEC: f64 = 180.0 / std::f64::consts::PI * 3600.0;

/// A field position. Units depend on the plane it refers to: arcsec on sky
/// for slit-pattern fields, degrees for camera field angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPoint {
    pub x: f64,
    pub y: f64,
}

impl FieldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Radial distance from the field origin.
    pub fn radius(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Position angle measured from +x towards +y (radians).
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

/// Axis along which slitlets are stacked in the slicer image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackingAxis {
    /// Slitlets are stacked along y (image rows).
    #[default]
    Vertical,
    /// Slitlets are stacked along x (image columns).
    Horizontal,
}

/// Immutable description of the image slicer, loaded once per simulation
/// run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlitPatternGeometry {
    /// Number of slices in the stack.
    pub n_slitlets: usize,
    /// Length of one slitlet on sky (arcsec).
    pub slitlet_length: f64,
    /// Spaxels along each slitlet.
    pub n_spaxels_per_slitlet: usize,
    /// Width/height aspect ratio of the slicer stack.
    #[serde(alias = "stack_wh_aspect_ratio")]
    pub stack_width_height_aspect_ratio: f64,
    /// Magnification from the lenslet array to the slicer stack.
    pub lenslet_to_stack_magnification: f64,
    #[serde(default)]
    pub stacking_axis: StackingAxis,
    /// Sky position of the centre of the stack (arcsec).
    #[serde(default)]
    pub field_centre: [f64; 2],
}

impl SlitPatternGeometry {
    /// Check counts are positive integers and reals are positive and finite.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_slitlets == 0 {
            return Err("n_slitlets must be positive".into());
        }
        if self.n_spaxels_per_slitlet == 0 {
            return Err("n_spaxels_per_slitlet must be positive".into());
        }
        let reals = [
            ("slitlet_length", self.slitlet_length),
            ("stack_width_height_aspect_ratio", self.stack_width_height_aspect_ratio),
            ("lenslet_to_stack_magnification", self.lenslet_to_stack_magnification),
        ];
        for (name, value) in reals {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be positive and finite, got {}", name, value));
            }
        }
        if !self.field_centre.iter().all(|v| v.is_finite()) {
            return Err(format!("field_centre must be finite, got {:?}", self.field_centre));
        }
        Ok(())
    }

    /// Physical width of the slicer stack, in slitlet-length units.
    pub fn stack_width(&self) -> f64 {
        self.slitlet_length / self.lenslet_to_stack_magnification * self.stack_width_height_aspect_ratio
    }

    /// Width of one slitlet on sky (arcsec). Spaxels are square.
    pub fn slitlet_width(&self) -> f64 {
        self.slitlet_length / self.n_spaxels_per_slitlet as f64
    }
}

/// Configuration recognised by the simulator.
///
/// Field names are snake_case; the upper-case keys used by older
/// configuration files are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Samples across each WFE map requested from the providers.
    #[serde(alias = "PUPIL_WFE_MAP_SAMPLING")]
    pub pupil_wfe_map_sampling: usize,
    /// Resolution elements per slice; drives the slice size in pixels.
    #[serde(alias = "SLICE_RESEL_PER_SLICE")]
    pub slice_resel_per_slice: f64,
    /// Wavelength (nm) whose image-plane sampling every run is resampled to.
    #[serde(alias = "PUPIL_RESAMPLE_TO_WAVELENGTH")]
    pub pupil_resample_to_wavelength: f64,
    #[serde(alias = "SIM_SLITS_FILE")]
    pub sim_slits_file: PathBuf,
    #[serde(alias = "SIM_SLIT_NAME")]
    pub sim_slit_name: String,
    #[serde(alias = "SIM_ADD_CAMERA_WFE", default)]
    pub sim_add_camera_wfe: bool,
    #[serde(alias = "SIM_ADD_COLLIMATOR_WFE", default)]
    pub sim_add_collimator_wfe: bool,
    /// Process slices concurrently (regions are checked to be disjoint first).
    #[serde(default)]
    pub parallel_slices: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pupil_wfe_map_sampling: 64,
            slice_resel_per_slice: 2.0,
            pupil_resample_to_wavelength: 650.0,
            sim_slits_file: PathBuf::from("slits.json"),
            sim_slit_name: "default".into(),
            sim_add_camera_wfe: false,
            sim_add_collimator_wfe: false,
            parallel_slices: false,
        }
    }
}
