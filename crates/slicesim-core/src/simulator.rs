//! Single-wavelength propagation through the slicer.
//!
//! [`SingleWavelengthSimulator::run`] takes a shared pupil template through
//! the full pipeline for one wavelength:
//!
//! ```text
//!  pupil ─clone─▶ image(λ) ─resample─▶ image(ref grid) ──────────────▶ composite
//!                                          │                              ▲
//!                                          ▼                              │
//!                                       pupil(λ) ─▶ slicer image ─┬─ slice 0 ─┤
//!                                                                  ├─ slice 1 ─┤
//!                                                                  └─ ...     ─┘
//! ```
//!
//! Each slice is cut out of the slicer image, taken back to the pupil, given
//! the collimator and camera WFE for its field point, re-imaged and written
//! over its region of the composite.

use std::sync::Arc;

use log::{debug, info};
use ndarray::Array2;
use num_complex::Complex64;
use rayon::prelude::*;
use serde::Serialize;
use slicesim_compute::{ComputeBackend, CpuBackend};
use thiserror::Error;

use crate::field::{FieldError, FieldPlane, ImagePlane, PupilPlane};
use crate::slicing::{SliceError, SliceLayout, SliceRegion};
use crate::slit::{SlitPattern, SlitPatternError};
use crate::types::{FieldPoint, SimulationConfig};
use crate::validation::{validate_sampling, SamplingParams};
use crate::wfe::{CameraModel, CollimatorModel, WfeDescriptor, WfeError, WfeSummary};

/// Errors that abort a wavelength's run. No partial composite is returned.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Pupil sampling must be a positive integer, got {0}")]
    NonIntegerSampling(f64),

    #[error("Pupil gamma must be a positive integer, got {0}")]
    InvalidGamma(f64),

    #[error("Pupil sampling must be a power of two, got {0}")]
    SamplingNotPowerOfTwo(usize),

    #[error("Pupil grid is {rows}x{cols} but sampling is {sampling}")]
    GridMismatch { sampling: usize, rows: usize, cols: usize },

    #[error("Wavelength must be positive and finite, got {0} nm")]
    InvalidWavelength(f64),

    #[error("Field plane error: {0}")]
    Field(#[from] FieldError),

    #[error("Slice geometry error: {0}")]
    Geometry(#[from] SliceError),

    #[error("Slit pattern error: {0}")]
    SlitPattern(#[from] SlitPatternError),

    #[error("Slit pattern returned {got} field points for {expected} slitlets")]
    FieldCountMismatch { expected: usize, got: usize },

    #[error("{component} WFE error: {source}")]
    Wfe {
        component: String,
        #[source]
        source: WfeError,
    },

    #[error("{component} returned no WFE descriptor for field {field_index}")]
    MissingWfe { component: String, field_index: usize },

    #[error("{component} returned {got} WFE descriptors for {expected} fields")]
    WfeCountMismatch {
        component: String,
        expected: usize,
        got: usize,
    },
}

/// The image-plane sampling every wavelength is resampled onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceGrid {
    /// Wavelength (nm) the grid was derived at.
    pub wavelength_nm: f64,
    /// Pixel scale (arcsec).
    pub pixel_scale: f64,
    /// Field of view (arcsec).
    pub field_of_view: f64,
}

impl ReferenceGrid {
    /// Grid of the pupil's conjugate image at `wavelength_nm`.
    pub fn from_pupil(pupil: &PupilPlane, wavelength_nm: f64) -> Result<Self, FieldError> {
        let pixel_scale = pupil.conjugate_pixel_scale(wavelength_nm)?;
        Ok(Self {
            wavelength_nm,
            pixel_scale,
            field_of_view: pupil.data.ncols() as f64 * pixel_scale,
        })
    }
}

/// Output of the resampling stage, before any slicing.
#[derive(Debug, Clone)]
pub struct Baseline {
    /// Image on the reference grid.
    pub image: ImagePlane,
    /// Pupil conjugate to `image`.
    pub pupil: PupilPlane,
    pub sampling: SamplingParams,
}

/// What happened to one slice.
#[derive(Debug, Clone, Serialize)]
pub struct SliceReport {
    pub index: usize,
    pub region: SliceRegion,
    /// Slit field point of this slitlet.
    pub field: FieldPoint,
    pub collimator_wfe: Option<WfeSummary>,
    pub camera_wfe: Option<WfeSummary>,
}

/// The composite image produced by one run.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    /// Resampled baseline with every processed slice written over it.
    pub image: ImagePlane,
    pub layout: SliceLayout,
    /// One report per processed slice, in slitlet order. Empty when no WFE
    /// stage is enabled.
    pub slices: Vec<SliceReport>,
}

impl CompositeImage {
    pub fn wavelength_nm(&self) -> f64 {
        self.image.wavelength_nm
    }

    pub fn processed_slices(&self) -> usize {
        self.slices.len()
    }

    pub fn intensity(&self) -> Array2<f64> {
        self.image.intensity()
    }

    pub fn total_power(&self) -> f64 {
        self.image.total_power()
    }
}

/// Descriptors and pupil diameter for one enabled WFE stage.
struct WfeStage {
    component: String,
    descriptors: Vec<WfeDescriptor>,
    pupil_diameter: f64,
}

impl WfeStage {
    fn descriptor(&self, field_index: usize) -> Result<&WfeDescriptor, SimulationError> {
        self.descriptors.get(field_index).ok_or_else(|| SimulationError::MissingWfe {
            component: self.component.clone(),
            field_index,
        })
    }
}

struct WfeStages {
    collimator: Option<WfeStage>,
    camera: Option<WfeStage>,
}

struct SliceOutput {
    data: Array2<Complex64>,
    report: SliceReport,
}

/// Runs the slicer pipeline for one wavelength at a time.
///
/// The pupil template is owned by the simulator and never mutated; every run
/// works on its own clone, so runs are independent and may execute
/// concurrently.
pub struct SingleWavelengthSimulator {
    pupil: PupilPlane,
    reference: ReferenceGrid,
    camera: Arc<dyn CameraModel>,
    collimator: Arc<dyn CollimatorModel>,
    slit_pattern: Arc<dyn SlitPattern>,
    config: SimulationConfig,
    backend: Arc<dyn ComputeBackend>,
}

impl SingleWavelengthSimulator {
    /// Build a simulator on the CPU backend. The reference grid is fixed here
    /// from `config.pupil_resample_to_wavelength`.
    pub fn new(
        pupil: PupilPlane,
        camera: Arc<dyn CameraModel>,
        collimator: Arc<dyn CollimatorModel>,
        slit_pattern: Arc<dyn SlitPattern>,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let reference = ReferenceGrid::from_pupil(&pupil, config.pupil_resample_to_wavelength)?;
        Ok(Self {
            pupil,
            reference,
            camera,
            collimator,
            slit_pattern,
            config,
            backend: Arc::new(CpuBackend::new()),
        })
    }

    /// Replace the compute backend.
    pub fn with_backend(mut self, backend: Arc<dyn ComputeBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn reference(&self) -> &ReferenceGrid {
        &self.reference
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The shared pupil template.
    pub fn pupil(&self) -> &PupilPlane {
        &self.pupil
    }

    /// Validate, clone the template, image it at `wavelength_nm`, resample
    /// onto the reference grid and return to the pupil.
    pub fn baseline(&self, wavelength_nm: f64) -> Result<Baseline, SimulationError> {
        let sampling = validate_sampling(self.pupil.sampling, self.pupil.gamma)?;
        let (rows, cols) = self.pupil.data.dim();
        if rows != sampling.sampling || cols != sampling.sampling {
            return Err(SimulationError::GridMismatch {
                sampling: sampling.sampling,
                rows,
                cols,
            });
        }
        if !wavelength_nm.is_finite() || wavelength_nm <= 0.0 {
            return Err(SimulationError::InvalidWavelength(wavelength_nm));
        }

        let backend = self.backend.as_ref();
        let this_pupil = self.pupil.clone();
        let mut image = this_pupil.to_conjugate_image(wavelength_nm, self.camera.as_ref(), backend)?;
        debug!(
            "λ={:.1} nm: native pixel scale {:.4e} arcsec, resampling to {:.4e} arcsec",
            wavelength_nm, image.pixel_scale, self.reference.pixel_scale
        );
        image.resample(self.reference.pixel_scale, self.reference.field_of_view, backend)?;
        let pupil = image.to_conjugate_pupil(backend)?;

        Ok(Baseline { image, pupil, sampling })
    }

    /// Simulate one wavelength and return the composite image.
    pub fn run(&self, wavelength_nm: f64) -> Result<CompositeImage, SimulationError> {
        let Baseline { image, pupil, sampling } = self.baseline(wavelength_nm)?;

        let geometry = self.slit_pattern.geometry();
        debug!(
            "Slit pattern '{}': {} slitlets, stack width {:.4}",
            self.slit_pattern.name(),
            geometry.n_slitlets,
            geometry.stack_width()
        );
        let layout = SliceLayout::compute(
            pupil.data.dim(),
            sampling.gamma,
            self.config.slice_resel_per_slice,
            geometry,
        )?;

        let fields = self.slit_pattern.field_points(geometry.n_slitlets)?;
        if fields.len() != geometry.n_slitlets {
            return Err(SimulationError::FieldCountMismatch {
                expected: geometry.n_slitlets,
                got: fields.len(),
            });
        }

        let stages = self.acquire_wfe(&fields, wavelength_nm)?;
        let mut composite = CompositeImage {
            image,
            layout,
            slices: Vec::with_capacity(fields.len()),
        };

        if stages.collimator.is_none() && stages.camera.is_none() {
            // Without WFE the slice round trip is the identity.
            debug!("λ={:.1} nm: no WFE stages enabled, composite is the resampled baseline", wavelength_nm);
            return Ok(composite);
        }

        let slicer_image = pupil.to_conjugate_image(wavelength_nm, self.camera.as_ref(), self.backend.as_ref())?;
        let regions = composite.layout.regions.clone();
        let process = |index: usize| {
            self.process_slice(index, &regions[index], &slicer_image, &fields, &stages, wavelength_nm)
        };

        let outputs: Vec<SliceOutput> = if self.config.parallel_slices {
            composite.layout.ensure_disjoint()?;
            (0..regions.len())
                .into_par_iter()
                .map(process)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            (0..regions.len()).map(process).collect::<Result<Vec<_>, _>>()?
        };

        for output in outputs {
            composite.image.set_region_data(&output.report.region, &output.data)?;
            composite.slices.push(output.report);
        }

        info!(
            "λ={:.1} nm: {} slices processed",
            wavelength_nm,
            composite.processed_slices()
        );
        Ok(composite)
    }

    /// Request WFE maps for every enabled stage.
    fn acquire_wfe(&self, fields: &[FieldPoint], wavelength_nm: f64) -> Result<WfeStages, SimulationError> {
        let sampling = self.config.pupil_wfe_map_sampling;

        let collimator = if self.config.sim_add_collimator_wfe {
            let provider = self.collimator.as_ref();
            let wrap = |source| wfe_error(provider.name(), source);
            let descriptors = provider.wfe(fields, wavelength_nm, sampling).map_err(wrap)?;
            let pupil_diameter = provider.entrance_pupil_diameter(wavelength_nm).map_err(wrap)?;
            Some(checked_stage(provider.name(), descriptors, pupil_diameter, fields.len())?)
        } else {
            None
        };

        let camera = if self.config.sim_add_camera_wfe {
            let axis = self
                .collimator
                .optical_axis(fields, wavelength_nm)
                .map_err(|source| wfe_error(self.collimator.name(), source))?;
            let provider = self.camera.as_ref();
            let wrap = |source| wfe_error(provider.name(), source);
            let descriptors = provider.wfe(&axis, wavelength_nm, sampling).map_err(wrap)?;
            let pupil_diameter = provider.entrance_pupil_diameter(wavelength_nm).map_err(wrap)?;
            Some(checked_stage(provider.name(), descriptors, pupil_diameter, fields.len())?)
        } else {
            None
        };

        Ok(WfeStages { collimator, camera })
    }

    fn process_slice(
        &self,
        index: usize,
        region: &SliceRegion,
        slicer_image: &ImagePlane,
        fields: &[FieldPoint],
        stages: &WfeStages,
        wavelength_nm: f64,
    ) -> Result<SliceOutput, SimulationError> {
        let backend = self.backend.as_ref();
        let mut slice_pupil = slicer_image.to_region(region)?.to_conjugate_pupil(backend)?;

        let mut report = SliceReport {
            index,
            region: *region,
            field: fields[index],
            collimator_wfe: None,
            camera_wfe: None,
        };

        if let Some(stage) = &stages.collimator {
            debug!("Adding collimator WFE to slice {}", index);
            let wfe = stage.descriptor(index)?;
            report.collimator_wfe =
                Some(slice_pupil.add_wfe(stage.pupil_diameter, &wfe.defocus, &wfe.higher_order, backend)?);
        }
        if let Some(stage) = &stages.camera {
            debug!("Adding camera WFE to slice {}", index);
            let wfe = stage.descriptor(index)?;
            report.camera_wfe =
                Some(slice_pupil.add_wfe(stage.pupil_diameter, &wfe.defocus, &wfe.higher_order, backend)?);
        }

        let slice_image = slice_pupil.to_conjugate_image(wavelength_nm, self.camera.as_ref(), backend)?;
        Ok(SliceOutput {
            data: slice_image.data,
            report,
        })
    }
}

fn wfe_error(component: &str, source: WfeError) -> SimulationError {
    SimulationError::Wfe {
        component: component.to_string(),
        source,
    }
}

fn checked_stage(
    component: &str,
    descriptors: Vec<WfeDescriptor>,
    pupil_diameter: f64,
    n_fields: usize,
) -> Result<WfeStage, SimulationError> {
    if descriptors.len() < n_fields {
        return Err(SimulationError::MissingWfe {
            component: component.to_string(),
            field_index: descriptors.len(),
        });
    }
    if descriptors.len() != n_fields {
        return Err(SimulationError::WfeCountMismatch {
            component: component.to_string(),
            expected: n_fields,
            got: descriptors.len(),
        });
    }
    Ok(WfeStage {
        component: component.to_string(),
        descriptors,
        pupil_diameter,
    })
}
