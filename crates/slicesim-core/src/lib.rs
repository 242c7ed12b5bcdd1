//! # slicesim Core
//!
//! Single-wavelength propagation of a monochromatic wavefront through a
//! slicer-based integral-field spectrograph.
//!
//! ## Architecture
//!
//! A sampled pupil field is imaged, resampled onto a detector grid shared by
//! all wavelengths, cut into the slitlet regions of the image slicer, given
//! per-slice wavefront error from the collimator and camera, and reassembled
//! into a composite image by [`simulator::SingleWavelengthSimulator`].
//! Optical components and slit patterns are reached through traits
//! ([`wfe::CameraModel`], [`wfe::CollimatorModel`], [`slit::SlitPattern`]);
//! FFTs and grid fills go through `slicesim_compute::ComputeBackend`.
//!
//! ## Modules
//!
//! - [`types`] - Field points, slicer geometry, simulator configuration.
//! - [`field`] - Pupil- and image-plane fields and their transforms.
//! - [`slicing`] - Slice regions on a field grid.
//! - [`validation`] - Sampling checks run at the start of every simulation.
//! - [`wfe`] - WFE descriptors and component interfaces.
//! - [`slit`] - Slit-pattern interface.
//! - [`simulator`] - The single-wavelength pipeline.

pub mod field;
pub mod simulator;
pub mod slicing;
pub mod slit;
pub mod types;
pub mod validation;
pub mod wfe;

pub use field::{FieldPlane, ImagePlane, OpticalDomain, PupilPlane};
pub use simulator::{CompositeImage, SimulationError, SingleWavelengthSimulator};
pub use slicing::{SliceLayout, SliceRegion};
