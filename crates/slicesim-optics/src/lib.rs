//! # slicesim Optics
//!
//! Camera and collimator models for the slicer simulator. Both implement the
//! WFE interfaces of `slicesim_core::wfe` from a small set of Zernike terms
//! whose coefficients are tabulated against wavelength.
//!
//! ## Components
//!
//! | Component | Module | Field units |
//! |-----------|--------|-------------|
//! | [`Camera`] | [`camera`] | camera field angle (deg) |
//! | [`Collimator`] | [`collimator`] | slit position (arcsec) |
//!
//! The collimator also maps slit fields onto camera field angles
//! (`CollimatorModel::optical_axis`), which is how camera WFE is looked up
//! for each slitlet.
//!
//! ## Interpolation
//!
//! Tabulated coefficients and pupil diameters are interpolated with natural
//! cubic splines ([`spline::CubicSpline`]) and are not extrapolated.

pub mod camera;
pub mod collimator;
pub mod curve;
pub mod error;
pub mod model;
pub mod spline;
pub mod zernike;

pub use camera::{Camera, CameraSpec};
pub use collimator::{Collimator, CollimatorSpec};
pub use curve::TabulatedCurve;
pub use error::OpticsError;
pub use model::{ZernikeTermSpec, ZernikeWfeModel};
