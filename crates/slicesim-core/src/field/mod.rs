//! Sampled optical fields in the pupil and image domains.
//!
//! The two domains are separate types, [`PupilPlane`] and [`ImagePlane`],
//! connected by conjugate-plane transforms:
//!
//! ```text
//!   PupilPlane ──to_conjugate_image(λ, camera)──▶ ImagePlane
//!        ▲                                           │
//!        └──────────────to_conjugate_pupil()─────────┘
//! ```
//!
//! Both grids are centred on sample `(N/2, N/2)`. The transforms are
//! orthonormal, so a round trip without resampling reproduces the original
//! field to rounding error.

pub mod image;
pub mod pupil;
pub mod sampling;

pub use image::ImagePlane;
pub use pupil::PupilPlane;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use slicesim_compute::{ComputeBackend, ComputeError, FftDirection};
use thiserror::Error;

use crate::slicing::SliceRegion;

/// Errors raised by field-plane operations.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Compute backend error: {0}")]
    Compute(#[from] ComputeError),

    #[error("Conjugate transforms need a square grid, got {rows}x{cols}")]
    NonSquareGrid { rows: usize, cols: usize },

    #[error("Pupil plane has no wavelength; derive it from an image plane before adding WFE")]
    UnknownWavelength,

    #[error("Malformed WFE map: {0}")]
    MalformedWfe(String),

    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    #[error("Region {region} lies outside the {rows}x{cols} grid")]
    RegionOutOfBounds { region: SliceRegion, rows: usize, cols: usize },

    #[error("Data shape {got:?} matches neither region {expected:?} nor grid {grid:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
        grid: (usize, usize),
    },
}

/// The optical domain a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpticalDomain {
    Pupil,
    Image,
}

/// Behaviour shared by both field domains.
pub trait FieldPlane {
    fn domain(&self) -> OpticalDomain;

    fn data(&self) -> &Array2<Complex64>;

    /// Grid shape as `(rows, cols)`.
    fn shape(&self) -> (usize, usize) {
        self.data().dim()
    }

    /// Total power $\sum |E|^2$ over the grid.
    fn total_power(&self) -> f64 {
        self.data().iter().map(|v| v.norm_sqr()).sum()
    }
}

/// Return the side length of a square grid, or an error.
pub(crate) fn square_side(data: &Array2<Complex64>) -> Result<usize, FieldError> {
    let (rows, cols) = data.dim();
    if rows != cols || rows == 0 {
        return Err(FieldError::NonSquareGrid { rows, cols });
    }
    Ok(rows)
}

/// Centred 2-D transform: the sample at `(N/2, N/2)` maps to the zero
/// frequency and back.
pub(crate) fn centred_fft(
    data: &Array2<Complex64>,
    direction: FftDirection,
    backend: &dyn ComputeBackend,
) -> Result<Array2<Complex64>, FieldError> {
    let mut work = ifftshift(data);
    backend.fft2(&mut work, direction)?;
    Ok(fftshift(&work))
}

/// Move the zero-frequency sample from index 0 to index `N/2`.
pub(crate) fn fftshift(data: &Array2<Complex64>) -> Array2<Complex64> {
    let (rows, cols) = data.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        data[[(i + rows - rows / 2) % rows, (j + cols - cols / 2) % cols]]
    })
}

/// Inverse of [`fftshift`]; differs from it only for odd grid sizes.
pub(crate) fn ifftshift(data: &Array2<Complex64>) -> Array2<Complex64> {
    let (rows, cols) = data.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        data[[(i + rows / 2) % rows, (j + cols / 2) % cols]]
    })
}
