//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over execution environments so that
//! the field-plane code in `slicesim-core` never touches an FFT library or a
//! thread pool directly.

use ndarray::Array2;
use num_complex::Complex64;
use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Device error: {0}")]
    DeviceError(String),

    #[error("Empty grid: {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Cpu,
}

/// Direction of a 2-D Fourier transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftDirection {
    Forward,
    Inverse,
}

/// Abstraction over compute backends.
///
/// Field planes call into this trait for the two hot paths of the pipeline:
/// conjugate-plane transforms (2-D FFTs) and per-sample grid construction
/// (resampling, phase screens).
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// In-place 2-D FFT with orthonormal scaling.
    ///
    /// Both directions are scaled by $1/\sqrt{N_{\text{rows}} N_{\text{cols}}}$,
    /// so a forward transform followed by an inverse one is the identity and
    /// total power $\sum |E|^2$ is preserved. No shifting is applied; callers
    /// centre the grid themselves.
    fn fft2(&self, data: &mut Array2<Complex64>, direction: FftDirection) -> Result<(), ComputeError>;

    /// Build a `rows x cols` grid by evaluating `fill_fn(row, col)` for every
    /// sample. Each sample is independent, so backends are free to evaluate
    /// them in any order.
    fn parallel_fill(
        &self,
        rows: usize,
        cols: usize,
        fill_fn: &(dyn Fn(usize, usize) -> Complex64 + Send + Sync),
    ) -> Result<Array2<Complex64>, ComputeError>;
}
