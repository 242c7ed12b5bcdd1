//! CPU compute backend: `rustfft` for transforms, Rayon for shared-memory
//! parallelism.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo, FftDirection};

/// CPU backend that parallelises work across threads via Rayon.
pub struct CpuBackend {
    num_threads: usize,
}

impl CpuBackend {
    /// Create a new CPU backend using all available threads.
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
        }
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: Some(self.num_threads),
        }
    }

    fn fft2(&self, data: &mut Array2<Complex64>, direction: FftDirection) -> Result<(), ComputeError> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(ComputeError::EmptyGrid { rows, cols });
        }

        let mut planner = FftPlanner::<f64>::new();
        let (row_fft, col_fft) = match direction {
            FftDirection::Forward => (planner.plan_fft_forward(cols), planner.plan_fft_forward(rows)),
            FftDirection::Inverse => (planner.plan_fft_inverse(cols), planner.plan_fft_inverse(rows)),
        };

        // Axis(0) iterates rows, Axis(1) iterates columns.
        data.axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|mut lane| {
                let mut buf: Vec<Complex64> = lane.iter().copied().collect();
                row_fft.process(&mut buf);
                lane.iter_mut().zip(buf).for_each(|(dst, src)| *dst = src);
            });

        let scale = 1.0 / ((rows * cols) as f64).sqrt();
        data.axis_iter_mut(Axis(1))
            .into_par_iter()
            .for_each(|mut lane| {
                let mut buf: Vec<Complex64> = lane.iter().copied().collect();
                col_fft.process(&mut buf);
                lane.iter_mut().zip(buf).for_each(|(dst, src)| *dst = src * scale);
            });

        Ok(())
    }

    fn parallel_fill(
        &self,
        rows: usize,
        cols: usize,
        fill_fn: &(dyn Fn(usize, usize) -> Complex64 + Send + Sync),
    ) -> Result<Array2<Complex64>, ComputeError> {
        use rayon::prelude::*;

        let data: Vec<Complex64> = (0..rows * cols)
            .into_par_iter()
            .map(|idx| {
                let i = idx / cols;
                let j = idx % cols;
                fill_fn(i, j)
            })
            .collect();

        Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| ComputeError::DeviceError(e.to_string()))
    }
}
