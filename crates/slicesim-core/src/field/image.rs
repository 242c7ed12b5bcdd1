//! Image-plane fields.

use ndarray::{s, Array2};
use num_complex::Complex64;
use slicesim_compute::{ComputeBackend, FftDirection};

use super::sampling::sample_bilinear;
use super::{centred_fft, square_side, FieldError, FieldPlane, OpticalDomain, PupilPlane};
use crate::slicing::SliceRegion;
use crate::types::{NM_TO_M, RAD_TO_ARCSEC};

/// A sampled complex field in the image domain.
#[derive(Debug, Clone)]
pub struct ImagePlane {
    /// Complex amplitude.
    pub data: Array2<Complex64>,
    /// Wavelength (nm) the field was propagated at.
    pub wavelength_nm: f64,
    /// Angular size of one pixel (arcsec).
    pub pixel_scale: f64,
    /// Angular extent of the grid (arcsec).
    pub detector_field_of_view: f64,
    /// Size of one pixel at the camera focal plane (m).
    pub linear_pixel_scale: f64,
    /// Pupil metadata carried for the back transform.
    pub physical_pupil_diameter: f64,
    pub sampling: f64,
    pub gamma: f64,
}

impl ImagePlane {
    /// Resample in place onto `pixel_scale` (arcsec) over `field_of_view`
    /// (arcsec), keeping the grid centre fixed.
    ///
    /// Amplitudes are scaled by the ratio of pixel scales so total power is
    /// conserved. Resampling onto the current scale and field of view leaves
    /// the data untouched.
    pub fn resample(
        &mut self,
        pixel_scale: f64,
        field_of_view: f64,
        backend: &dyn ComputeBackend,
    ) -> Result<(), FieldError> {
        if !pixel_scale.is_finite() || pixel_scale <= 0.0 {
            return Err(FieldError::InvalidScale(format!("pixel scale {} arcsec", pixel_scale)));
        }
        if !field_of_view.is_finite() || field_of_view <= 0.0 {
            return Err(FieldError::InvalidScale(format!("field of view {} arcsec", field_of_view)));
        }
        let n_new = (field_of_view / pixel_scale).round() as usize;
        if n_new == 0 {
            return Err(FieldError::InvalidScale(format!(
                "field of view {} arcsec is smaller than one {} arcsec pixel",
                field_of_view, pixel_scale
            )));
        }

        let n_old = square_side(&self.data)?;
        let ratio = pixel_scale / self.pixel_scale;
        let c_old = (n_old / 2) as f64;
        let c_new = (n_new / 2) as f64;
        let source = &self.data;

        let resampled = backend.parallel_fill(n_new, n_new, &|i, j| {
            let row = (i as f64 - c_new) * ratio + c_old;
            let col = (j as f64 - c_new) * ratio + c_old;
            sample_bilinear(source, row, col) * ratio
        })?;

        self.data = resampled;
        self.linear_pixel_scale *= ratio;
        self.pixel_scale = pixel_scale;
        self.detector_field_of_view = n_new as f64 * pixel_scale;
        Ok(())
    }

    /// Transform back to the conjugate pupil plane.
    ///
    /// The pupil sample size follows from the current pixel scale, so a
    /// resampled image yields a pupil sampled for the new scale.
    pub fn to_conjugate_pupil(&self, backend: &dyn ComputeBackend) -> Result<PupilPlane, FieldError> {
        let n = square_side(&self.data)?;
        let data = centred_fft(&self.data, FftDirection::Inverse, backend)?;
        let scale_rad = self.pixel_scale / RAD_TO_ARCSEC;

        Ok(PupilPlane {
            data,
            physical_pupil_diameter: self.physical_pupil_diameter,
            sampling: self.sampling,
            gamma: self.gamma,
            pixel_size: self.wavelength_nm * NM_TO_M / (n as f64 * scale_rad),
            wavelength_nm: Some(self.wavelength_nm),
        })
    }

    /// Copy of this plane with everything outside `region` set to zero.
    pub fn to_region(&self, region: &SliceRegion) -> Result<ImagePlane, FieldError> {
        self.check_region(region)?;
        let mut out = self.clone();
        out.data.fill(Complex64::new(0.0, 0.0));
        out.data
            .slice_mut(s![region.rows(), region.cols()])
            .assign(&self.data.slice(s![region.rows(), region.cols()]));
        Ok(out)
    }

    /// Overwrite `region` in place.
    ///
    /// `data` may be shaped like the region itself or like the whole grid, in
    /// which case only its window over `region` is copied.
    pub fn set_region_data(&mut self, region: &SliceRegion, data: &Array2<Complex64>) -> Result<(), FieldError> {
        self.check_region(region)?;
        let region_shape = (region.height(), region.width());
        let grid_shape = self.data.dim();

        let mut target = self.data.slice_mut(s![region.rows(), region.cols()]);
        if data.dim() == region_shape {
            target.assign(data);
        } else if data.dim() == grid_shape {
            target.assign(&data.slice(s![region.rows(), region.cols()]));
        } else {
            return Err(FieldError::ShapeMismatch {
                expected: region_shape,
                got: data.dim(),
                grid: grid_shape,
            });
        }
        Ok(())
    }

    /// Intensity $|E|^2$ per pixel.
    pub fn intensity(&self) -> Array2<f64> {
        self.data.mapv(|v| v.norm_sqr())
    }

    fn check_region(&self, region: &SliceRegion) -> Result<(), FieldError> {
        let (rows, cols) = self.data.dim();
        if !region.fits_within(rows, cols) {
            return Err(FieldError::RegionOutOfBounds { region: *region, rows, cols });
        }
        Ok(())
    }
}

impl FieldPlane for ImagePlane {
    fn domain(&self) -> OpticalDomain {
        OpticalDomain::Image
    }

    fn data(&self) -> &Array2<Complex64> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use slicesim_compute::CpuBackend;

    fn plane(n: usize) -> ImagePlane {
        ImagePlane {
            data: Array2::from_shape_fn((n, n), |(i, j)| Complex64::new(i as f64, j as f64)),
            wavelength_nm: 600.0,
            pixel_scale: 0.01,
            detector_field_of_view: n as f64 * 0.01,
            linear_pixel_scale: 1e-6,
            physical_pupil_diameter: 1.0,
            sampling: n as f64,
            gamma: 2.0,
        }
    }

    #[test]
    fn test_resample_onto_own_grid_is_identity() {
        let mut im = plane(16);
        let original = im.data.clone();
        im.resample(0.01, 0.16, &CpuBackend::new()).unwrap();
        assert_eq!(im.data, original);
    }

    #[test]
    fn test_resample_updates_scales() {
        let mut im = plane(16);
        im.resample(0.02, 0.16, &CpuBackend::new()).unwrap();
        assert_eq!(im.data.dim(), (8, 8));
        assert_abs_diff_eq!(im.pixel_scale, 0.02);
        assert_abs_diff_eq!(im.detector_field_of_view, 0.16, epsilon = 1e-12);
        assert_abs_diff_eq!(im.linear_pixel_scale, 2e-6, epsilon = 1e-18);
    }

    #[test]
    fn test_resample_conserves_power_of_smooth_field() {
        let n = 64;
        let c = (n / 2) as f64;
        let mut im = plane(n);
        im.data = Array2::from_shape_fn((n, n), |(i, j)| {
            let r2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2);
            Complex64::new((-r2 / 50.0).exp(), 0.0)
        });
        let before = im.total_power();
        im.resample(0.008, 0.64, &CpuBackend::new()).unwrap();
        let after = im.total_power();
        assert!((after - before).abs() / before < 0.02, "before={} after={}", before, after);
    }

    #[test]
    fn test_resample_rejects_bad_scale() {
        let mut im = plane(8);
        assert!(matches!(
            im.resample(0.0, 0.08, &CpuBackend::new()),
            Err(FieldError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_to_region_zeroes_outside() {
        let im = plane(8);
        let region = SliceRegion { x_start: 2, x_end: 5, y_start: 1, y_end: 3 };
        let sliced = im.to_region(&region).unwrap();
        assert_eq!(sliced.data[[1, 2]], im.data[[1, 2]]);
        assert_eq!(sliced.data[[2, 4]], im.data[[2, 4]]);
        assert_eq!(sliced.data[[3, 4]], Complex64::new(0.0, 0.0));
        assert_eq!(sliced.data[[1, 5]], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_set_region_data_accepts_both_shapes() {
        let mut im = plane(8);
        let region = SliceRegion { x_start: 0, x_end: 2, y_start: 6, y_end: 8 };

        let small = Array2::from_elem((2, 2), Complex64::new(9.0, 0.0));
        im.set_region_data(&region, &small).unwrap();
        assert_eq!(im.data[[7, 1]], Complex64::new(9.0, 0.0));

        let full = Array2::from_elem((8, 8), Complex64::new(-1.0, 0.0));
        im.set_region_data(&region, &full).unwrap();
        assert_eq!(im.data[[6, 0]], Complex64::new(-1.0, 0.0));
        assert_eq!(im.data[[5, 0]], Complex64::new(5.0, 0.0));
    }

    #[test]
    fn test_set_region_data_rejects_other_shapes() {
        let mut im = plane(8);
        let region = SliceRegion { x_start: 0, x_end: 2, y_start: 0, y_end: 2 };
        let wrong = Array2::<Complex64>::zeros((3, 3));
        assert!(matches!(
            im.set_region_data(&region, &wrong),
            Err(FieldError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_region_outside_grid_rejected() {
        let im = plane(8);
        let region = SliceRegion { x_start: 6, x_end: 10, y_start: 0, y_end: 2 };
        assert!(matches!(
            im.to_region(&region),
            Err(FieldError::RegionOutOfBounds { .. })
        ));
    }
}
