//! Pupil-plane fields.

use ndarray::Array2;
use num_complex::Complex64;
use slicesim_compute::{ComputeBackend, FftDirection};

use super::sampling::sample_bilinear;
use super::{centred_fft, square_side, FieldError, FieldPlane, ImagePlane, OpticalDomain};
use crate::types::{NM_TO_M, RAD_TO_ARCSEC};
use crate::wfe::{CameraModel, WfeSummary};

/// Samples below this fraction of the peak power are outside the pupil
/// support when summarising an injected WFE.
const SUPPORT_THRESHOLD: f64 = 1e-12;

/// A sampled complex field in the pupil domain.
///
/// `sampling` and `gamma` are the nominal values the pupil was configured
/// with. They are validated at the start of every simulation run rather than
/// at construction, so a plane can carry parameters that the simulator will
/// reject.
#[derive(Debug, Clone)]
pub struct PupilPlane {
    /// Complex amplitude, `sampling x sampling`.
    pub data: Array2<Complex64>,
    /// Physical diameter of the pupil (m).
    pub physical_pupil_diameter: f64,
    /// Grid samples across the plane. Must be a power of two.
    pub sampling: f64,
    /// Oversampling factor: image-plane pixels per resolution element.
    pub gamma: f64,
    /// Size of one grid sample (m).
    pub pixel_size: f64,
    /// Wavelength (nm) of a pupil derived from an image plane.
    pub wavelength_nm: Option<f64>,
}

impl PupilPlane {
    /// Wrap existing data. The sample size follows from the nominal
    /// parameters: the pupil diameter spans `sampling / gamma` samples.
    pub fn new(data: Array2<Complex64>, physical_pupil_diameter: f64, sampling: f64, gamma: f64) -> Self {
        Self {
            data,
            physical_pupil_diameter,
            sampling,
            gamma,
            pixel_size: physical_pupil_diameter * gamma / sampling,
            wavelength_nm: None,
        }
    }

    /// Uniformly illuminated circular pupil centred on the grid.
    pub fn circular(physical_pupil_diameter: f64, sampling: usize, gamma: usize) -> Self {
        let radius_px = sampling as f64 / gamma.max(1) as f64 / 2.0;
        let centre = (sampling / 2) as f64;
        let data = Array2::from_shape_fn((sampling, sampling), |(i, j)| {
            let r = (i as f64 - centre).hypot(j as f64 - centre);
            if r <= radius_px {
                Complex64::new(1.0, 0.0)
            } else {
                Complex64::new(0.0, 0.0)
            }
        });
        Self::new(data, physical_pupil_diameter, sampling as f64, gamma as f64)
    }

    /// Angular size (arcsec) of one sample in the conjugate image plane:
    /// $\lambda / (N \, \delta_{\text{pupil}})$, which equals
    /// $\lambda / (D \gamma)$ for a freshly built pupil.
    pub fn conjugate_pixel_scale(&self, wavelength_nm: f64) -> Result<f64, FieldError> {
        let n = square_side(&self.data)?;
        if !wavelength_nm.is_finite() || wavelength_nm <= 0.0 {
            return Err(FieldError::InvalidScale(format!("wavelength {} nm", wavelength_nm)));
        }
        if !self.pixel_size.is_finite() || self.pixel_size <= 0.0 {
            return Err(FieldError::InvalidScale(format!("pupil sample size {} m", self.pixel_size)));
        }
        Ok(wavelength_nm * NM_TO_M / (n as f64 * self.pixel_size) * RAD_TO_ARCSEC)
    }

    /// Transform to the conjugate image plane at `wavelength_nm`.
    ///
    /// The camera's focal length maps the angular pixel scale onto the focal
    /// plane.
    pub fn to_conjugate_image(
        &self,
        wavelength_nm: f64,
        camera: &dyn CameraModel,
        backend: &dyn ComputeBackend,
    ) -> Result<ImagePlane, FieldError> {
        let n = square_side(&self.data)?;
        let pixel_scale = self.conjugate_pixel_scale(wavelength_nm)?;
        let data = centred_fft(&self.data, FftDirection::Forward, backend)?;

        Ok(ImagePlane {
            data,
            wavelength_nm,
            pixel_scale,
            detector_field_of_view: n as f64 * pixel_scale,
            linear_pixel_scale: pixel_scale / RAD_TO_ARCSEC * camera.focal_length(),
            physical_pupil_diameter: self.physical_pupil_diameter,
            sampling: self.sampling,
            gamma: self.gamma,
        })
    }

    /// Inject a wavefront error.
    ///
    /// `defocus_map` and `higher_order_map` are OPD maps (nm) sampled across
    /// `pupil_diameter` metres and centred on the pupil. Their sum is
    /// interpolated onto every grid sample and applied as the phase
    /// $2\pi \, \mathrm{OPD} / \lambda$. Samples beyond the map carry no
    /// aberration.
    pub fn add_wfe(
        &mut self,
        pupil_diameter: f64,
        defocus_map: &Array2<f64>,
        higher_order_map: &Array2<f64>,
        backend: &dyn ComputeBackend,
    ) -> Result<WfeSummary, FieldError> {
        let wavelength_nm = self.wavelength_nm.ok_or(FieldError::UnknownWavelength)?;
        let n = square_side(&self.data)?;

        if !pupil_diameter.is_finite() || pupil_diameter <= 0.0 {
            return Err(FieldError::InvalidScale(format!("WFE pupil diameter {} m", pupil_diameter)));
        }
        let (m_rows, m_cols) = defocus_map.dim();
        if m_rows == 0 || m_rows != m_cols {
            return Err(FieldError::MalformedWfe(format!(
                "defocus map must be square and non-empty, got {}x{}",
                m_rows, m_cols
            )));
        }
        if higher_order_map.dim() != defocus_map.dim() {
            return Err(FieldError::MalformedWfe(format!(
                "higher-order map is {:?} but defocus map is {:?}",
                higher_order_map.dim(),
                defocus_map.dim()
            )));
        }

        let total = defocus_map + higher_order_map;
        let m = m_cols as f64;
        let centre = (n / 2) as f64;
        let to_map = |idx: usize| {
            let x = (idx as f64 - centre) * self.pixel_size;
            x * m / pupil_diameter + m / 2.0 - 0.5
        };
        let opd = Array2::from_shape_fn((n, n), |(i, j)| sample_bilinear(&total, to_map(i), to_map(j)));

        let k = 2.0 * std::f64::consts::PI / wavelength_nm;
        let phasor = backend.parallel_fill(n, n, &|i, j| Complex64::from_polar(1.0, k * opd[[i, j]]))?;

        let summary = summarise_opd(&self.data, &opd);
        self.data *= &phasor;
        Ok(summary)
    }
}

impl FieldPlane for PupilPlane {
    fn domain(&self) -> OpticalDomain {
        OpticalDomain::Pupil
    }

    fn data(&self) -> &Array2<Complex64> {
        &self.data
    }
}

/// RMS and peak-to-valley OPD over the illuminated samples.
fn summarise_opd(field: &Array2<Complex64>, opd: &Array2<f64>) -> WfeSummary {
    let peak = field.iter().map(|v| v.norm_sqr()).fold(0.0_f64, f64::max);
    let support: Vec<f64> = field
        .iter()
        .zip(opd.iter())
        .filter(|(e, _)| peak > 0.0 && e.norm_sqr() > SUPPORT_THRESHOLD * peak)
        .map(|(_, &w)| w)
        .collect();

    if support.is_empty() {
        return WfeSummary::default();
    }

    let count = support.len() as f64;
    let mean = support.iter().sum::<f64>() / count;
    let variance = support.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / count;
    let max = support.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = support.iter().copied().fold(f64::INFINITY, f64::min);

    WfeSummary {
        rms_nm: variance.sqrt(),
        peak_to_valley_nm: max - min,
        samples: support.len(),
    }
}
