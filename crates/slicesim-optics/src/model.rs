//! Zernike wavefront-error model of an optical component.
//!
//! Each term has a nominal coefficient tabulated against wavelength and a
//! quadratic growth with normalised field radius $h = |f| / f_{max}$:
//!
//! $$ c_j(\lambda, f) = c_j^{nom}(\lambda)\,(1 + q_j h^2) $$
//!
//! Non-rotationally-symmetric terms are oriented along the field azimuth,
//! so a field on the x axis sees them in their tabulated orientation.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use slicesim_core::types::FieldPoint;
use slicesim_core::wfe::WfeDescriptor;

use crate::curve::{Curve, TabulatedCurve};
use crate::error::OpticsError;
use crate::zernike::{noll_to_nm, zernike, DEFOCUS_NOLL};

/// Configuration of one Zernike term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZernikeTermSpec {
    pub noll: usize,
    /// RMS coefficient (nm) against wavelength.
    pub nominal: TabulatedCurve,
    /// Fractional growth at the edge of the field.
    #[serde(default)]
    pub field_quadratic: f64,
}

impl ZernikeTermSpec {
    pub fn new(noll: usize, nominal: TabulatedCurve, field_quadratic: f64) -> Self {
        Self {
            noll,
            nominal,
            field_quadratic,
        }
    }
}

#[derive(Debug, Clone)]
struct ZernikeTerm {
    noll: usize,
    n: usize,
    m: i32,
    nominal: Curve,
    field_quadratic: f64,
}

/// Evaluates Zernike terms into defocus and higher-order OPD maps.
#[derive(Debug, Clone)]
pub struct ZernikeWfeModel {
    terms: Vec<ZernikeTerm>,
    field_radius: f64,
}

impl ZernikeWfeModel {
    /// # Arguments
    /// * `terms` - Term configuration; a Noll index may appear once.
    /// * `field_radius` - Field radius at which `field_quadratic` applies in
    ///   full, in the units of the field points passed to [`Self::maps`].
    pub fn new(terms: &[ZernikeTermSpec], field_radius: f64) -> Result<Self, OpticsError> {
        if !field_radius.is_finite() || field_radius <= 0.0 {
            return Err(OpticsError::InvalidParameter(format!(
                "field radius must be positive, got {}",
                field_radius
            )));
        }

        let mut built: Vec<ZernikeTerm> = Vec::with_capacity(terms.len());
        for spec in terms {
            if built.iter().any(|t| t.noll == spec.noll) {
                return Err(OpticsError::InvalidParameter(format!("Noll index {} listed twice", spec.noll)));
            }
            let (n, m) = noll_to_nm(spec.noll)?;
            built.push(ZernikeTerm {
                noll: spec.noll,
                n,
                m,
                nominal: Curve::from_tabulated(&spec.nominal)?,
                field_quadratic: spec.field_quadratic,
            });
        }

        Ok(Self {
            terms: built,
            field_radius,
        })
    }

    /// Intersection of every term's tabulated range.
    pub fn wavelength_range(&self) -> Option<(f64, f64)> {
        self.terms
            .iter()
            .filter_map(|t| t.nominal.range())
            .reduce(|(lo, hi), (min, max)| (lo.max(min), hi.min(max)))
    }

    /// `(noll, coefficient nm)` for every term at one field point.
    pub fn coefficients(&self, field: &FieldPoint, wavelength_nm: f64) -> Result<Vec<(usize, f64)>, OpticsError> {
        let h = field.radius() / self.field_radius;
        self.terms
            .iter()
            .map(|t| {
                let nominal = t.nominal.evaluate(wavelength_nm)?;
                Ok((t.noll, nominal * (1.0 + t.field_quadratic * h * h)))
            })
            .collect()
    }

    /// OPD maps (nm) for one field point on a `sampling x sampling` grid
    /// spanning the unit disc. Samples outside the disc are zero.
    pub fn maps(&self, field: &FieldPoint, wavelength_nm: f64, sampling: usize) -> Result<WfeDescriptor, OpticsError> {
        if sampling == 0 {
            return Err(OpticsError::InvalidSampling(sampling));
        }
        let coefficients = self.coefficients(field, wavelength_nm)?;
        let azimuth = if field.radius() > 0.0 { field.angle() } else { 0.0 };

        let mut defocus = Array2::<f64>::zeros((sampling, sampling));
        let mut higher_order = Array2::<f64>::zeros((sampling, sampling));
        let half = sampling as f64 / 2.0;

        for ((i, j), value) in defocus.indexed_iter_mut() {
            let x = (j as f64 + 0.5 - half) / half;
            let y = (i as f64 + 0.5 - half) / half;
            let rho = x.hypot(y);
            if rho > 1.0 {
                continue;
            }
            let theta = y.atan2(x) - azimuth;

            let mut other = 0.0;
            for (term, (_, c)) in self.terms.iter().zip(&coefficients) {
                let z = c * zernike(term.n, term.m, rho, theta);
                if term.noll == DEFOCUS_NOLL {
                    *value += z;
                } else {
                    other += z;
                }
            }
            higher_order[[i, j]] = other;
        }

        Ok(WfeDescriptor { defocus, higher_order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rms(map: &Array2<f64>) -> f64 {
        let n = map.iter().filter(|v| **v != 0.0).count() as f64;
        (map.iter().map(|v| v * v).sum::<f64>() / n).sqrt()
    }

    fn model() -> ZernikeWfeModel {
        ZernikeWfeModel::new(
            &[
                ZernikeTermSpec::new(4, TabulatedCurve::table(&[500.0, 900.0], &[30.0, 50.0]), 0.0),
                ZernikeTermSpec::new(6, TabulatedCurve::Constant(20.0), 1.0),
            ],
            2.0,
        )
        .unwrap()
    }

    #[test]
    fn test_defocus_separated_from_higher_order() {
        let m = ZernikeWfeModel::new(&[ZernikeTermSpec::new(4, TabulatedCurve::Constant(25.0), 0.0)], 1.0).unwrap();
        let maps = m.maps(&FieldPoint::new(0.0, 0.0), 700.0, 128).unwrap();

        assert!(maps.higher_order.iter().all(|v| *v == 0.0));
        assert_relative_eq!(rms(&maps.defocus), 25.0, max_relative = 0.02);
        assert_eq!(maps.sampling(), 128);
    }

    #[test]
    fn test_field_quadratic_growth() {
        let m = model();
        let on_axis = m.coefficients(&FieldPoint::new(0.0, 0.0), 700.0).unwrap();
        let edge = m.coefficients(&FieldPoint::new(0.0, 2.0), 700.0).unwrap();

        assert_eq!(on_axis[0].0, 4);
        assert_relative_eq!(on_axis[0].1, edge[0].1);
        assert_relative_eq!(on_axis[1].1, 20.0);
        assert_relative_eq!(edge[1].1, 40.0);
    }

    #[test]
    fn test_astigmatism_follows_field_azimuth() {
        let m = ZernikeWfeModel::new(&[ZernikeTermSpec::new(6, TabulatedCurve::Constant(10.0), 0.0)], 1.0).unwrap();
        let along_x = m.maps(&FieldPoint::new(0.5, 0.0), 600.0, 64).unwrap().higher_order;
        let along_y = m.maps(&FieldPoint::new(0.0, 0.5), 600.0, 64).unwrap().higher_order;

        // cos 2θ rotated by 90° changes sign.
        for (a, b) in along_x.iter().zip(along_y.iter()) {
            assert_relative_eq!(*a, -*b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_range_and_errors() {
        let m = model();
        assert_eq!(m.wavelength_range(), Some((500.0, 900.0)));
        assert!(matches!(
            m.maps(&FieldPoint::new(0.0, 0.0), 450.0, 32),
            Err(OpticsError::OutOfRange { .. })
        ));
        assert!(matches!(
            m.maps(&FieldPoint::new(0.0, 0.0), 600.0, 0),
            Err(OpticsError::InvalidSampling(0))
        ));
        assert!(ZernikeWfeModel::new(&[], 0.0).is_err());

        let duplicate = ZernikeTermSpec::new(5, TabulatedCurve::Constant(1.0), 0.0);
        assert!(ZernikeWfeModel::new(&[duplicate.clone(), duplicate], 1.0).is_err());
    }
}
