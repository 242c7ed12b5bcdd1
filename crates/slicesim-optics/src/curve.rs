//! Wavelength-dependent quantities read from configuration.
//!
//! A quantity is either a single value used at every wavelength or a table
//! interpolated with a [`CubicSpline`]. Tables refuse to extrapolate.

use serde::{Deserialize, Serialize};

use crate::error::OpticsError;
use crate::spline::CubicSpline;

/// Configuration form of a wavelength-dependent quantity.
///
/// ```toml
/// entrance_pupil_diameter = 0.1
/// # or
/// entrance_pupil_diameter = { wavelengths_nm = [400, 700, 1000], values = [0.1, 0.1003, 0.1008] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TabulatedCurve {
    Constant(f64),
    Table { wavelengths_nm: Vec<f64>, values: Vec<f64> },
}

impl TabulatedCurve {
    pub fn table(wavelengths_nm: &[f64], values: &[f64]) -> Self {
        TabulatedCurve::Table {
            wavelengths_nm: wavelengths_nm.to_vec(),
            values: values.to_vec(),
        }
    }
}

/// An evaluable [`TabulatedCurve`].
#[derive(Debug, Clone)]
pub enum Curve {
    Constant(f64),
    Spline(CubicSpline),
}

impl Curve {
    pub fn from_tabulated(curve: &TabulatedCurve) -> Result<Self, OpticsError> {
        match curve {
            TabulatedCurve::Constant(v) if v.is_finite() => Ok(Curve::Constant(*v)),
            TabulatedCurve::Constant(v) => Err(OpticsError::InvalidTable(format!("non-finite constant {}", v))),
            TabulatedCurve::Table { wavelengths_nm, values } if wavelengths_nm.len() == 1 && values.len() == 1 => {
                Curve::from_tabulated(&TabulatedCurve::Constant(values[0]))
            }
            TabulatedCurve::Table { wavelengths_nm, values } => {
                Ok(Curve::Spline(CubicSpline::new(wavelengths_nm.clone(), values.clone())?))
            }
        }
    }

    /// Wavelength range over which the curve is defined, `None` if unbounded.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            Curve::Constant(_) => None,
            Curve::Spline(s) => Some(s.range()),
        }
    }

    pub fn evaluate(&self, wavelength_nm: f64) -> Result<f64, OpticsError> {
        match self {
            Curve::Constant(v) => Ok(*v),
            Curve::Spline(spline) => {
                let (min, max) = spline.range();
                if !(min..=max).contains(&wavelength_nm) {
                    return Err(OpticsError::OutOfRange { wavelength_nm, min, max });
                }
                Ok(spline.evaluate(wavelength_nm))
            }
        }
    }
}
