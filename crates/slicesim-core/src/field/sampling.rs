//! Bilinear sampling of gridded data at fractional coordinates.

use std::ops::{Add, Mul};

use ndarray::Array2;

/// Sample `data` at fractional `(row, col)` by bilinear interpolation.
///
/// Neighbours outside the grid contribute zero, so the result falls off
/// smoothly over the last sample and is exactly zero beyond it. At integer
/// coordinates the stored value is returned unchanged.
pub fn sample_bilinear<T>(data: &Array2<T>, row: f64, col: f64) -> T
where
    T: Copy + Default + Add<Output = T> + Mul<f64, Output = T>,
{
    let (rows, cols) = data.dim();
    if !row.is_finite() || !col.is_finite() {
        return T::default();
    }

    let r0 = row.floor();
    let c0 = col.floor();
    let fr = row - r0;
    let fc = col - c0;

    let fetch = |r: f64, c: f64| -> T {
        if r < 0.0 || c < 0.0 || r >= rows as f64 || c >= cols as f64 {
            T::default()
        } else {
            data[[r as usize, c as usize]]
        }
    };

    let mut value = fetch(r0, c0) * ((1.0 - fr) * (1.0 - fc));
    if fc > 0.0 {
        value = value + fetch(r0, c0 + 1.0) * ((1.0 - fr) * fc);
    }
    if fr > 0.0 {
        value = value + fetch(r0 + 1.0, c0) * (fr * (1.0 - fc));
        if fc > 0.0 {
            value = value + fetch(r0 + 1.0, c0 + 1.0) * (fr * fc);
        }
    }
    value
}
