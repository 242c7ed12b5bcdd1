//! Zernike polynomials in Noll's single-index ordering.
//!
//! Polynomials are normalised to unit RMS over the unit disc, so a
//! coefficient is the RMS wavefront error (nm) the term contributes.
//! Even Noll indices carry $\cos(m\theta)$, odd ones $\sin(m\theta)$.

use crate::error::OpticsError;

/// Noll index of the defocus term $Z_2^0$.
pub const DEFOCUS_NOLL: usize = 4;

/// Radial order `n` and signed azimuthal order `m` of Noll index `j`.
/// Negative `m` denotes a sine term.
pub fn noll_to_nm(j: usize) -> Result<(usize, i32), OpticsError> {
    if j == 0 {
        return Err(OpticsError::InvalidNoll(j));
    }
    let mut n = 0usize;
    let mut j1 = j - 1;
    while j1 > n {
        n += 1;
        j1 -= n;
    }
    let m = (n % 2 + 2 * ((j1 + (n + 1) % 2) / 2)) as i32;
    let sign = if j % 2 == 0 { 1 } else { -1 };
    Ok((n, sign * m))
}

/// Radial polynomial $R_n^{m}(\rho)$, `m = |m|`.
pub fn radial(n: usize, m: usize, rho: f64) -> f64 {
    if m > n || (n - m) % 2 != 0 {
        return 0.0;
    }
    (0..=(n - m) / 2)
        .map(|k| {
            let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
            let num = factorial(n - k);
            let den = factorial(k) * factorial((n + m) / 2 - k) * factorial((n - m) / 2 - k);
            sign * num / den * rho.powi((n - 2 * k) as i32)
        })
        .sum()
}

/// Unit-RMS Zernike polynomial at polar coordinates on the unit disc.
pub fn zernike(n: usize, m: i32, rho: f64, theta: f64) -> f64 {
    let am = m.unsigned_abs() as usize;
    let r = radial(n, am, rho);
    if m == 0 {
        ((n + 1) as f64).sqrt() * r
    } else {
        let norm = (2.0 * (n + 1) as f64).sqrt();
        let angular = if m > 0 {
            (am as f64 * theta).cos()
        } else {
            (am as f64 * theta).sin()
        };
        norm * r * angular
    }
}

fn factorial(k: usize) -> f64 {
    (1..=k).fold(1.0, |acc, i| acc * i as f64)
}
