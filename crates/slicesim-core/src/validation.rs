//! Sanity checks on pupil sampling parameters.
//!
//! `sampling` must be an integer power of two and `gamma` a positive
//! integer; both are fatal. An odd `gamma` is legal but places the image
//! centre between pixels of a resolution element, so it only warns.

use log::warn;
use serde::Serialize;

use crate::simulator::SimulationError;

/// Non-fatal findings from [`validate_sampling`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplingWarning {
    OddGamma(usize),
}

/// Sampling parameters that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingParams {
    pub sampling: usize,
    pub gamma: usize,
    pub warnings: Vec<SamplingWarning>,
}

/// Validate the pupil `sampling` and `gamma`.
///
/// Each warning is logged once as it is found and also returned, so callers
/// can act on it.
pub fn validate_sampling(sampling: f64, gamma: f64) -> Result<SamplingParams, SimulationError> {
    let sampling_int = as_positive_integer(sampling).ok_or(SimulationError::NonIntegerSampling(sampling))?;
    let gamma_int = as_positive_integer(gamma).ok_or(SimulationError::InvalidGamma(gamma))?;

    let mut warnings = Vec::new();
    if gamma_int % 2 != 0 {
        warn!("Pupil gamma should be even (got {}). Could produce unexpected results.", gamma_int);
        warnings.push(SamplingWarning::OddGamma(gamma_int));
    }

    if !sampling_int.is_power_of_two() {
        return Err(SimulationError::SamplingNotPowerOfTwo(sampling_int));
    }

    Ok(SamplingParams {
        sampling: sampling_int,
        gamma: gamma_int,
        warnings,
    })
}

fn as_positive_integer(value: f64) -> Option<usize> {
    if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
        Some(value as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powers_of_two_pass() {
        for exp in 0..16 {
            let sampling = (1usize << exp) as f64;
            let params = validate_sampling(sampling, 2.0).unwrap();
            assert_eq!(params.sampling, 1 << exp);
            assert!(params.warnings.is_empty());
        }
    }

    #[test]
    fn test_non_powers_of_two_fail() {
        for sampling in [3.0, 6.0, 12.0, 100.0, 1000.0, 1023.0, 1025.0] {
            assert!(
                matches!(
                    validate_sampling(sampling, 2.0),
                    Err(SimulationError::SamplingNotPowerOfTwo(_))
                ),
                "sampling {} should fail",
                sampling
            );
        }
    }

    #[test]
    fn test_non_integer_sampling_fails() {
        for sampling in [1024.5, 0.5, -64.0, 0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                validate_sampling(sampling, 2.0),
                Err(SimulationError::NonIntegerSampling(_))
            ));
        }
    }

    #[test]
    fn test_non_integer_gamma_fails() {
        assert!(matches!(
            validate_sampling(256.0, 2.5),
            Err(SimulationError::InvalidGamma(_))
        ));
        assert!(matches!(
            validate_sampling(256.0, 0.0),
            Err(SimulationError::InvalidGamma(_))
        ));
    }

    #[test]
    fn test_even_gamma_has_no_warning() {
        for gamma in [2.0, 4.0, 8.0, 10.0] {
            assert!(validate_sampling(512.0, gamma).unwrap().warnings.is_empty());
        }
    }

    #[test]
    fn test_odd_gamma_warns_exactly_once() {
        for gamma in [1usize, 3, 5, 7] {
            let params = validate_sampling(512.0, gamma as f64).unwrap();
            assert_eq!(params.warnings, vec![SamplingWarning::OddGamma(gamma)]);
            assert_eq!(params.gamma, gamma);
        }
    }
}
