//! Errors from the component models.

use slicesim_core::wfe::WfeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpticsError {
    #[error("Wavelength {wavelength_nm} nm is outside the tabulated range [{min}, {max}] nm")]
    OutOfRange {
        wavelength_nm: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Invalid Noll index {0}; indices start at 1")]
    InvalidNoll(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("WFE map sampling must be positive, got {0}")]
    InvalidSampling(usize),
}

impl From<OpticsError> for WfeError {
    fn from(err: OpticsError) -> Self {
        match err {
            OpticsError::OutOfRange { wavelength_nm, min, max } => WfeError::OutOfRange { wavelength_nm, min, max },
            OpticsError::InvalidSampling(n) => WfeError::InvalidSampling(n),
            other => WfeError::Model(other.to_string()),
        }
    }
}
