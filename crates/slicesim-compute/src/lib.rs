//! # slicesim Compute
//!
//! Compute backend abstraction for slicesim. This crate provides a
//! [`ComputeBackend`](backend::ComputeBackend) trait that isolates the optical
//! propagation code from device-specific execution details.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Status |
//! |---------|-------------|--------|
//! | CPU (rustfft + Rayon) | `cpu` (default) | Implemented |

pub mod backend;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo, FftDirection};

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;
