//! TOML configuration deserialisation for wavelength sweeps.
//!
//! ```toml
//! [simulation]
//! PUPIL_WFE_MAP_SAMPLING = 64
//! SLICE_RESEL_PER_SLICE = 2.0
//! PUPIL_RESAMPLE_TO_WAVELENGTH = 650.0
//! SIM_SLITS_FILE = "slits.json"
//! SIM_SLIT_NAME = "default"
//! SIM_ADD_CAMERA_WFE = true
//!
//! [pupil]
//! diameter = 0.1
//! sampling = 512
//! gamma = 4
//!
//! [wavelengths]
//! range = [500.0, 800.0]
//! points = 4
//! ```
//!
//! `[camera]` and `[collimator]` fall back to the nominal components when
//! omitted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use slicesim_core::types::SimulationConfig;
use slicesim_optics::{CameraSpec, CollimatorSpec};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub simulation: SimulationConfig,
    pub pupil: PupilConfig,
    pub wavelengths: WavelengthSpec,
    #[serde(default = "CameraSpec::nominal")]
    pub camera: CameraSpec,
    #[serde(default = "CollimatorSpec::nominal")]
    pub collimator: CollimatorSpec,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Entrance pupil of the telescope.
#[derive(Debug, Deserialize)]
pub struct PupilConfig {
    /// Physical diameter (m).
    pub diameter: f64,
    /// Samples across the grid. Must be a power of two.
    pub sampling: f64,
    /// Pixels per resolution element.
    pub gamma: f64,
}

/// Wavelength specification: either a range or explicit list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WavelengthSpec {
    Range { range: [f64; 2], points: usize },
    List { values: Vec<f64> },
}

impl WavelengthSpec {
    /// Wavelengths (nm) in sweep order.
    pub fn values(&self) -> Vec<f64> {
        match self {
            WavelengthSpec::Range { range, points } => {
                let [start, end] = *range;
                (0..*points)
                    .map(|i| start + (end - start) * i as f64 / (*points - 1).max(1) as f64)
                    .collect()
            }
            WavelengthSpec::List { values } => values.clone(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Write one intensity CSV per wavelength (default: true).
    #[serde(default = "default_true")]
    pub save_images: bool,
    /// Write a JSON summary of the sweep (default: true).
    #[serde(default = "default_true")]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_images: true,
            save_json: true,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}

fn default_true() -> bool {
    true
}

impl JobConfig {
    /// Slit-pattern file, resolved against `base` when relative.
    pub fn slits_path(&self, base: &Path) -> PathBuf {
        let file = &self.simulation.sim_slits_file;
        if file.is_absolute() {
            file.clone()
        } else {
            base.join(file)
        }
    }
}

/// Parse a TOML job configuration.
pub fn parse_config(content: &str) -> Result<JobConfig> {
    let job: JobConfig = toml::from_str(content)?;
    if job.wavelengths.values().is_empty() {
        anyhow::bail!("No wavelengths to simulate");
    }
    Ok(job)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = r#"
[simulation]
PUPIL_WFE_MAP_SAMPLING = 32
SLICE_RESEL_PER_SLICE = 1.0
PUPIL_RESAMPLE_TO_WAVELENGTH = 650.0
SIM_SLITS_FILE = "patterns/slits.json"
SIM_SLIT_NAME = "default"
SIM_ADD_CAMERA_WFE = true

[pupil]
diameter = 0.1
sampling = 128
gamma = 4

[wavelengths]
range = [500.0, 800.0]
points = 4
"#;

    #[test]
    fn test_parse_job_with_defaults() {
        let job = parse_config(JOB).unwrap();

        assert_eq!(job.simulation.pupil_wfe_map_sampling, 32);
        assert!(job.simulation.sim_add_camera_wfe);
        assert!(!job.simulation.sim_add_collimator_wfe);
        assert_eq!(job.wavelengths.values(), vec![500.0, 600.0, 700.0, 800.0]);
        assert_eq!(job.camera, CameraSpec::nominal());
        assert!(job.output.save_images);
        assert_eq!(
            job.slits_path(Path::new("/jobs")),
            PathBuf::from("/jobs/patterns/slits.json")
        );
    }

    #[test]
    fn test_wavelength_list_and_single_point() {
        let list = WavelengthSpec::List { values: vec![700.0, 550.0] };
        assert_eq!(list.values(), vec![700.0, 550.0]);

        let single = WavelengthSpec::Range {
            range: [600.0, 900.0],
            points: 1,
        };
        assert_eq!(single.values(), vec![600.0]);
    }

    #[test]
    fn test_empty_sweep_rejected() {
        let job = JOB.replace("range = [500.0, 800.0]\npoints = 4", "values = []");
        assert!(parse_config(&job).is_err());
    }
}
