//! Sweep runner: builds the components and runs the simulator once per
//! wavelength.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use slicesim_compute::{ComputeBackend, CpuBackend};
use slicesim_core::simulator::{ReferenceGrid, SliceReport};
use slicesim_core::slit::SlitPattern;
use slicesim_core::{CompositeImage, PupilPlane, SingleWavelengthSimulator, SliceLayout};
use slicesim_optics::{Camera, Collimator};
use slicesim_slits::load_pattern;

use crate::config::JobConfig;

/// Per-wavelength results kept after the composite itself is written out.
#[derive(Debug, Clone, Serialize)]
pub struct WavelengthSummary {
    pub wavelength_nm: f64,
    pub pixel_scale_arcsec: f64,
    pub field_of_view_arcsec: f64,
    pub linear_pixel_scale_m: f64,
    pub slices_processed: usize,
    pub total_power: f64,
    pub peak_intensity: f64,
    pub slices: Vec<SliceReport>,
}

impl WavelengthSummary {
    fn from_composite(composite: &CompositeImage) -> Self {
        let peak_intensity = composite
            .intensity()
            .iter()
            .fold(0.0_f64, |acc, &v| acc.max(v));
        Self {
            wavelength_nm: composite.wavelength_nm(),
            pixel_scale_arcsec: composite.image.pixel_scale,
            field_of_view_arcsec: composite.image.detector_field_of_view,
            linear_pixel_scale_m: composite.image.linear_pixel_scale,
            slices_processed: composite.processed_slices(),
            total_power: composite.total_power(),
            peak_intensity,
            slices: composite.slices.clone(),
        }
    }
}

/// Results from a sweep.
#[derive(Debug, Serialize)]
pub struct SweepOutput {
    pub slit_pattern: String,
    pub reference: ReferenceGrid,
    pub layout: Option<SliceLayout>,
    pub wavelengths: Vec<WavelengthSummary>,
}

/// Build the simulator described by `job`. Relative paths are resolved
/// against `base`.
pub fn build_simulator(job: &JobConfig, base: &Path) -> Result<SingleWavelengthSimulator> {
    let camera = Camera::from_spec(&job.camera).context("Building camera")?;
    let collimator = Collimator::from_spec(&job.collimator).context("Building collimator")?;

    let slits_path = job.slits_path(base);
    let pattern = load_pattern(&slits_path, &job.simulation.sim_slit_name)
        .with_context(|| format!("Loading slit pattern from {}", slits_path.display()))?;
    println!(
        "  Slit pattern '{}': {} slitlets",
        pattern.name(),
        pattern.geometry().n_slitlets
    );

    let pupil = build_pupil(job)?;
    let backend: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
    println!("Backend: {}", backend.device_info().name);

    let simulator = SingleWavelengthSimulator::new(
        pupil,
        Arc::new(camera),
        Arc::new(collimator),
        Arc::new(pattern),
        job.simulation.clone(),
    )?
    .with_backend(backend);
    Ok(simulator)
}

/// A top-hat pupil from the `[pupil]` table. Power-of-two and odd-gamma
/// checks are left to the simulator.
fn build_pupil(job: &JobConfig) -> Result<PupilPlane> {
    let p = &job.pupil;
    if !(p.diameter.is_finite() && p.diameter > 0.0) {
        anyhow::bail!("Pupil diameter must be positive, got {} m", p.diameter);
    }
    let as_count = |name: &str, v: f64| -> Result<usize> {
        if v.is_finite() && v >= 1.0 && v.fract() == 0.0 {
            Ok(v as usize)
        } else {
            anyhow::bail!("Pupil {} must be a positive integer, got {}", name, v)
        }
    };
    let sampling = as_count("sampling", p.sampling)?;
    let gamma = as_count("gamma", p.gamma)?;
    debug!("Pupil: D={} m, {} samples, gamma {}", p.diameter, sampling, gamma);
    Ok(PupilPlane::circular(p.diameter, sampling, gamma))
}

/// Run every wavelength of `job`, writing composites to `out_dir` as they
/// complete.
pub fn run_sweep(job: &JobConfig, base: &Path, out_dir: &Path) -> Result<SweepOutput> {
    let simulator = build_simulator(job, base)?;
    let wavelengths = job.wavelengths.values();
    debug!("Sweeping {} wavelengths: {:?}", wavelengths.len(), wavelengths);
    let reference = *simulator.reference();
    println!(
        "Reference grid: λ={:.1} nm, {:.4e} arcsec/px, FoV {:.3} arcsec",
        reference.wavelength_nm, reference.pixel_scale, reference.field_of_view
    );

    let mut output = SweepOutput {
        slit_pattern: job.simulation.sim_slit_name.clone(),
        reference,
        layout: None,
        wavelengths: Vec::with_capacity(wavelengths.len()),
    };

    for (wi, &wl) in wavelengths.iter().enumerate() {
        let composite = simulator
            .run(wl)
            .with_context(|| format!("Simulation failed at λ={:.1} nm", wl))?;

        let summary = WavelengthSummary::from_composite(&composite);
        println!(
            "  [{}/{}] λ={:.1} nm: {} slices, power={:.4e}, peak={:.4e}",
            wi + 1,
            wavelengths.len(),
            wl,
            summary.slices_processed,
            summary.total_power,
            summary.peak_intensity
        );

        if job.output.save_images {
            write_intensity_csv(&composite, &composite_path(out_dir, wl), job)?;
        }
        if output.layout.is_none() {
            output.layout = Some(composite.layout.clone());
        }
        output.wavelengths.push(summary);
    }

    if job.output.save_json {
        write_summary_json(&output, &out_dir.join("summary.json"))?;
    }
    Ok(output)
}

/// File name of the composite written for `wavelength_nm`.
pub fn composite_path(out_dir: &Path, wavelength_nm: f64) -> PathBuf {
    out_dir.join(format!("composite_{:.2}nm.csv", wavelength_nm))
}

/// Write a composite's intensity to a CSV file with a metadata header.
pub fn write_intensity_csv(composite: &CompositeImage, path: &Path, job: &JobConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    let image = &composite.image;
    writeln!(file, "# slicesim composite intensity")?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# wavelength_nm: {}", image.wavelength_nm)?;
    writeln!(file, "# pixel_scale_arcsec: {:.6e}", image.pixel_scale)?;
    writeln!(file, "# field_of_view_arcsec: {:.6e}", image.detector_field_of_view)?;
    writeln!(file, "# linear_pixel_scale_m: {:.6e}", image.linear_pixel_scale)?;
    writeln!(
        file,
        "# slit_pattern: {} ({} slices processed)",
        job.simulation.sim_slit_name,
        composite.processed_slices()
    )?;
    writeln!(
        file,
        "# camera_wfe: {}, collimator_wfe: {}",
        job.simulation.sim_add_camera_wfe, job.simulation.sim_add_collimator_wfe
    )?;
    writeln!(file, "#")?;

    for row in composite.intensity().rows() {
        let line = row
            .iter()
            .map(|v| format!("{:.6e}", v))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(file, "{}", line)?;
    }
    file.flush()?;

    println!("Composite written to: {}", path.display());
    Ok(())
}

/// Write the sweep summary to a JSON file.
pub fn write_summary_json(output: &SweepOutput, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json =
        serde_json::to_string_pretty(output).map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Summary (JSON) written to: {}", path.display());
    Ok(())
}
