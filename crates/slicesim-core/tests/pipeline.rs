//! End-to-end runs of the single-wavelength slicer pipeline.
//!
//! Grids are 64 samples with gamma 4, so the three slitlets of the test
//! pattern occupy a 16 x 12 window around the grid centre.

mod common;

use std::sync::Arc;

use approx::assert_relative_eq;
use ndarray::{Array2, Zip};
use num_complex::Complex64;
use slicesim_compute::CpuBackend;
use slicesim_core::slit::SlitPattern;
use slicesim_core::validation::SamplingWarning;
use slicesim_core::wfe::{CollimatorModel, WfeProvider};
use slicesim_core::{FieldPlane, PupilPlane, SimulationError};

use common::*;

// ─── Helpers ───

fn max_abs_diff(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
    Zip::from(a)
        .and(b)
        .fold(0.0_f64, |acc, x, y| acc.max((x - y).norm()))
}

// ─── Validation ───

#[test]
fn test_non_power_of_two_sampling_aborts() {
    let pupil = PupilPlane::new(Array2::zeros((4, 4)), PUPIL_DIAMETER, 1023.0, 4.0);
    let sim = simulator_with(pupil, config(true, true), collimator());

    match sim.run(600.0) {
        Err(SimulationError::SamplingNotPowerOfTwo(n)) => assert_eq!(n, 1023),
        other => panic!("expected SamplingNotPowerOfTwo, got {:?}", other.map(|c| c.processed_slices())),
    }
}

#[test]
fn test_non_integer_sampling_aborts() {
    let pupil = PupilPlane::new(Array2::zeros((4, 4)), PUPIL_DIAMETER, 63.5, 4.0);
    let sim = simulator_with(pupil, config(false, false), collimator());
    assert!(matches!(sim.run(600.0), Err(SimulationError::NonIntegerSampling(_))));
}

#[test]
fn test_odd_gamma_runs_with_warning() {
    let pupil = PupilPlane::circular(PUPIL_DIAMETER, 64, 3);
    let sim = simulator_with(pupil, config(true, false), collimator());

    let baseline = sim.baseline(600.0).unwrap();
    assert_eq!(baseline.sampling.warnings, vec![SamplingWarning::OddGamma(3)]);

    let composite = sim.run(600.0).unwrap();
    assert_eq!(composite.processed_slices(), 3);
    assert_eq!(composite.layout.slice_pixel_height, 3);
}

#[test]
fn test_invalid_wavelength_rejected() {
    let sim = simulator(config(false, false));
    assert!(matches!(sim.run(0.0), Err(SimulationError::InvalidWavelength(_))));
    assert!(matches!(sim.run(f64::NAN), Err(SimulationError::InvalidWavelength(_))));
}

// ─── Baseline ───

#[test]
fn test_baseline_on_reference_grid() {
    let sim = simulator(config(false, false));
    let reference = *sim.reference();

    for wavelength in [500.0, 650.0, 800.0] {
        let baseline = sim.baseline(wavelength).unwrap();
        assert_eq!(baseline.image.data.dim(), (64, 64));
        assert_relative_eq!(baseline.image.pixel_scale, reference.pixel_scale, max_relative = 1e-12);
        assert_relative_eq!(baseline.image.detector_field_of_view, reference.field_of_view, max_relative = 1e-12);
    }
}

#[test]
fn test_baseline_at_reference_wavelength_is_unresampled() {
    let sim = simulator(config(false, false));
    let backend = CpuBackend::new();
    let camera = camera();

    let direct = sim
        .pupil()
        .to_conjugate_image(REFERENCE_WAVELENGTH, camera.as_ref(), &backend)
        .unwrap();
    let baseline = sim.baseline(REFERENCE_WAVELENGTH).unwrap();

    assert!(max_abs_diff(&direct.data, &baseline.image.data) < 1e-12);
}

#[test]
fn test_baseline_conserves_power() {
    let sim = simulator(config(false, false));
    let input = sim.pupil().total_power();

    let at_reference = sim.baseline(REFERENCE_WAVELENGTH).unwrap();
    assert_relative_eq!(at_reference.image.total_power(), input, max_relative = 1e-10);

    // Bilinear interpolation smooths the field, so some power is lost.
    let resampled = sim.baseline(700.0).unwrap().image.total_power();
    assert!(resampled < input * 1.01);
    assert!(resampled > input * 0.7, "resampled power {} vs input {}", resampled, input);
}

// ─── Composite ───

#[test]
fn test_disabled_wfe_returns_baseline() {
    let sim = simulator(config(false, false));
    let baseline = sim.baseline(600.0).unwrap();
    let composite = sim.run(600.0).unwrap();

    assert_eq!(composite.processed_slices(), 0);
    assert_eq!(composite.layout.len(), 3);
    assert_eq!(composite.image.data, baseline.image.data);
    assert_eq!(composite.wavelength_nm(), 600.0);
}

#[test]
fn test_composite_changes_only_inside_slices() {
    let sim = simulator(config(true, true));
    let baseline = sim.baseline(600.0).unwrap();
    let composite = sim.run(600.0).unwrap();

    assert_eq!(composite.processed_slices(), 3);
    let crop = composite.layout.crop;
    assert_eq!((crop.x_start, crop.x_end, crop.y_start, crop.y_end), (24, 40, 26, 38));

    let mut inside_diff = 0.0_f64;
    for ((row, col), value) in composite.image.data.indexed_iter() {
        let base = baseline.image.data[[row, col]];
        if composite.layout.regions.iter().any(|r| r.contains(row, col)) {
            inside_diff = inside_diff.max((value - base).norm());
        } else {
            assert_eq!(*value, base, "pixel ({}, {}) outside the slices changed", row, col);
        }
    }
    assert!(inside_diff > 1e-6, "slices unchanged by WFE");
}

#[test]
fn test_slice_matches_manual_propagation() {
    let wavelength = 600.0;
    let cfg = config(true, true);
    let sim = simulator(cfg.clone());
    let composite = sim.run(wavelength).unwrap();

    let backend = CpuBackend::new();
    let camera = camera();
    let collimator = collimator();
    let pattern = TestPattern::new(3);

    let baseline = sim.baseline(wavelength).unwrap();
    let slicer = baseline
        .pupil
        .to_conjugate_image(wavelength, camera.as_ref(), &backend)
        .unwrap();

    let fields = pattern.field_points(3).unwrap();
    let axis = collimator.optical_axis(&fields, wavelength).unwrap();
    let collimator_wfe = collimator.wfe(&fields, wavelength, cfg.pupil_wfe_map_sampling).unwrap();
    let camera_wfe = camera.wfe(&axis, wavelength, cfg.pupil_wfe_map_sampling).unwrap();

    for (index, region) in composite.layout.regions.iter().enumerate() {
        let mut pupil = slicer.to_region(region).unwrap().to_conjugate_pupil(&backend).unwrap();
        let c = &collimator_wfe[index];
        pupil
            .add_wfe(
                collimator.entrance_pupil_diameter(wavelength).unwrap(),
                &c.defocus,
                &c.higher_order,
                &backend,
            )
            .unwrap();
        let k = &camera_wfe[index];
        pupil
            .add_wfe(camera.entrance_pupil_diameter(wavelength).unwrap(), &k.defocus, &k.higher_order, &backend)
            .unwrap();
        let expected = pupil.to_conjugate_image(wavelength, camera.as_ref(), &backend).unwrap();

        for row in region.rows() {
            for col in region.cols() {
                let got = composite.image.data[[row, col]];
                let want = expected.data[[row, col]];
                assert!((got - want).norm() < 1e-12, "slice {} differs at ({}, {})", index, row, col);
            }
        }
    }
}

#[test]
fn test_slices_report_their_wfe() {
    let sim = simulator(config(true, false));
    let composite = sim.run(700.0).unwrap();

    for (index, report) in composite.slices.iter().enumerate() {
        assert_eq!(report.index, index);
        assert_eq!(report.region, composite.layout.regions[index]);
        assert!(report.collimator_wfe.is_none());
        let camera_wfe = report.camera_wfe.as_ref().unwrap();
        assert!(camera_wfe.rms_nm > 0.0);
        assert!(camera_wfe.peak_to_valley_nm >= camera_wfe.rms_nm);
    }
    // The middle slitlet sits on axis, the outer two are displaced.
    assert_relative_eq!(composite.slices[1].field.y, 0.0);
    assert!(composite.slices[0].field.y < 0.0);
    assert!(composite.slices[2].field.y > 0.0);
}

#[test]
fn test_missing_descriptor_aborts() {
    let short = Arc::new(TestCollimator {
        defocus_nm: 60.0,
        descriptor_count: Some(2),
    });
    let sim = simulator_with(PupilPlane::circular(PUPIL_DIAMETER, 64, 4), config(false, true), short);

    match sim.run(600.0) {
        Err(SimulationError::MissingWfe { component, field_index }) => {
            assert_eq!(component, "test collimator");
            assert_eq!(field_index, 2);
        }
        other => panic!("expected MissingWfe, got {:?}", other.map(|c| c.processed_slices())),
    }
}

#[test]
fn test_extra_descriptors_abort() {
    let long = Arc::new(TestCollimator {
        defocus_nm: 60.0,
        descriptor_count: Some(5),
    });
    let sim = simulator_with(PupilPlane::circular(PUPIL_DIAMETER, 64, 4), config(false, true), long);

    match sim.run(600.0) {
        Err(SimulationError::WfeCountMismatch { component, expected, got }) => {
            assert_eq!(component, "test collimator");
            assert_eq!(expected, 3);
            assert_eq!(got, 5);
        }
        other => panic!("expected WfeCountMismatch, got {:?}", other.map(|c| c.processed_slices())),
    }
}

#[test]
fn test_parallel_slices_match_sequential() {
    let sequential = simulator(config(true, true)).run(750.0).unwrap();

    let mut cfg = config(true, true);
    cfg.parallel_slices = true;
    let parallel = simulator(cfg).run(750.0).unwrap();

    assert_eq!(parallel.processed_slices(), sequential.processed_slices());
    assert!(max_abs_diff(&parallel.image.data, &sequential.image.data) < 1e-14);
}

#[test]
fn test_runs_leave_template_untouched() {
    let sim = simulator(config(true, true));
    assert_eq!(sim.config(), &config(true, true));
    let template = sim.pupil().data.clone();

    let first = sim.run(550.0).unwrap();
    let _ = sim.run(800.0).unwrap();
    let again = sim.run(550.0).unwrap();

    assert_eq!(sim.pupil().data, template);
    assert!(sim.pupil().wavelength_nm.is_none());
    assert!(max_abs_diff(&first.image.data, &again.image.data) < 1e-14);
}
