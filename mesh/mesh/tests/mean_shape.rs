//! End-to-end checks of the mean shape pipeline.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use approx::assert_abs_diff_eq;
use mesh::average::{MEAN_SURFACE_FILE, MEAN_VOLUME_FILE, MeshSource, PipelineError};
use mesh::io::IoResult;
use mesh::prelude::*;
use mesh::types::shapes::{axis_aligned_box, uv_sphere};
use proptest::prelude::*;

fn centered_box(hx: f64, hy: f64, hz: f64) -> IndexedMesh {
    axis_aligned_box(Point3::new(-hx, -hy, -hz), Point3::new(hx, hy, hz))
}

fn constant(mesh: IndexedMesh) -> impl Fn(&DatasetEntry) -> IoResult<IndexedMesh> {
    move |_| Ok(mesh.clone())
}

fn run<S: MeshSource>(source: S, config: PipelineConfig, ids: &[&str]) -> MeanShape {
    MeanShapePipeline::new(source, config)
        .run(&Dataset::from_ids(ids.iter().copied()))
        .unwrap()
}

fn assert_within(actual: &Aabb, expected: &Aabb, tolerance: f64) {
    for axis in 0..3 {
        assert!(
            (actual.min[axis] - expected.min[axis]).abs() <= tolerance
                && (actual.max[axis] - expected.max[axis]).abs() <= tolerance,
            "axis {axis}: {actual:?} vs {expected:?}"
        );
    }
}

// =============================================================================
// Shape recovery
// =============================================================================

#[test]
fn identical_cubes_recover_the_cube() {
    let cube = centered_box(3.3, 3.3, 3.3);
    let expected = cube.bounds();
    let config = PipelineConfig::default().with_shape(VolumeShape::cube(16));
    let mean = run(constant(cube), config, &["a", "b", "c"]);

    assert_eq!(mean.report.processed, 3);
    assert!(mean.volume.as_slice().iter().all(|&v| v == 0.0 || v == 1.0));
    let surface = mean.surface_in_source_frame();
    assert!(surface.is_watertight());
    assert_within(&surface.bounds(), &expected, 1.0);
}

#[test]
fn anisotropic_sampling_is_rescaled() {
    let sphere = uv_sphere(Point3::origin(), 6.0, 24, 48);
    let config = PipelineConfig::default()
        .with_shape(VolumeShape::new(20, 20, 10))
        .with_z_spacing(1.5);
    let mean = run(constant(sphere), config, &["a"]);

    // Within one z plane of the in-plane extent; unscaled it would be a third shorter.
    let size = mean.surface.mesh.bounds().size();
    assert_abs_diff_eq!(size.z, size.x, epsilon = 1.0);
    assert_abs_diff_eq!(size.x, size.y, epsilon = 0.5);
    assert_abs_diff_eq!(mean.surface.z_spacing, 1.5, epsilon = 1e-12);
}

#[test]
fn volume_outside_the_grid_gives_empty_surface() {
    let far = axis_aligned_box(Point3::new(50.0, 50.0, 50.0), Point3::new(60.0, 60.0, 60.0));
    let config = PipelineConfig::default().with_shape(VolumeShape::cube(8));
    let mean = run(constant(far), config, &["a", "b"]);

    assert_eq!(mean.report.processed, 2);
    assert!(mean.volume.as_slice().iter().all(|&v| v == 0.0));
    assert!(mean.surface.is_empty());
}

#[test]
fn outputs_written_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = PipelineConfig::default()
        .with_shape(VolumeShape::cube(12))
        .with_output_dir(&out);
    let mean = run(constant(centered_box(3.3, 2.6, 2.2)), config, &["a", "b", "c"]);

    let saved = MeanVolume::load_npy(out.join(MEAN_VOLUME_FILE)).unwrap();
    assert_eq!(saved.as_slice(), mean.volume.as_slice());
    let exported = load_mesh(out.join(MEAN_SURFACE_FILE)).unwrap();
    assert_eq!(exported.face_count(), mean.surface.mesh.face_count());
    assert!(exported.is_watertight());
    assert_abs_diff_eq!(exported.volume(), mean.surface.mesh.volume(), epsilon = 1e-3);
}

// =============================================================================
// Averaging
// =============================================================================

#[test]
fn half_inside_half_outside_is_one_half() {
    let source = |entry: &DatasetEntry| -> IoResult<IndexedMesh> {
        Ok(if entry.id.starts_with("in") {
            centered_box(40.0, 40.0, 40.0)
        } else {
            axis_aligned_box(Point3::new(50.0, 50.0, 50.0), Point3::new(51.0, 51.0, 51.0))
        })
    };
    let config = PipelineConfig::default().with_shape(VolumeShape::new(6, 5, 4));
    let (mean, report) = MeanShapePipeline::new(source, config)
        .mean_volume(&Dataset::from_ids(["in1", "out1", "in2", "out2"]))
        .unwrap();

    assert_eq!(report.processed, 4);
    assert!(mean.as_slice().iter().all(|&v| v == 0.5));
}

#[test]
fn worker_count_does_not_change_the_mean() {
    let source = |entry: &DatasetEntry| -> IoResult<IndexedMesh> {
        let r = 3.0 + entry.id.len() as f64 * 0.4;
        Ok(uv_sphere(Point3::new(0.2, -0.3, 0.1), r, 18, 36))
    };
    let ids = Dataset::from_ids(["a", "bb", "ccc", "dddd"]);
    let base = PipelineConfig::default()
        .with_shape(VolumeShape::new(16, 15, 14))
        .with_z_spacing(1.2);

    let (single, _) = MeanShapePipeline::new(source, base.clone().with_workers(1))
        .mean_volume(&ids)
        .unwrap();
    let (wide, _) = MeanShapePipeline::new(source, base.with_workers(4))
        .mean_volume(&ids)
        .unwrap();
    assert_eq!(single, wide);
}

#[test]
fn cancel_from_another_thread() {
    let token = CancelToken::new();
    token.cancel();
    let handle = {
        let token = token.clone();
        std::thread::spawn(move || token.is_cancelled())
    };
    assert!(handle.join().unwrap());

    let config = PipelineConfig::default().with_shape(VolumeShape::cube(8));
    let err = MeanShapePipeline::new(constant(centered_box(2.0, 2.0, 2.0)), config)
        .with_cancel_token(token)
        .run(&Dataset::from_ids(["a"]))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled { processed: 0 }));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn box_bounds_recovered_within_one_voxel(
        hx in 1.2f64..5.0,
        hy in 1.2f64..5.0,
        hz in 1.2f64..5.0,
    ) {
        let cube = centered_box(hx, hy, hz);
        let expected = cube.bounds();
        let config = PipelineConfig::default()
            .with_shape(VolumeShape::cube(14))
            .with_workers(1);
        let mean = run(constant(cube), config, &["a", "b", "c"]);

        let bounds = mean.surface_in_source_frame().bounds();
        for axis in 0..3 {
            prop_assert!((bounds.min[axis] - expected.min[axis]).abs() <= 1.0);
            prop_assert!((bounds.max[axis] - expected.max[axis]).abs() <= 1.0);
        }
    }
}
