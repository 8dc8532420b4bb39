//! Rasterization of synthetic solids.

#![allow(clippy::cast_precision_loss)]

use mesh_types::{shapes::uv_sphere, IndexedMesh, Point3};
use mesh_volume::VolumeShape;
use mesh_voxelize::{rasterize, Placement, RasterParams, SolidQuery};

fn sphere(radius: f64) -> IndexedMesh {
    uv_sphere(Point3::origin(), radius, 32, 64)
}

/// Relative error between inside voxel count and enclosed volume.
fn volume_error(radius: f64) -> f64 {
    let n = 2 * radius.ceil() as usize + 4;
    let mesh = sphere(radius);
    let volume = rasterize(&mesh, VolumeShape::cube(n), &RasterParams::default()).unwrap();
    let exact = mesh.volume();
    (volume.inside_count() as f64 - exact).abs() / exact
}

#[test]
fn sphere_volume_error_shrinks_with_resolution() {
    let coarse = volume_error(4.0);
    let fine = volume_error(12.0);

    assert!(coarse < 0.15, "coarse error {coarse}");
    assert!(fine < 0.04, "fine error {fine}");
    assert!(fine < coarse);
}

#[test]
fn identical_for_any_worker_count() {
    let mesh = uv_sphere(Point3::new(0.3, -0.2, 0.1), 7.5, 20, 40);
    let shape = VolumeShape::new(20, 18, 17);
    let base = RasterParams::default().z_spacing(1.3);

    let single = rasterize(&mesh, shape, &base.clone().workers(1)).unwrap();
    for workers in [2, 3, 8] {
        let parallel = rasterize(&mesh, shape, &base.clone().workers(workers)).unwrap();
        assert_eq!(parallel, single, "{workers} workers differ from one");
    }
    assert!(single.inside_count() > 0);
}

#[test]
fn volume_matches_point_queries() {
    let mesh = uv_sphere(Point3::new(5.0, 5.0, 6.0), 4.2, 16, 32);
    let params = RasterParams::single_threaded()
        .placement(Placement::AsIs)
        .z_spacing(0.75);
    let shape = VolumeShape::new(11, 11, 16);
    let volume = rasterize(&mesh, shape, &params).unwrap();
    let query = SolidQuery::new(&mesh, params.tolerance);

    for k in 0..shape.nz {
        for j in 0..shape.ny {
            for i in 0..shape.nx {
                let p = Point3::new(i as f64, j as f64, k as f64 * 0.75);
                assert_eq!(
                    volume.is_inside(i, j, k),
                    query.contains(&p),
                    "voxel ({i}, {j}, {k})"
                );
            }
        }
    }
}

#[test]
fn inverted_winding_gives_same_solid() {
    let mesh = sphere(5.0);
    let mut flipped = mesh.clone();
    flipped.flip_winding();

    let shape = VolumeShape::cube(14);
    let params = RasterParams::default();
    assert_eq!(
        rasterize(&mesh, shape, &params).unwrap(),
        rasterize(&flipped, shape, &params).unwrap()
    );
}
