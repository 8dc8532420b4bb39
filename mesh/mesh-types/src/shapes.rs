//! Closed test solids.
//!
//! Synthetic nuclei for tests and benchmarks. Both builders produce
//! watertight meshes with outward-facing winding.

use std::f64::consts::{PI, TAU};

use nalgebra::Point3;

use crate::IndexedMesh;

/// Closed box spanning `min`..`max`, 8 vertices and 12 triangles.
///
/// # Example
///
/// ```
/// use mesh_types::{shapes::axis_aligned_box, Point3};
///
/// let cube = axis_aligned_box(Point3::origin(), Point3::new(2.0, 2.0, 2.0));
/// assert!(cube.is_watertight());
/// assert!((cube.volume() - 8.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn axis_aligned_box(min: Point3<f64>, max: Point3<f64>) -> IndexedMesh {
    let (a, b) = (min, max);
    let vertices = vec![
        Point3::new(a.x, a.y, a.z),
        Point3::new(b.x, a.y, a.z),
        Point3::new(b.x, b.y, a.z),
        Point3::new(a.x, b.y, a.z),
        Point3::new(a.x, a.y, b.z),
        Point3::new(b.x, a.y, b.z),
        Point3::new(b.x, b.y, b.z),
        Point3::new(a.x, b.y, b.z),
    ];
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    IndexedMesh::from_parts(vertices, faces)
}

/// Latitude/longitude sphere with single-vertex poles.
///
/// `stacks` is clamped to at least 2 and `slices` to at least 3.
///
/// # Example
///
/// ```
/// use mesh_types::{shapes::uv_sphere, Point3};
///
/// let sphere = uv_sphere(Point3::origin(), 1.0, 16, 32);
/// assert!(sphere.is_watertight());
/// assert!(sphere.signed_volume() > 0.0);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
// Truncation: vertex counts of test spheres stay far below u32::MAX
pub fn uv_sphere(center: Point3<f64>, radius: f64, stacks: usize, slices: usize) -> IndexedMesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let ring_count = stacks - 1;

    let mut mesh = IndexedMesh::with_capacity(ring_count * slices + 2, 2 * slices * ring_count);

    mesh.vertices.push(center + nalgebra::Vector3::z() * radius);
    for i in 1..stacks {
        let theta = PI * i as f64 / stacks as f64;
        let (sin_t, cos_t) = theta.sin_cos();
        for j in 0..slices {
            let phi = TAU * j as f64 / slices as f64;
            let (sin_p, cos_p) = phi.sin_cos();
            mesh.vertices.push(Point3::new(
                radius.mul_add(sin_t * cos_p, center.x),
                radius.mul_add(sin_t * sin_p, center.y),
                radius.mul_add(cos_t, center.z),
            ));
        }
    }
    mesh.vertices.push(center - nalgebra::Vector3::z() * radius);

    let north = 0u32;
    let south = (mesh.vertices.len() - 1) as u32;
    let ring = |i: usize, j: usize| (1 + i * slices + j % slices) as u32;

    for j in 0..slices {
        mesh.faces.push([north, ring(0, j), ring(0, j + 1)]);
    }
    for i in 0..ring_count - 1 {
        for j in 0..slices {
            let (a, b) = (ring(i, j), ring(i, j + 1));
            let (c, d) = (ring(i + 1, j), ring(i + 1, j + 1));
            mesh.faces.push([a, c, d]);
            mesh.faces.push([a, d, b]);
        }
    }
    for j in 0..slices {
        mesh.faces
            .push([ring(ring_count - 1, j), south, ring(ring_count - 1, j + 1)]);
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_bounds_match_corners() {
        let mesh = axis_aligned_box(Point3::new(-1.0, 2.0, 0.5), Point3::new(3.0, 4.0, 1.5));
        let bounds = mesh.bounds();

        assert_eq!(bounds.min, Point3::new(-1.0, 2.0, 0.5));
        assert_eq!(bounds.max, Point3::new(3.0, 4.0, 1.5));
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn sphere_volume_converges() {
        let exact = 4.0 / 3.0 * PI * 8.0;
        let coarse = uv_sphere(Point3::new(1.0, 1.0, 1.0), 2.0, 8, 16).signed_volume();
        let fine = uv_sphere(Point3::new(1.0, 1.0, 1.0), 2.0, 48, 96).signed_volume();

        assert!(coarse > 0.0);
        assert!((fine - exact).abs() < (coarse - exact).abs());
        assert_relative_eq!(fine, exact, max_relative = 0.01);
    }

    #[test]
    fn degenerate_counts_are_clamped() {
        let mesh = uv_sphere(Point3::origin(), 1.0, 0, 0);
        assert!(mesh.is_watertight());
        assert_eq!(mesh.vertex_count(), 2 + 3);
    }
}
