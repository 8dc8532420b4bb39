//! Parallel plane-by-plane rasterization.

// Grid indices are converted to coordinates; extents are far below 2^52.
#![allow(clippy::cast_precision_loss)]

use mesh_types::IndexedMesh;
use mesh_volume::{INSIDE, OccupancyVolume, VolumeShape};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::error::{VoxelizeError, VoxelizeResult};
use crate::params::RasterParams;
use crate::solid::{RowHits, SolidQuery};
use crate::validate::validate_surface;

/// Rasterize a closed surface into an occupancy volume.
///
/// Grid point `(i, j, k)` samples the model point
/// `(i, j, k * z_spacing) - offset`, where the offset comes from
/// [`Placement::offset`](crate::Placement::offset). Points inside the
/// solid are written as [`INSIDE`], all others as outside.
///
/// # Errors
///
/// - [`VoxelizeError::InvalidParams`] for unusable parameters
/// - [`VoxelizeError::Volume`] for a shape with a zero axis
/// - [`VoxelizeError::DegenerateSurface`] for an empty or open surface
///
/// # Example
///
/// ```
/// use mesh_types::{shapes::axis_aligned_box, Point3};
/// use mesh_volume::VolumeShape;
/// use mesh_voxelize::{rasterize, Placement, RasterParams};
///
/// let cube = axis_aligned_box(Point3::new(1.5, 1.5, 1.5), Point3::new(5.5, 5.5, 5.5));
/// let params = RasterParams::default().placement(Placement::AsIs);
///
/// let volume = rasterize(&cube, VolumeShape::cube(8), &params).unwrap();
/// assert_eq!(volume.inside_count(), 4 * 4 * 4);
/// ```
pub fn rasterize(
    mesh: &IndexedMesh,
    shape: VolumeShape,
    params: &RasterParams,
) -> VoxelizeResult<OccupancyVolume> {
    rasterize_with_cancel(mesh, shape, params, &CancelToken::new())
}

/// [`rasterize`] with cooperative cancellation.
///
/// Planes are checked against `cancel` before they start. A cancelled run
/// never returns a partially filled volume.
///
/// # Errors
///
/// As [`rasterize`], plus [`VoxelizeError::Cancelled`] once `cancel` is
/// triggered.
pub fn rasterize_with_cancel(
    mesh: &IndexedMesh,
    shape: VolumeShape,
    params: &RasterParams,
    cancel: &CancelToken,
) -> VoxelizeResult<OccupancyVolume> {
    params.validate()?;
    let mut volume = OccupancyVolume::new(shape)?;
    validate_surface(mesh, params.require_closed)?;

    let query = SolidQuery::new(mesh, params.tolerance);
    let offset = params.placement.offset(shape, params.z_spacing);
    debug!(
        shape = %shape,
        faces = query.triangle_count(),
        workers = params.workers,
        z_spacing = params.z_spacing,
        "rasterizing surface"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.workers)
        .thread_name(|i| format!("rasterize-{i}"))
        .build()?;

    let nx = shape.nx;
    pool.install(|| {
        volume
            .as_mut_slice()
            .par_chunks_exact_mut(shape.plane_len())
            .enumerate()
            .try_for_each_init(
                || (Vec::new(), RowHits::default()),
                |(candidates, hits), (k, plane)| {
                    if cancel.is_cancelled() {
                        return Err(VoxelizeError::Cancelled);
                    }
                    let z = k as f64 * params.z_spacing - offset.z;
                    query.plane_candidates(z, candidates);
                    if candidates.is_empty() {
                        return Ok(());
                    }
                    for (j, row) in plane.chunks_exact_mut(nx).enumerate() {
                        let y = j as f64 - offset.y;
                        query.row_hits(y, z, candidates, hits);
                        if hits.is_empty() {
                            continue;
                        }
                        for (i, voxel) in row.iter_mut().enumerate() {
                            if query.classify(hits, i as f64 - offset.x) {
                                *voxel = INSIDE;
                            }
                        }
                    }
                    Ok(())
                },
            )
    })?;

    if cancel.is_cancelled() {
        return Err(VoxelizeError::Cancelled);
    }

    info!(
        shape = %shape,
        inside = volume.inside_count(),
        "rasterized surface"
    );
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Placement;
    use mesh_types::{Point3, shapes::axis_aligned_box};

    fn as_is() -> RasterParams {
        RasterParams::default().placement(Placement::AsIs)
    }

    #[test]
    fn box_on_lattice_excludes_boundary() {
        let cube = axis_aligned_box(Point3::new(2.0, 2.0, 2.0), Point3::new(6.0, 6.0, 6.0));
        let volume = rasterize(&cube, VolumeShape::cube(9), &as_is()).unwrap();

        assert_eq!(volume.inside_count(), 27);
        assert!(volume.is_inside(3, 3, 3));
        assert!(!volume.is_inside(2, 4, 4));
        assert!(!volume.is_inside(6, 4, 4));
    }

    #[test]
    fn centered_placement() {
        let cube = axis_aligned_box(Point3::new(-2.5, -2.5, -2.5), Point3::new(2.5, 2.5, 2.5));
        let volume = rasterize(&cube, VolumeShape::cube(10), &RasterParams::default()).unwrap();

        assert_eq!(volume.inside_count(), 125);
        assert!(volume.is_inside(3, 3, 3));
        assert!(volume.is_inside(7, 7, 7));
        assert!(!volume.is_inside(8, 5, 5));
    }

    #[test]
    fn z_spacing_samples_fewer_planes() {
        let cube = axis_aligned_box(Point3::new(1.5, 1.5, 1.0), Point3::new(3.5, 3.5, 9.0));
        let params = as_is().z_spacing(2.0);
        let volume = rasterize(&cube, VolumeShape::new(5, 5, 6), &params).unwrap();

        // z = 2, 4, 6, 8 are inside (1, 9); x, y = 2, 3.
        assert_eq!(volume.inside_count(), 4 * 4);
        assert!(volume.is_inside(2, 2, 1));
        assert!(!volume.is_inside(2, 2, 0));
        assert!(!volume.is_inside(2, 2, 5));
    }

    #[test]
    fn open_surface_rejected() {
        let mut cube = axis_aligned_box(Point3::origin(), Point3::new(3.0, 3.0, 3.0));
        cube.faces.truncate(10);
        let err = rasterize(&cube, VolumeShape::cube(4), &as_is()).unwrap_err();
        assert!(matches!(err, VoxelizeError::DegenerateSurface { .. }));
    }

    #[test]
    fn zero_axis_rejected() {
        let cube = axis_aligned_box(Point3::origin(), Point3::new(3.0, 3.0, 3.0));
        let err = rasterize(&cube, VolumeShape::new(4, 0, 4), &as_is()).unwrap_err();
        assert!(matches!(err, VoxelizeError::Volume(_)));
    }

    #[test]
    fn pre_cancelled_run_returns_no_volume() {
        let cube = axis_aligned_box(Point3::origin(), Point3::new(3.0, 3.0, 3.0));
        let token = CancelToken::new();
        token.cancel();

        let result = rasterize_with_cancel(&cube, VolumeShape::cube(4), &as_is(), &token);
        assert!(matches!(result, Err(VoxelizeError::Cancelled)));
    }

    #[test]
    fn mesh_outside_volume_is_empty() {
        let cube = axis_aligned_box(Point3::new(20.0, 20.0, 20.0), Point3::new(25.0, 25.0, 25.0));
        let volume = rasterize(&cube, VolumeShape::cube(8), &as_is()).unwrap();
        assert_eq!(volume.inside_count(), 0);
    }
}
