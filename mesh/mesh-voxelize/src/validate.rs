//! Surface checks run before rasterization.

use mesh_types::IndexedMesh;
use tracing::debug;

use crate::error::{VoxelizeError, VoxelizeResult};

/// Enclosed volume below which a closed surface counts as flat.
const MIN_VOLUME: f64 = 1e-12;

/// Check that `mesh` can be rasterized as a solid.
///
/// Always rejects surfaces without faces, with out-of-range indices, or
/// with non-finite coordinates. With `require_closed`, also rejects
/// surfaces with boundary or non-manifold edges and closed surfaces that
/// enclose no volume.
///
/// # Errors
///
/// Returns [`VoxelizeError::DegenerateSurface`] describing the first
/// problem found.
///
/// # Example
///
/// ```
/// use mesh_types::{shapes::axis_aligned_box, Point3};
/// use mesh_voxelize::validate_surface;
///
/// let mut mesh = axis_aligned_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// assert!(validate_surface(&mesh, true).is_ok());
///
/// mesh.faces.pop();
/// assert!(validate_surface(&mesh, true).is_err());
/// assert!(validate_surface(&mesh, false).is_ok());
/// ```
pub fn validate_surface(mesh: &IndexedMesh, require_closed: bool) -> VoxelizeResult<()> {
    if mesh.faces.is_empty() {
        return Err(VoxelizeError::degenerate("surface has no faces"));
    }
    if let Some(face) = mesh.first_invalid_face() {
        return Err(VoxelizeError::degenerate(format!(
            "face {face} references a missing vertex"
        )));
    }
    if mesh
        .vertices
        .iter()
        .any(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()))
    {
        return Err(VoxelizeError::degenerate("surface has non-finite coordinates"));
    }

    if require_closed {
        let open_edges = mesh.boundary_edge_count();
        if open_edges > 0 {
            debug!(open_edges, "surface is not closed");
            return Err(VoxelizeError::degenerate(format!(
                "surface is not closed ({open_edges} boundary or non-manifold edges)"
            )));
        }
        if mesh.volume() <= MIN_VOLUME {
            return Err(VoxelizeError::degenerate("surface encloses no volume"));
        }
    }
    Ok(())
}
