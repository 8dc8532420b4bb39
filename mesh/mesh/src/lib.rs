//! Mean shape of a population of closed surface meshes.
//!
//! This umbrella crate re-exports the mesh-* crates that make up the mean
//! shape pipeline: every input mesh is rasterized into an occupancy volume,
//! the volumes are averaged, and the mean surface is reconstructed from the
//! average with an isosurface.
//!
//! # Quick Start
//!
//! ```no_run
//! use mesh::prelude::*;
//!
//! let dataset = Dataset::from_csv("nucleus_timelapse.csv", DEFAULT_ID_COLUMN).unwrap();
//! let config = PipelineConfig::default()
//!     .with_shape(VolumeShape::cube(128))
//!     .with_output_dir("out");
//!
//! let mean = MeanShapePipeline::new(DirectoryMeshSource::new("mesh_vtk_files"), config)
//!     .run(&dataset)
//!     .unwrap();
//!
//! // The surface also went to out/mean_nuc_mesh.stl
//! mesh::io::save_mesh(&mean.surface_in_source_frame(), "mean_centered.vtk").unwrap();
//! ```
//!
//! # Module Organization
//!
//! ## Foundation
//! - [`types`] - Core data structures: `IndexedMesh`, `Triangle`, `Aabb`, test solids
//! - [`io`] - Legacy VTK and STL reading and writing
//!
//! ## Volumes
//! - [`volume`] - Occupancy and mean volumes, aggregation, `.npy` and PGM output
//! - [`voxelize`] - Parallel point-in-solid rasterization
//!
//! ## Surfaces
//! - [`isosurface`] - Marching tetrahedra and z rescaling
//!
//! ## Pipeline
//! - [`average`] - Datasets, mesh sources, retries, caching and run reports
//!
//! # Feature Flags
//!
//! - `serde` - `Serialize`/`Deserialize` for configs, reports and data types

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Core data structures: `IndexedMesh`, `Triangle`, `Aabb`.
pub use mesh_types as types;

/// Legacy VTK and STL file I/O.
pub use mesh_io as io;

/// Occupancy volumes, mean volumes and their persistence.
pub use mesh_volume as volume;

/// Solid rasterization of closed meshes.
pub use mesh_voxelize as voxelize;

/// Isosurface reconstruction with z rescaling.
pub use mesh_isosurface as isosurface;

/// Mean shape pipeline.
pub use mesh_average as average;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for mean shape computations.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
///
/// let config = PipelineConfig::preview();
/// assert_eq!(config.iso.step_size, 2);
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{Aabb, IndexedMesh, Point3, Triangle, Vector3};

    // I/O
    pub use mesh_io::{MeshFormat, load_mesh, save_mesh};

    // Volumes
    pub use mesh_volume::{MeanVolume, OccupancyVolume, VolumeAccumulator, VolumeShape};

    // Rasterization
    pub use mesh_voxelize::{CancelToken, Placement, RasterParams, rasterize};

    // Reconstruction
    pub use mesh_isosurface::{IsoConfig, ReconstructedSurface, ZScale, reconstruct};

    // Pipeline (main use case)
    pub use mesh_average::{
        DEFAULT_ID_COLUMN, Dataset, DatasetEntry, DirectoryMeshSource, MeanShape,
        MeanShapePipeline, MeshSource, PipelineConfig,
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let mesh = IndexedMesh::new();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(VolumeShape::cube(3).len(), 27);
    }

    #[test]
    fn test_module_reexports() {
        let _ = types::IndexedMesh::new();
        let _ = voxelize::RasterParams::default();
        let _ = isosurface::IsoConfig::default();
        let _ = average::PipelineConfig::default();
    }
}
