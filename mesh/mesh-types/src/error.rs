//! Error types for mesh construction.

use thiserror::Error;

/// Result type for mesh construction.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors raised while building an [`IndexedMesh`](crate::IndexedMesh).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A polygon had fewer than three corners.
    #[error("polygon has {corners} corners, at least 3 are required")]
    PolygonTooSmall {
        /// Number of corners supplied.
        corners: usize,
    },

    /// A face referenced a vertex that does not exist.
    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}
