//! Error types for solid rasterization.

use mesh_volume::VolumeError;
use thiserror::Error;

/// Result type alias for rasterization.
pub type VoxelizeResult<T> = Result<T, VoxelizeError>;

/// Errors that can occur while rasterizing a surface.
#[derive(Debug, Error)]
pub enum VoxelizeError {
    /// The surface does not bound a solid.
    #[error("degenerate surface: {reason}")]
    DegenerateSurface {
        /// What is wrong with the surface.
        reason: String,
    },

    /// Rasterization parameters are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// The run was cancelled before every plane was filled.
    #[error("rasterization cancelled")]
    Cancelled,

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The target volume could not be created.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

impl VoxelizeError {
    /// Create a degenerate surface error.
    #[must_use]
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateSurface {
            reason: reason.into(),
        }
    }

    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }
}
