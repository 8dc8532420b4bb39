//! Error types for volume operations.

use thiserror::Error;

use crate::VolumeShape;

/// Result type for volume operations.
pub type VolumeResult<T> = Result<T, VolumeError>;

/// Errors that can occur while building, aggregating or persisting volumes.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// A volume axis has zero length.
    #[error("volume shape {shape} has a zero-length axis")]
    EmptyShape {
        /// The rejected shape.
        shape: VolumeShape,
    },

    /// A volume does not have the shape established by the first one.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Shape of the first accumulated volume.
        expected: VolumeShape,
        /// Shape of the offending volume.
        actual: VolumeShape,
    },

    /// Raw buffer length does not match the shape.
    #[error("buffer holds {actual} voxels, shape needs {expected}")]
    LengthMismatch {
        /// Voxels required by the shape.
        expected: usize,
        /// Voxels supplied.
        actual: usize,
    },

    /// The mean was requested before any volume was accumulated.
    #[error("no volumes were accumulated")]
    NoVolumes,

    /// An `.npy` file could not be interpreted.
    #[error("invalid npy file: {reason}")]
    InvalidNpy {
        /// What was wrong with the file.
        reason: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VolumeError {
    pub(crate) fn invalid_npy(reason: impl Into<String>) -> Self {
        Self::InvalidNpy {
            reason: reason.into(),
        }
    }
}
