//! Error types for isosurface reconstruction.

use mesh_volume::VolumeError;
use thiserror::Error;

/// Result type for isosurface operations.
pub type IsoResult<T> = Result<T, IsoError>;

/// Errors that can occur during reconstruction.
#[derive(Debug, Error)]
pub enum IsoError {
    /// Extraction settings are unusable.
    #[error("invalid isosurface config: {0}")]
    InvalidConfig(String),

    /// Z rescaling cannot be computed.
    #[error("invalid z scale: extent {extent}, spacing {spacing}")]
    InvalidZScale {
        /// Physical z extent of the volume.
        extent: f64,
        /// Physical distance between z-planes.
        spacing: f64,
    },

    /// Underlying volume error.
    #[error(transparent)]
    Volume(#[from] VolumeError),
}

impl IsoError {
    /// Create an invalid config error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
