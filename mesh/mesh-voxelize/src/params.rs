//! Parameters for solid rasterization.

use mesh_volume::VolumeShape;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{VoxelizeError, VoxelizeResult};

/// Where the model origin sits in the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Placement {
    /// Model coordinates are grid coordinates: voxel `(i, j, k)` samples
    /// `(i, j, k * z_spacing)`.
    AsIs,
    /// The model origin maps to the volume center, so a mesh centred on
    /// zero fills the middle of the volume.
    #[default]
    Centered,
}

impl Placement {
    /// Model-space offset subtracted from grid coordinates.
    ///
    /// Grid point `(i, j, k)` samples the model point
    /// `(i, j, k * z_spacing) - offset`.
    #[allow(clippy::cast_precision_loss)]
    // Precision: volume extents are far below 2^52
    #[must_use]
    pub fn offset(self, shape: VolumeShape, z_spacing: f64) -> Vector3<f64> {
        match self {
            Self::AsIs => Vector3::zeros(),
            Self::Centered => Vector3::new(
                shape.nx as f64 / 2.0,
                shape.ny as f64 / 2.0,
                shape.nz as f64 * z_spacing / 2.0,
            ),
        }
    }
}

/// Parameters for [`rasterize`](crate::rasterize).
///
/// # Example
///
/// ```
/// use mesh_voxelize::{Placement, RasterParams};
///
/// let params = RasterParams::default();
/// assert_eq!(params.workers, 2);
///
/// let params = RasterParams::single_threaded()
///     .z_spacing(2.5)
///     .placement(Placement::AsIs);
/// assert_eq!(params.workers, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RasterParams {
    /// Number of worker threads filling planes concurrently.
    pub workers: usize,

    /// Grid points closer than this to the surface along x are outside.
    pub tolerance: f64,

    /// Model-space distance between consecutive z-planes.
    pub z_spacing: f64,

    /// Mapping between model and grid coordinates.
    pub placement: Placement,

    /// Reject surfaces with boundary or non-manifold edges.
    pub require_closed: bool,
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            workers: 2,
            tolerance: 1e-6,
            z_spacing: 1.0,
            placement: Placement::Centered,
            require_closed: true,
        }
    }
}

impl RasterParams {
    /// Run on the calling thread's pool with a single worker.
    #[must_use]
    pub fn single_threaded() -> Self {
        Self {
            workers: 1,
            ..Self::default()
        }
    }

    /// Use every available core and a tighter surface tolerance.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(2, std::num::NonZeroUsize::get),
            tolerance: 1e-9,
            ..Self::default()
        }
    }

    /// Set the worker count.
    #[must_use]
    pub const fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the on-surface tolerance.
    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the z-plane spacing.
    #[must_use]
    pub const fn z_spacing(mut self, spacing: f64) -> Self {
        self.z_spacing = spacing;
        self
    }

    /// Set the placement.
    #[must_use]
    pub const fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Require (or not) a closed surface.
    #[must_use]
    pub const fn require_closed(mut self, require: bool) -> Self {
        self.require_closed = require;
        self
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelizeError::InvalidParams`] for zero workers, a negative
    /// or non-finite tolerance, or a non-positive z spacing.
    pub fn validate(&self) -> VoxelizeResult<()> {
        if self.workers == 0 {
            return Err(VoxelizeError::invalid_params("workers must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(VoxelizeError::invalid_params(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !(self.z_spacing.is_finite() && self.z_spacing > 0.0) {
            return Err(VoxelizeError::invalid_params(format!(
                "z spacing must be positive, got {}",
                self.z_spacing
            )));
        }
        Ok(())
    }
}
