//! Dense volume dimensions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{VolumeError, VolumeResult};

/// Dimensions of a dense volume, in voxels.
///
/// Voxels are laid out with x varying fastest, then y, then z, so each
/// z-plane is one contiguous run of `nx * ny` voxels. This matches the
/// C-order layout of an array of shape `(nz, ny, nx)`.
///
/// # Example
///
/// ```
/// use mesh_volume::VolumeShape;
///
/// let shape = VolumeShape::new(4, 3, 2);
/// assert_eq!(shape.len(), 24);
/// assert_eq!(shape.plane_len(), 12);
/// assert_eq!(shape.index(1, 2, 1), 12 + 2 * 4 + 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VolumeShape {
    /// Voxels along x.
    pub nx: usize,
    /// Voxels along y.
    pub ny: usize,
    /// Voxels along z (number of planes).
    pub nz: usize,
}

impl VolumeShape {
    /// Create a shape from its three extents.
    #[inline]
    #[must_use]
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Cubic shape with `n` voxels per axis.
    #[inline]
    #[must_use]
    pub const fn cube(n: usize) -> Self {
        Self::new(n, n, n)
    }

    /// Total number of voxels.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Total number of voxels, or `None` if it overflows `usize`.
    #[must_use]
    pub const fn checked_len(&self) -> Option<usize> {
        match self.nx.checked_mul(self.ny) {
            Some(plane) => plane.checked_mul(self.nz),
            None => None,
        }
    }

    /// `true` when any axis has zero length.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0 || self.nz == 0
    }

    /// Voxels in one z-plane.
    #[inline]
    #[must_use]
    pub const fn plane_len(&self) -> usize {
        self.nx * self.ny
    }

    /// Linear index of voxel `(x, y, z)`. Caller guarantees bounds.
    #[inline]
    #[must_use]
    pub const fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.nx * (y + self.ny * z)
    }

    /// `true` when `(x, y, z)` lies inside the volume.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.nx && y < self.ny && z < self.nz
    }

    /// Reject shapes with a zero-length axis.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::EmptyShape`] when any axis is zero.
    pub fn validate(&self) -> VolumeResult<()> {
        if self.is_empty() {
            Err(VolumeError::EmptyShape { shape: *self })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for VolumeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}
