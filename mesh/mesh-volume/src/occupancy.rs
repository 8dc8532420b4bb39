//! Binary occupancy volumes produced by rasterization.

use std::slice::ChunksExact;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{VolumeError, VolumeResult};
use crate::VolumeShape;

/// Marker stored for voxels inside the solid.
pub const INSIDE: u8 = 255;

/// Marker stored for voxels outside the solid.
pub const OUTSIDE: u8 = 0;

/// A dense grid of inside/outside markers.
///
/// Each voxel holds [`INSIDE`] or [`OUTSIDE`]. Values are stored with x
/// varying fastest (see [`VolumeShape`]).
///
/// # Example
///
/// ```
/// use mesh_volume::{OccupancyVolume, VolumeShape, INSIDE};
///
/// let mut volume = OccupancyVolume::new(VolumeShape::new(4, 4, 2)).unwrap();
/// volume.set(1, 2, 1, true);
///
/// assert_eq!(volume.get(1, 2, 1), Some(INSIDE));
/// assert_eq!(volume.inside_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OccupancyVolume {
    pub(crate) shape: VolumeShape,
    pub(crate) voxels: Vec<u8>,
}

impl OccupancyVolume {
    /// All-outside volume of the given shape.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::EmptyShape`] if any axis is zero.
    pub fn new(shape: VolumeShape) -> VolumeResult<Self> {
        Self::filled(shape, false)
    }

    /// Volume with every voxel set to inside or outside.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::EmptyShape`] if any axis is zero.
    pub fn filled(shape: VolumeShape, inside: bool) -> VolumeResult<Self> {
        shape.validate()?;
        let marker = if inside { INSIDE } else { OUTSIDE };
        Ok(Self {
            shape,
            voxels: vec![marker; shape.len()],
        })
    }

    /// Wrap an existing buffer.
    ///
    /// Any byte other than [`INSIDE`] reads as outside.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::EmptyShape`] for a zero axis and
    /// [`VolumeError::LengthMismatch`] if `voxels` does not fit the shape.
    pub fn from_raw(shape: VolumeShape, voxels: Vec<u8>) -> VolumeResult<Self> {
        shape.validate()?;
        if voxels.len() != shape.len() {
            return Err(VolumeError::LengthMismatch {
                expected: shape.len(),
                actual: voxels.len(),
            });
        }
        Ok(Self { shape, voxels })
    }

    /// Volume dimensions.
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> VolumeShape {
        self.shape
    }

    /// Raw voxel markers.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.voxels
    }

    /// Consume the volume, returning its buffer.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.voxels
    }

    /// Marker at `(x, y, z)`, or `None` out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<u8> {
        self.shape
            .contains(x, y, z)
            .then(|| self.voxels[self.shape.index(x, y, z)])
    }

    /// `true` when `(x, y, z)` is in bounds and inside.
    #[must_use]
    pub fn is_inside(&self, x: usize, y: usize, z: usize) -> bool {
        self.get(x, y, z) == Some(INSIDE)
    }

    /// Mark `(x, y, z)` inside or outside. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, z: usize, inside: bool) {
        if self.shape.contains(x, y, z) {
            let idx = self.shape.index(x, y, z);
            self.voxels[idx] = if inside { INSIDE } else { OUTSIDE };
        }
    }

    /// Number of inside voxels.
    #[must_use]
    pub fn inside_count(&self) -> usize {
        self.voxels.iter().filter(|&&v| v == INSIDE).count()
    }

    /// One z-plane, or `None` if `z` is out of range.
    #[must_use]
    pub fn plane(&self, z: usize) -> Option<&[u8]> {
        let len = self.shape.plane_len();
        self.voxels.get(z * len..(z + 1) * len)
    }

    /// Iterate over z-planes in order.
    pub fn planes(&self) -> ChunksExact<'_, u8> {
        self.voxels.chunks_exact(self.shape.plane_len())
    }

    /// Mutable voxel buffer. Split it into `plane_len()` chunks to fill
    /// z-planes independently.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.voxels
    }
}
