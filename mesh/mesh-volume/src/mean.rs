//! Fractional mean volumes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{VolumeError, VolumeResult};
use crate::{INSIDE, OUTSIDE, OccupancyVolume, VolumeShape};

/// Per-voxel fraction of the input solids covering each voxel.
///
/// Every value lies in `[0, 1]`. `sample_count` records how many occupancy
/// volumes contributed; it is zero for a volume loaded from disk, where the
/// count is not stored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeanVolume {
    shape: VolumeShape,
    values: Vec<f64>,
    sample_count: usize,
}

impl MeanVolume {
    /// Wrap precomputed values.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::EmptyShape`] for a zero axis and
    /// [`VolumeError::LengthMismatch`] if `values` does not fit the shape.
    pub fn from_raw(
        shape: VolumeShape,
        values: Vec<f64>,
        sample_count: usize,
    ) -> VolumeResult<Self> {
        shape.validate()?;
        if values.len() != shape.len() {
            return Err(VolumeError::LengthMismatch {
                expected: shape.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            shape,
            values,
            sample_count,
        })
    }

    /// Volume dimensions.
    #[inline]
    #[must_use]
    pub const fn shape(&self) -> VolumeShape {
        self.shape
    }

    /// Number of occupancy volumes averaged into this one.
    #[inline]
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Raw values, x fastest.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Value at `(x, y, z)`, or `None` out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        self.shape
            .contains(x, y, z)
            .then(|| self.values[self.shape.index(x, y, z)])
    }

    /// Largest value in the volume.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Binarize: voxels with value `>= level` become inside.
    #[must_use]
    pub fn threshold(&self, level: f64) -> OccupancyVolume {
        OccupancyVolume {
            shape: self.shape,
            voxels: self
                .values
                .iter()
                .map(|&v| if v >= level { INSIDE } else { OUTSIDE })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn length_checked() {
        assert!(MeanVolume::from_raw(VolumeShape::cube(2), vec![0.0; 8], 1).is_ok());
        assert!(matches!(
            MeanVolume::from_raw(VolumeShape::cube(2), vec![0.0; 9], 1),
            Err(VolumeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn threshold_at_half() {
        let shape = VolumeShape::new(4, 1, 1);
        let mean = MeanVolume::from_raw(shape, vec![0.0, 0.49, 0.5, 1.0], 2).unwrap();

        let mask = mean.threshold(0.5);
        assert_eq!(mask.inside_count(), 2);
        assert!(mask.is_inside(2, 0, 0));
        assert!(!mask.is_inside(1, 0, 0));
        assert_relative_eq!(mean.max_value(), 1.0);
        assert_eq!(mean.get(1, 0, 0), Some(0.49));
    }
}
