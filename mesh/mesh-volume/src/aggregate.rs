//! Summing occupancy volumes into a mean.

use tracing::debug;

use crate::error::{VolumeError, VolumeResult};
use crate::{INSIDE, MeanVolume, OccupancyVolume, VolumeShape};

/// Running per-voxel inside counts.
///
/// The first added volume fixes the shape. Accumulators built on separate
/// threads can be combined with [`merge`](Self::merge); the result does not
/// depend on how volumes were split between them.
///
/// # Example
///
/// ```
/// use mesh_volume::{OccupancyVolume, VolumeAccumulator, VolumeShape};
///
/// let shape = VolumeShape::cube(4);
/// let mut acc = VolumeAccumulator::new();
/// acc.add(&OccupancyVolume::filled(shape, true).unwrap()).unwrap();
/// acc.add(&OccupancyVolume::filled(shape, false).unwrap()).unwrap();
///
/// let mean = acc.finish().unwrap();
/// assert_eq!(mean.sample_count(), 2);
/// assert!(mean.as_slice().iter().all(|&v| v == 0.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VolumeAccumulator {
    shape: Option<VolumeShape>,
    counts: Vec<u32>,
    accumulated: usize,
}

impl VolumeAccumulator {
    /// Empty accumulator whose shape is set by the first volume.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shape: None,
            counts: Vec::new(),
            accumulated: 0,
        }
    }

    /// Empty accumulator that only accepts volumes of `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::EmptyShape`] if any axis is zero.
    pub fn with_shape(shape: VolumeShape) -> VolumeResult<Self> {
        shape.validate()?;
        Ok(Self {
            shape: Some(shape),
            counts: vec![0; shape.len()],
            accumulated: 0,
        })
    }

    /// Shape fixed so far, if any.
    #[must_use]
    pub const fn shape(&self) -> Option<VolumeShape> {
        self.shape
    }

    /// Number of volumes added.
    #[must_use]
    pub const fn accumulated(&self) -> usize {
        self.accumulated
    }

    /// `true` before any volume has been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.accumulated == 0
    }

    fn check_shape(&mut self, actual: VolumeShape) -> VolumeResult<()> {
        match self.shape {
            Some(expected) if expected != actual => {
                Err(VolumeError::ShapeMismatch { expected, actual })
            }
            Some(_) => Ok(()),
            None => {
                self.shape = Some(actual);
                self.counts = vec![0; actual.len()];
                Ok(())
            }
        }
    }

    /// Count the inside voxels of `volume`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::ShapeMismatch`] if the shape differs from the
    /// established one. The accumulator is unchanged on error.
    pub fn add(&mut self, volume: &OccupancyVolume) -> VolumeResult<()> {
        self.check_shape(volume.shape())?;
        for (count, &voxel) in self.counts.iter_mut().zip(volume.as_slice()) {
            *count += u32::from(voxel == INSIDE);
        }
        self.accumulated += 1;
        Ok(())
    }

    /// Combine two partial accumulations.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::ShapeMismatch`] if both sides have a shape and
    /// they differ.
    pub fn merge(mut self, other: Self) -> VolumeResult<Self> {
        let Some(other_shape) = other.shape else {
            return Ok(self);
        };
        self.check_shape(other_shape)?;
        for (count, add) in self.counts.iter_mut().zip(&other.counts) {
            *count += add;
        }
        self.accumulated += other.accumulated;
        Ok(self)
    }

    /// Divide every count by the number of volumes added.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::NoVolumes`] if nothing was added.
    #[allow(clippy::cast_precision_loss)]
    // Precision: counts stay far below 2^52
    pub fn finish(self) -> VolumeResult<MeanVolume> {
        let Some(shape) = self.shape.filter(|_| self.accumulated > 0) else {
            return Err(VolumeError::NoVolumes);
        };
        let n = self.accumulated as f64;
        let values = self
            .counts
            .iter()
            .map(|&count| f64::from(count) / n)
            .collect();
        debug!(shape = %shape, volumes = self.accumulated, "mean volume computed");
        MeanVolume::from_raw(shape, values, self.accumulated)
    }
}

/// Mean of a sequence of occupancy volumes.
///
/// # Errors
///
/// Returns [`VolumeError::NoVolumes`] for an empty sequence and
/// [`VolumeError::ShapeMismatch`] if the volumes disagree on shape.
pub fn aggregate<'a, I>(volumes: I) -> VolumeResult<MeanVolume>
where
    I: IntoIterator<Item = &'a OccupancyVolume>,
{
    let mut acc = VolumeAccumulator::new();
    for volume in volumes {
        acc.add(volume)?;
    }
    acc.finish()
}
