//! Extraction settings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{IsoError, IsoResult};

/// Configuration for [`reconstruct`](crate::reconstruct).
///
/// # Example
///
/// ```
/// use mesh_isosurface::IsoConfig;
///
/// let config = IsoConfig::default();
/// assert_eq!(config.step_size, 1);
///
/// let preview = IsoConfig::preview().with_level(0.3);
/// assert_eq!(preview.step_size, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IsoConfig {
    /// Iso-level; samples with `value >= level` are inside.
    pub level: f64,

    /// Lattice stride in voxels. 1 samples every voxel.
    pub step_size: usize,
}

impl Default for IsoConfig {
    fn default() -> Self {
        Self {
            level: 0.5,
            step_size: 1,
        }
    }
}

impl IsoConfig {
    /// Coarser lattice for fast preview.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            step_size: 2,
            ..Self::default()
        }
    }

    /// Full resolution.
    #[must_use]
    pub fn high_quality() -> Self {
        Self::default()
    }

    /// Set the iso-level.
    #[must_use]
    pub const fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    /// Set the lattice stride.
    #[must_use]
    pub const fn with_step_size(mut self, step_size: usize) -> Self {
        self.step_size = step_size;
        self
    }

    /// Check the settings.
    ///
    /// # Errors
    ///
    /// Returns [`IsoError::InvalidConfig`] for a zero step or a non-finite
    /// level.
    pub fn validate(&self) -> IsoResult<()> {
        if self.step_size == 0 {
            return Err(IsoError::invalid_config("step_size must be at least 1"));
        }
        if !self.level.is_finite() {
            return Err(IsoError::invalid_config(format!(
                "level must be finite, got {}",
                self.level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults() {
        let config = IsoConfig::default();
        assert_relative_eq!(config.level, 0.5);
        assert_eq!(config.step_size, 1);
        assert!(config.validate().is_ok());
        assert_eq!(IsoConfig::high_quality(), config);
    }

    #[test]
    fn rejects_zero_step() {
        let err = IsoConfig::default().with_step_size(0).validate().unwrap_err();
        assert!(matches!(err, IsoError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_nan_level() {
        assert!(IsoConfig::default().with_level(f64::NAN).validate().is_err());
    }
}
