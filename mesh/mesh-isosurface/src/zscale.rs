//! Correction for anisotropic z spacing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use mesh_types::IndexedMesh;

use crate::error::{IsoError, IsoResult};

/// Mapping from z-level index to physical z.
///
/// Extraction produces z in plane indices. The number of planes is
/// `round(extent / spacing)`, so the spacing that actually fits the extent
/// is `extent / levels`; vertex z is multiplied by that corrected value.
///
/// # Example
///
/// ```
/// use mesh_isosurface::ZScale;
///
/// let scale = ZScale::new(20.0, 3.0);
/// assert_eq!(scale.levels().unwrap(), 7);
/// assert!((scale.corrected_spacing().unwrap() - 20.0 / 7.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZScale {
    /// Physical z extent covered by the volume.
    pub extent: f64,
    /// Intended physical distance between z-planes.
    pub spacing: f64,
}

impl ZScale {
    /// Scale from extent and plane spacing.
    #[must_use]
    pub const fn new(extent: f64, spacing: f64) -> Self {
        Self { extent, spacing }
    }

    /// No rescaling: one unit per plane over `planes` planes.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn unit(planes: usize) -> Self {
        Self::new(planes as f64, 1.0)
    }

    /// Scale for a volume of `planes` planes sampled every `spacing`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn for_planes(planes: usize, spacing: f64) -> Self {
        Self::new(planes as f64 * spacing, spacing)
    }

    /// Number of z-levels, `round(extent / spacing)`.
    ///
    /// # Errors
    ///
    /// Returns [`IsoError::InvalidZScale`] when either value is non-positive
    /// or non-finite, or when the extent rounds to zero levels.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Truncation: the ratio is checked positive and finite first
    pub fn levels(&self) -> IsoResult<usize> {
        let valid = self.extent.is_finite()
            && self.spacing.is_finite()
            && self.extent > 0.0
            && self.spacing > 0.0;
        let ratio = (self.extent / self.spacing).round();
        if !valid || !ratio.is_finite() || ratio < 1.0 {
            return Err(self.invalid());
        }
        Ok(ratio as usize)
    }

    /// Spacing that divides the extent into whole levels.
    ///
    /// # Errors
    ///
    /// As [`ZScale::levels`].
    #[allow(clippy::cast_precision_loss)]
    pub fn corrected_spacing(&self) -> IsoResult<f64> {
        let levels = self.levels()?;
        Ok(self.extent / levels as f64)
    }

    /// Multiply every vertex z by the corrected spacing.
    ///
    /// # Errors
    ///
    /// As [`ZScale::levels`]. The mesh is untouched on error.
    pub fn apply(&self, mesh: &mut IndexedMesh) -> IsoResult<f64> {
        let spacing = self.corrected_spacing()?;
        mesh.scale_z(spacing);
        Ok(spacing)
    }

    fn invalid(&self) -> IsoError {
        IsoError::InvalidZScale {
            extent: self.extent,
            spacing: self.spacing,
        }
    }
}
