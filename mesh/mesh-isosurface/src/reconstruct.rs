//! Surface reconstruction from a mean volume.

use mesh_types::IndexedMesh;
use mesh_volume::MeanVolume;
use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::IsoConfig;
use crate::error::IsoResult;
use crate::tetra::marching_tetrahedra;
use crate::zscale::ZScale;

/// Isosurface of a mean volume.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconstructedSurface {
    /// Surface in voxel units: x and y are voxel indices, z is the plane
    /// index multiplied by `z_spacing`.
    pub mesh: IndexedMesh,
    /// Corrected z spacing applied to the mesh.
    pub z_spacing: f64,
    /// Iso-level the surface was extracted at.
    pub level: f64,
    /// Lattice stride used for extraction.
    pub step_size: usize,
}

impl ReconstructedSurface {
    /// No sample crossed the iso-level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mesh.faces.is_empty()
    }
}

/// Extract the isosurface of `volume` and rescale z.
///
/// Marching tetrahedra runs over samples `0, s, 2s, ...` of each axis,
/// where `s` is `config.step_size`. A volume with no crossing gives an
/// empty surface, not an error.
///
/// # Errors
///
/// Returns [`IsoError::InvalidConfig`](crate::IsoError::InvalidConfig) or
/// [`IsoError::InvalidZScale`](crate::IsoError::InvalidZScale) for unusable
/// settings.
///
/// # Example
///
/// ```
/// use mesh_isosurface::{reconstruct, IsoConfig, ZScale};
/// use mesh_volume::{MeanVolume, VolumeShape};
///
/// let shape = VolumeShape::cube(3);
/// let mut values = vec![0.0; shape.len()];
/// values[shape.index(1, 1, 1)] = 1.0;
/// let volume = MeanVolume::from_raw(shape, values, 1).unwrap();
///
/// let surface = reconstruct(&volume, &IsoConfig::default(), &ZScale::for_planes(3, 2.0)).unwrap();
/// assert!(surface.mesh.is_watertight());
/// assert!((surface.z_spacing - 2.0).abs() < 1e-12);
/// ```
pub fn reconstruct(
    volume: &MeanVolume,
    config: &IsoConfig,
    z_scale: &ZScale,
) -> IsoResult<ReconstructedSurface> {
    config.validate()?;

    let mut mesh = marching_tetrahedra(volume, config.level, config.step_size);
    if mesh.faces.is_empty() {
        debug!(
            shape = %volume.shape(),
            level = config.level,
            max_value = volume.max_value(),
            "isosurface is empty"
        );
    }
    let z_spacing = z_scale.apply(&mut mesh)?;

    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        step_size = config.step_size,
        z_spacing,
        "reconstructed surface"
    );
    Ok(ReconstructedSurface {
        mesh,
        z_spacing,
        level: config.level,
        step_size: config.step_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IsoError;
    use approx::assert_relative_eq;
    use mesh_volume::VolumeShape;

    fn blob(shape: VolumeShape, inside: impl Fn(usize, usize, usize) -> bool) -> MeanVolume {
        let mut values = vec![0.0; shape.len()];
        for z in 0..shape.nz {
            for y in 0..shape.ny {
                for x in 0..shape.nx {
                    if inside(x, y, z) {
                        values[shape.index(x, y, z)] = 1.0;
                    }
                }
            }
        }
        MeanVolume::from_raw(shape, values, 1).unwrap()
    }

    #[test]
    fn below_level_gives_empty_surface() {
        let shape = VolumeShape::cube(6);
        let volume = MeanVolume::from_raw(shape, vec![0.4; shape.len()], 5).unwrap();
        let surface = reconstruct(&volume, &IsoConfig::default(), &ZScale::unit(6)).unwrap();

        assert!(surface.is_empty());
        assert_eq!(surface.mesh.vertex_count(), 0);
    }

    #[test]
    fn interior_block_is_watertight() {
        let shape = VolumeShape::new(8, 7, 6);
        let volume = blob(shape, |x, y, z| {
            (2..6).contains(&x) && (2..5).contains(&y) && (1..4).contains(&z)
        });
        let surface = reconstruct(&volume, &IsoConfig::default(), &ZScale::unit(6)).unwrap();

        assert!(surface.mesh.is_watertight());
        let bounds = surface.mesh.bounds();
        assert_relative_eq!(bounds.min.x, 1.5);
        assert_relative_eq!(bounds.max.x, 5.5);
        assert_relative_eq!(bounds.min.z, 0.5);
        assert_relative_eq!(bounds.max.z, 3.5);
    }

    #[test]
    fn z_is_rescaled() {
        let shape = VolumeShape::cube(6);
        let volume = blob(shape, |x, y, z| [x, y, z].iter().all(|c| (2..4).contains(c)));
        let surface =
            reconstruct(&volume, &IsoConfig::default(), &ZScale::for_planes(6, 2.5)).unwrap();

        let bounds = surface.mesh.bounds();
        assert_relative_eq!(surface.z_spacing, 2.5);
        assert_relative_eq!(bounds.min.z, 1.5 * 2.5);
        assert_relative_eq!(bounds.max.z, 3.5 * 2.5);
        assert_relative_eq!(bounds.max.x, 3.5);
    }

    #[test]
    fn rescale_matches_zscale_apply() {
        let shape = VolumeShape::new(6, 6, 7);
        let volume = blob(shape, |x, y, z| x + y + z < 9 && x > 0 && y > 0 && z > 0);
        let scale = ZScale::new(20.0, 3.0);
        let scaled = reconstruct(&volume, &IsoConfig::default(), &scale).unwrap();
        let mut unit = reconstruct(&volume, &IsoConfig::default(), &ZScale::unit(7))
            .unwrap()
            .mesh;

        let spacing = scale.apply(&mut unit).unwrap();
        assert_relative_eq!(spacing, 20.0 / 7.0);
        assert_relative_eq!(scaled.z_spacing, spacing);
        assert_eq!(scaled.mesh, unit);
    }

    #[test]
    fn invalid_settings() {
        let volume = blob(VolumeShape::cube(3), |_, _, _| true);
        let err = reconstruct(&volume, &IsoConfig::default().with_step_size(0), &ZScale::unit(3))
            .unwrap_err();
        assert!(matches!(err, IsoError::InvalidConfig(_)));

        let err = reconstruct(&volume, &IsoConfig::default(), &ZScale::new(3.0, -1.0)).unwrap_err();
        assert!(matches!(err, IsoError::InvalidZScale { .. }));
    }
}
