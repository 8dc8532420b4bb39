//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use mesh_isosurface::{IsoConfig, ZScale};
use mesh_volume::VolumeShape;
use mesh_voxelize::RasterParams;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// File name of the saved mean volume in the output directory.
pub const MEAN_VOLUME_FILE: &str = "mean_nuc_mask.npy";

/// File name of the exported mean surface in the output directory.
pub const MEAN_SURFACE_FILE: &str = "mean_nuc_mesh.stl";

/// Configuration for [`MeanShapePipeline`](crate::MeanShapePipeline).
///
/// # Example
///
/// ```
/// use mesh_average::PipelineConfig;
/// use mesh_volume::VolumeShape;
///
/// let config = PipelineConfig::default()
///     .with_shape(VolumeShape::new(64, 64, 32))
///     .with_z_spacing(2.0)
///     .with_max_retries(1);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.z_scale().levels().unwrap(), 32);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Shape every mesh is rasterized into.
    pub shape: VolumeShape,

    /// Rasterizer settings, including worker count and z spacing.
    pub raster: RasterParams,

    /// Isosurface settings.
    pub iso: IsoConfig,

    /// Z rescaling of the reconstructed surface. Derived from `shape.nz`
    /// and `raster.z_spacing` when unset.
    pub z_scale: Option<ZScale>,

    /// Extra attempts for transient load failures.
    pub max_retries: usize,

    /// Delay before the first retry; doubled for each later one.
    pub retry_delay: Duration,

    /// Abort the run on a load failure instead of skipping the entry.
    pub abort_on_load_failure: bool,

    /// Directory of per-entry occupancy volumes reused across runs.
    pub cache_dir: Option<PathBuf>,

    /// Directory receiving the mean volume and surface.
    pub output_dir: Option<PathBuf>,

    /// Also write the mean volume as a PGM stack under `output_dir`.
    pub save_slices: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shape: VolumeShape::cube(128),
            raster: RasterParams::default(),
            iso: IsoConfig::default(),
            z_scale: None,
            max_retries: 3,
            retry_delay: Duration::from_millis(50),
            abort_on_load_failure: false,
            cache_dir: None,
            output_dir: None,
            save_slices: false,
        }
    }
}

impl PipelineConfig {
    /// Smaller volume and stride-2 extraction.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            shape: VolumeShape::cube(64),
            iso: IsoConfig::preview(),
            ..Self::default()
        }
    }

    /// Full-core rasterization with a tight surface tolerance.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            raster: RasterParams::high_quality(),
            iso: IsoConfig::high_quality(),
            ..Self::default()
        }
    }

    /// Set the volume shape.
    #[must_use]
    pub fn with_shape(mut self, shape: VolumeShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the rasterizer settings.
    #[must_use]
    pub fn with_raster(mut self, raster: RasterParams) -> Self {
        self.raster = raster;
        self
    }

    /// Set the rasterizer z spacing.
    #[must_use]
    pub fn with_z_spacing(mut self, spacing: f64) -> Self {
        self.raster.z_spacing = spacing;
        self
    }

    /// Set the rasterizer worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.raster.workers = workers;
        self
    }

    /// Set the isosurface settings.
    #[must_use]
    pub fn with_iso(mut self, iso: IsoConfig) -> Self {
        self.iso = iso;
        self
    }

    /// Override the derived z rescaling.
    #[must_use]
    pub fn with_z_scale(mut self, z_scale: ZScale) -> Self {
        self.z_scale = Some(z_scale);
        self
    }

    /// Set the retry budget for transient load failures.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Abort (or not) on load failures.
    #[must_use]
    pub fn with_abort_on_load_failure(mut self, abort: bool) -> Self {
        self.abort_on_load_failure = abort;
        self
    }

    /// Cache per-entry volumes in `dir`.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Write results to `dir`.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Write (or not) the mean volume as an image stack.
    #[must_use]
    pub fn with_save_slices(mut self, save: bool) -> Self {
        self.save_slices = save;
        self
    }

    /// Z rescaling applied to the reconstructed surface.
    #[must_use]
    pub fn z_scale(&self) -> ZScale {
        self.z_scale
            .unwrap_or_else(|| ZScale::for_planes(self.shape.nz, self.raster.z_spacing))
    }

    /// Check every component.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first unusable
    /// setting.
    pub fn validate(&self) -> PipelineResult<()> {
        self.shape
            .validate()
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        self.raster
            .validate()
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        self.iso
            .validate()
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        self.z_scale()
            .levels()
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.raster.workers, 2);
        assert_eq!(config.max_retries, 3);
        assert!(!config.abort_on_load_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn derived_z_scale() {
        let config = PipelineConfig::default()
            .with_shape(VolumeShape::new(32, 32, 20))
            .with_z_spacing(1.5);
        let scale = config.z_scale();
        assert_relative_eq!(scale.extent, 30.0);
        assert_relative_eq!(scale.corrected_spacing().unwrap(), 1.5);
    }

    #[test]
    fn explicit_z_scale_wins() {
        let config = PipelineConfig::default().with_z_scale(ZScale::new(10.0, 3.0));
        assert_eq!(config.z_scale().levels().unwrap(), 3);
    }

    #[test]
    fn invalid_parts_are_rejected() {
        let zero_axis = PipelineConfig::default().with_shape(VolumeShape::new(4, 0, 4));
        assert!(matches!(zero_axis.validate(), Err(PipelineError::InvalidConfig(_))));

        assert!(PipelineConfig::default().with_workers(0).validate().is_err());
        assert!(PipelineConfig::default().with_z_spacing(-1.0).validate().is_err());
        assert!(
            PipelineConfig::default()
                .with_iso(IsoConfig::default().with_step_size(0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn presets_validate() {
        assert!(PipelineConfig::preview().validate().is_ok());
        assert!(PipelineConfig::high_quality().validate().is_ok());
    }
}
