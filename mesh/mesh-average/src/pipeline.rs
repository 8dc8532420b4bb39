//! The mean shape pipeline.

use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use mesh_io::save_mesh;
use mesh_isosurface::{ReconstructedSurface, reconstruct};
use mesh_types::{IndexedMesh, Vector3};
use mesh_volume::{MeanVolume, OccupancyVolume, VolumeAccumulator, VolumeError};
use mesh_voxelize::{CancelToken, VoxelizeError, rasterize_with_cancel};
use tracing::{debug, info, warn};

use crate::config::{MEAN_SURFACE_FILE, MEAN_VOLUME_FILE, PipelineConfig};
use crate::dataset::{Dataset, DatasetEntry};
use crate::error::{PipelineError, PipelineResult};
use crate::report::{RunReport, SkipReason};
use crate::retry::load_with_retry;
use crate::source::MeshSource;

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct MeanShape {
    /// Mean occupancy of all aggregated entries.
    pub volume: MeanVolume,
    /// Isosurface of `volume`, z rescaled.
    pub surface: ReconstructedSurface,
    /// Per-entry outcome.
    pub report: RunReport,
    /// Model-space offset of the volume grid.
    pub offset: Vector3<f64>,
}

impl MeanShape {
    /// The surface moved back into the coordinate frame of the input meshes.
    ///
    /// Undoes the placement offset applied during rasterization, so a
    /// dataset of meshes centred on the origin gives a mean surface centred
    /// on the origin.
    #[must_use]
    pub fn surface_in_source_frame(&self) -> IndexedMesh {
        let mut mesh = self.surface.mesh.clone();
        mesh.translate(-self.offset);
        mesh
    }
}

/// Rasterizes, averages and reconstructs a dataset of closed meshes.
///
/// Entries are processed once each, in dataset order. Rasterization of one
/// entry runs on the configured worker pool; everything else runs on the
/// calling thread.
///
/// # Example
///
/// ```
/// use mesh_average::{Dataset, DatasetEntry, MeanShapePipeline, PipelineConfig};
/// use mesh_io::IoResult;
/// use mesh_types::{shapes::axis_aligned_box, IndexedMesh, Point3};
/// use mesh_volume::VolumeShape;
///
/// let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> {
///     Ok(axis_aligned_box(Point3::new(-3.0, -3.0, -3.0), Point3::new(3.0, 3.0, 3.0)))
/// };
/// let config = PipelineConfig::default().with_shape(VolumeShape::cube(12));
/// let pipeline = MeanShapePipeline::new(source, config);
///
/// let mean = pipeline.run(&Dataset::from_ids(["a", "b"])).unwrap();
/// assert_eq!(mean.report.processed, 2);
/// assert!(mean.surface.mesh.is_watertight());
/// ```
#[derive(Debug)]
pub struct MeanShapePipeline<S> {
    source: S,
    config: PipelineConfig,
    cancel: CancelToken,
}

impl<S: MeshSource> MeanShapePipeline<S> {
    /// Pipeline reading meshes from `source`.
    #[must_use]
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Share `token` for cancelling runs from another thread.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this pipeline's runs.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Aggregate every entry of `dataset` into a mean volume.
    ///
    /// The mean is computed once all entries are done. With an output
    /// directory configured it is also saved there.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidConfig`] before any entry is touched
    /// - [`PipelineError::Cancelled`] once the cancel token is triggered
    /// - [`PipelineError::Load`] for a load failure under
    ///   `abort_on_load_failure`
    /// - [`PipelineError::Rasterize`], [`PipelineError::ShapeMismatch`] or
    ///   [`PipelineError::Persist`] for failures that are not per-entry
    /// - [`PipelineError::NothingAggregated`] if every entry was skipped
    pub fn mean_volume(&self, dataset: &Dataset) -> PipelineResult<(MeanVolume, RunReport)> {
        self.config.validate()?;
        let shape = self.config.shape;
        if let Some(dir) = &self.config.cache_dir {
            create_dir(dir, 0)?;
        }
        info!(
            entries = dataset.len(),
            shape = %shape,
            workers = self.config.raster.workers,
            "aggregating dataset"
        );

        let mut accumulator = VolumeAccumulator::with_shape(shape)
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        let mut report = RunReport::default();
        let mut seen = HashSet::new();

        for entry in dataset {
            let processed = accumulator.accumulated();
            if self.cancel.is_cancelled() {
                info!(processed, "run cancelled");
                return Err(PipelineError::Cancelled { processed });
            }
            if !seen.insert(entry.id.as_str()) {
                debug!(id = %entry.id, "duplicate entry ignored");
                report.duplicates += 1;
                continue;
            }
            if let Some(problem) = entry.file_stem_problem() {
                warn!(id = %entry.id, problem, "skipping entry: unusable id");
                report.skip(&entry.id, SkipReason::InvalidId(problem.to_string()));
                continue;
            }

            let Some(volume) = self.entry_volume(entry, processed, &mut report)? else {
                continue;
            };
            accumulator
                .add(&volume)
                .map_err(|source| PipelineError::ShapeMismatch { processed, source })?;
            debug!(id = %entry.id, inside = volume.inside_count(), "entry aggregated");
        }

        report.processed = accumulator.accumulated();
        if report.processed == 0 {
            return Err(PipelineError::NothingAggregated {
                skipped: report.skipped.len(),
            });
        }
        let mean = accumulator
            .finish()
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;
        info!(
            processed = report.processed,
            skipped = report.skipped.len(),
            duplicates = report.duplicates,
            cached = report.cached,
            "mean volume ready"
        );

        if let Some(dir) = &self.config.output_dir {
            self.save_mean(&mean, dir, report.processed)?;
        }
        Ok((mean, report))
    }

    /// Aggregate `dataset`, reconstruct the mean surface and export it.
    ///
    /// # Errors
    ///
    /// As [`MeanShapePipeline::mean_volume`], plus
    /// [`PipelineError::Reconstruct`] and [`PipelineError::Export`].
    pub fn run(&self, dataset: &Dataset) -> PipelineResult<MeanShape> {
        let (volume, report) = self.mean_volume(dataset)?;
        let surface = reconstruct(&volume, &self.config.iso, &self.config.z_scale())?;
        if surface.is_empty() {
            warn!(
                max_value = volume.max_value(),
                level = surface.level,
                "mean surface is empty"
            );
        }

        if let Some(dir) = &self.config.output_dir {
            let path = dir.join(MEAN_SURFACE_FILE);
            save_mesh(&surface.mesh, &path).map_err(|source| PipelineError::Export {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "mean surface exported");
        }

        let raster = &self.config.raster;
        Ok(MeanShape {
            volume,
            surface,
            report,
            offset: raster.placement.offset(self.config.shape, raster.z_spacing),
        })
    }

    /// Occupancy volume of one entry, or `None` if the entry is skipped.
    fn entry_volume(
        &self,
        entry: &DatasetEntry,
        processed: usize,
        report: &mut RunReport,
    ) -> PipelineResult<Option<OccupancyVolume>> {
        let cache_path = self.cache_path(entry);
        if let Some(volume) = cache_path.as_deref().and_then(|p| self.load_cached(entry, p)) {
            report.cached += 1;
            return Ok(Some(volume));
        }

        let config = &self.config;
        let loaded = load_with_retry(&self.source, entry, config.max_retries, config.retry_delay);
        let mesh = match loaded {
            Ok(mesh) => mesh,
            Err(source) if config.abort_on_load_failure => {
                return Err(PipelineError::Load {
                    id: entry.id.clone(),
                    processed,
                    source,
                });
            }
            Err(e) => {
                warn!(id = %entry.id, error = %e, "skipping entry: load failed");
                report.skip(&entry.id, SkipReason::Load(e.to_string()));
                return Ok(None);
            }
        };

        let rasterized = rasterize_with_cancel(&mesh, config.shape, &config.raster, &self.cancel);
        let volume = match rasterized {
            Ok(volume) => volume,
            Err(VoxelizeError::DegenerateSurface { reason }) => {
                warn!(id = %entry.id, %reason, "skipping entry: degenerate surface");
                report.skip(&entry.id, SkipReason::DegenerateSurface(reason));
                return Ok(None);
            }
            Err(VoxelizeError::Cancelled) => {
                info!(processed, "run cancelled");
                return Err(PipelineError::Cancelled { processed });
            }
            Err(source) => {
                return Err(PipelineError::Rasterize {
                    id: entry.id.clone(),
                    processed,
                    source,
                });
            }
        };

        if let Some(path) = cache_path {
            volume
                .save_npy(&path)
                .map_err(|source| PipelineError::Persist { path, processed, source })?;
        }
        Ok(Some(volume))
    }

    fn cache_path(&self, entry: &DatasetEntry) -> Option<PathBuf> {
        self.config
            .cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.npy", entry.id)))
    }

    /// Cached volume of the configured shape. Unreadable or mismatched
    /// cache files are ignored and later overwritten.
    fn load_cached(&self, entry: &DatasetEntry, path: &Path) -> Option<OccupancyVolume> {
        if !path.is_file() {
            return None;
        }
        match OccupancyVolume::load_npy(path) {
            Ok(volume) if volume.shape() == self.config.shape => {
                debug!(id = %entry.id, "using cached volume");
                Some(volume)
            }
            Ok(volume) => {
                warn!(
                    id = %entry.id,
                    cached = %volume.shape(),
                    expected = %self.config.shape,
                    "ignoring cached volume of another shape"
                );
                None
            }
            Err(e) => {
                warn!(id = %entry.id, error = %e, "ignoring unreadable cached volume");
                None
            }
        }
    }

    fn save_mean(&self, mean: &MeanVolume, dir: &Path, processed: usize) -> PipelineResult<()> {
        create_dir(dir, processed)?;
        let path = dir.join(MEAN_VOLUME_FILE);
        mean.save_npy(&path).map_err(|source| PipelineError::Persist {
            path: path.clone(),
            processed,
            source,
        })?;
        info!(path = %path.display(), "mean volume saved");

        if self.config.save_slices {
            let slices = dir.join("slices");
            create_dir(&slices, processed)?;
            let written = mean
                .save_pgm_stack(&slices, "mean_nuc_mask")
                .map_err(|source| PipelineError::Persist {
                    path: slices.clone(),
                    processed,
                    source,
                })?;
            debug!(planes = written.len(), "mean volume slices saved");
        }
        Ok(())
    }
}

fn create_dir(dir: &Path, processed: usize) -> PipelineResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::Persist {
        path: dir.to_path_buf(),
        processed,
        source: VolumeError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_io::{IoError, IoResult};
    use mesh_types::{Point3, shapes::axis_aligned_box};
    use mesh_volume::VolumeShape;
    use std::cell::Cell;
    use std::time::Duration;

    fn cube(half: f64) -> IndexedMesh {
        axis_aligned_box(Point3::new(-half, -half, -half), Point3::new(half, half, half))
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig::default()
            .with_shape(VolumeShape::cube(10))
            .with_retry_delay(Duration::ZERO)
    }

    #[test]
    fn identical_meshes_give_binary_mean() {
        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> { Ok(cube(2.5)) };
        let pipeline = MeanShapePipeline::new(source, small_config());
        let (mean, report) = pipeline
            .mean_volume(&Dataset::from_ids(["a", "b", "c"]))
            .unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(mean.sample_count(), 3);
        assert!(mean.as_slice().iter().all(|&v| v == 0.0 || v == 1.0));
        assert_eq!(mean.as_slice().iter().filter(|&&v| v == 1.0).count(), 125);
    }

    #[test]
    fn duplicates_processed_once() {
        let calls = Cell::new(0);
        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> {
            calls.set(calls.get() + 1);
            Ok(cube(2.0))
        };
        let pipeline = MeanShapePipeline::new(source, small_config());
        let (_, report) = pipeline
            .mean_volume(&Dataset::from_ids(["a", "b", "a", "b", "a"]))
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(report.processed, 2);
        assert_eq!(report.duplicates, 3);
    }

    #[test]
    fn degenerate_and_missing_entries_are_skipped() {
        let source = |entry: &DatasetEntry| -> IoResult<IndexedMesh> {
            match entry.id.as_str() {
                "open" => {
                    let mut mesh = cube(2.0);
                    mesh.faces.pop();
                    Ok(mesh)
                }
                "gone" => Err(IoError::FileNotFound { path: "gone.vtk".into() }),
                _ => Ok(cube(2.0)),
            }
        };
        let pipeline = MeanShapePipeline::new(source, small_config());
        let (mean, report) = pipeline
            .mean_volume(&Dataset::from_ids(["ok", "open", "gone"]))
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(mean.sample_count(), 1);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(skipped, ["open", "gone"]);
        assert!(matches!(report.skipped[0].reason, SkipReason::DegenerateSurface(_)));
        assert!(matches!(report.skipped[1].reason, SkipReason::Load(_)));
    }

    #[test]
    fn abort_policy_reports_progress() {
        let source = |entry: &DatasetEntry| -> IoResult<IndexedMesh> {
            if entry.id == "bad" {
                Err(IoError::invalid_content("corrupt"))
            } else {
                Ok(cube(2.0))
            }
        };
        let config = small_config().with_abort_on_load_failure(true);
        let err = MeanShapePipeline::new(source, config)
            .mean_volume(&Dataset::from_ids(["a", "b", "bad", "c"]))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Load { ref id, processed: 2, .. } if id == "bad"));
    }

    #[test]
    fn nothing_aggregated() {
        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> { Ok(IndexedMesh::new()) };
        let err = MeanShapePipeline::new(source, small_config())
            .mean_volume(&Dataset::from_ids(["a", "b"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::NothingAggregated { skipped: 2 }));
    }

    #[test]
    fn cancelled_before_start() {
        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> { Ok(cube(2.0)) };
        let token = CancelToken::new();
        token.cancel();
        let err = MeanShapePipeline::new(source, small_config())
            .with_cancel_token(token)
            .mean_volume(&Dataset::from_ids(["a"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { processed: 0 }));
    }

    #[test]
    fn cancelled_mid_run_keeps_no_mean() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let source = move |entry: &DatasetEntry| -> IoResult<IndexedMesh> {
            if entry.id == "c" {
                trigger.cancel();
            }
            Ok(cube(2.0))
        };
        let err = MeanShapePipeline::new(source, small_config())
            .with_cancel_token(token)
            .mean_volume(&Dataset::from_ids(["a", "b", "c", "d"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { processed: 2 }));
    }

    #[test]
    fn invalid_config_touches_nothing() {
        let calls = Cell::new(0);
        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> {
            calls.set(calls.get() + 1);
            Ok(cube(2.0))
        };
        let config = small_config().with_workers(0);
        let err = MeanShapePipeline::new(source, config)
            .mean_volume(&Dataset::from_ids(["a"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn ids_naming_other_directories_are_skipped() {
        let work = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let cache = work.path().join("cache");
        let absolute = elsewhere.path().join("escaped").display().to_string();

        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> { Ok(cube(2.0)) };
        let config = small_config().with_cache_dir(&cache);
        let dataset = Dataset::from_ids(["ok", "../up", absolute.as_str(), "a/b"]);
        let (_, report) = MeanShapePipeline::new(source, config)
            .mean_volume(&dataset)
            .unwrap();

        assert_eq!(report.processed, 1);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(skipped, ["../up", absolute.as_str(), "a/b"]);
        assert!(
            report
                .skipped
                .iter()
                .all(|s| matches!(s.reason, SkipReason::InvalidId(_)))
        );
        assert!(cache.join("ok.npy").is_file());
        assert!(!elsewhere.path().join("escaped.npy").exists());
        assert!(!work.path().join("up.npy").exists());
        assert_eq!(std::fs::read_dir(&cache).unwrap().count(), 1);
    }

    #[test]
    fn source_frame_undoes_centering() {
        let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> { Ok(cube(3.0)) };
        let config = small_config().with_shape(VolumeShape::cube(12));
        let mean = MeanShapePipeline::new(source, config)
            .run(&Dataset::from_ids(["a"]))
            .unwrap();

        let center = mean.surface_in_source_frame().bounds().center();
        assert!(center.coords.norm() < 1e-9, "center {center:?}");
    }
}
