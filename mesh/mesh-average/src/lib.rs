//! Mean shape of a dataset of closed surface meshes.
//!
//! The pipeline turns every mesh of a [`Dataset`] into an occupancy volume of
//! one fixed shape, averages the volumes voxel by voxel and extracts the
//! 0.5 isosurface of the mean. The result approximates the shape shared by
//! the inputs, e.g. a mean cell nucleus.
//!
//! # Overview
//!
//! 1. Read the dataset listing ([`Dataset::from_csv`])
//! 2. Load each unique entry through a [`MeshSource`], retrying transient
//!    failures
//! 3. Rasterize it on the worker pool (`mesh-voxelize`), or reuse a cached
//!    volume
//! 4. Add it to the accumulator (`mesh-volume`)
//! 5. Once every entry is done, compute the mean, reconstruct and rescale
//!    its surface (`mesh-isosurface`), and save the results
//!
//! Entries with open or empty surfaces and entries that fail to load are
//! skipped and listed in the [`RunReport`]; they count towards neither the
//! sum nor the divisor of the mean.
//!
//! # Example
//!
//! ```no_run
//! use mesh_average::{
//!     Dataset, DirectoryMeshSource, MeanShapePipeline, PipelineConfig, DEFAULT_ID_COLUMN,
//! };
//!
//! let dataset = Dataset::from_csv("meshes/nucleus_timelapse.csv", DEFAULT_ID_COLUMN)?;
//! let config = PipelineConfig::default()
//!     .with_z_spacing(2.9)
//!     .with_cache_dir("cache")
//!     .with_output_dir("out");
//!
//! let pipeline = MeanShapePipeline::new(DirectoryMeshSource::new("meshes"), config);
//! let mean = pipeline.run(&dataset)?;
//! println!("{} meshes averaged", mean.report.processed);
//! # Ok::<(), mesh_average::PipelineError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod dataset;
mod error;
mod pipeline;
mod report;
mod retry;
mod source;

pub use config::{MEAN_SURFACE_FILE, MEAN_VOLUME_FILE, PipelineConfig};
pub use dataset::{DEFAULT_ID_COLUMN, Dataset, DatasetEntry};
pub use error::{DatasetError, PipelineError, PipelineResult};
pub use pipeline::{MeanShape, MeanShapePipeline};
pub use report::{RunReport, SkipReason, SkippedEntry};
pub use source::{DirectoryMeshSource, MeshSource};

pub use mesh_voxelize::CancelToken;
