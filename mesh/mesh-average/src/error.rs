//! Error types for the mean shape pipeline.

use std::path::PathBuf;

use mesh_io::IoError;
use mesh_isosurface::IsoError;
use mesh_volume::VolumeError;
use mesh_voxelize::VoxelizeError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors reading a dataset listing.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The listing has no header row.
    #[error("dataset listing is empty")]
    EmptyListing,

    /// The id column is missing from the header.
    #[error("dataset listing has no `{column}` column")]
    MissingColumn {
        /// Requested id column.
        column: String,
    },

    /// A row could not be parsed.
    #[error("malformed dataset row at line {line}: {reason}")]
    MalformedRow {
        /// 1-based line where the row starts.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// I/O error reading the listing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    /// Creates a malformed row error.
    #[must_use]
    pub fn malformed_row(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            reason: reason.into(),
        }
    }
}

/// Errors that abort a pipeline run.
///
/// Variants raised while entries are being aggregated carry `processed`,
/// the number of entries aggregated before the failure. Per-entry problems
/// that do not abort the run are reported in
/// [`RunReport::skipped`](crate::RunReport::skipped) instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration is unusable.
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),

    /// The dataset listing could not be read.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// A mesh failed to load and the run aborts on load failures.
    #[error("failed to load entry {id} after {processed} aggregated: {source}")]
    Load {
        /// Entry that failed.
        id: String,
        /// Entries aggregated before the failure.
        processed: usize,
        /// Final load error.
        #[source]
        source: IoError,
    },

    /// Rasterization failed for a reason other than a degenerate surface.
    #[error("failed to rasterize entry {id} after {processed} aggregated: {source}")]
    Rasterize {
        /// Entry that failed.
        id: String,
        /// Entries aggregated before the failure.
        processed: usize,
        /// Rasterizer error.
        #[source]
        source: VoxelizeError,
    },

    /// A volume did not match the accumulated shape.
    #[error("shape mismatch after {processed} aggregated: {source}")]
    ShapeMismatch {
        /// Entries aggregated before the failure.
        processed: usize,
        /// Aggregator error.
        #[source]
        source: VolumeError,
    },

    /// A volume could not be written.
    #[error("failed to persist {path} after {processed} aggregated: {source}")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Entries aggregated before the failure.
        processed: usize,
        /// Volume error.
        #[source]
        source: VolumeError,
    },

    /// The reconstructed surface could not be written.
    #[error("failed to export surface to {path}: {source}")]
    Export {
        /// Destination path.
        path: PathBuf,
        /// Writer error.
        #[source]
        source: IoError,
    },

    /// The run was cancelled; no mean was produced.
    #[error("cancelled after {processed} aggregated")]
    Cancelled {
        /// Entries aggregated before cancellation.
        processed: usize,
    },

    /// Every entry was skipped.
    #[error("no entries aggregated ({skipped} skipped)")]
    NothingAggregated {
        /// Entries skipped.
        skipped: usize,
    },

    /// Surface reconstruction failed.
    #[error("reconstruction failed: {0}")]
    Reconstruct(#[from] IsoError),
}

impl PipelineError {
    /// Creates an invalid config error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Entries aggregated before the run aborted, if the error happened
    /// during aggregation.
    #[must_use]
    pub const fn processed(&self) -> Option<usize> {
        match self {
            Self::Load { processed, .. }
            | Self::Rasterize { processed, .. }
            | Self::ShapeMismatch { processed, .. }
            | Self::Persist { processed, .. }
            | Self::Cancelled { processed } => Some(*processed),
            _ => None,
        }
    }
}
