//! Per-run bookkeeping.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why an entry was left out of the mean.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SkipReason {
    /// The mesh could not be loaded (after retries).
    Load(String),
    /// The mesh is empty, open or encloses no volume.
    DegenerateSurface(String),
    /// The id cannot name a file inside the mesh or cache directory.
    InvalidId(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(reason) => write!(f, "load failed: {reason}"),
            Self::DegenerateSurface(reason) => write!(f, "degenerate surface: {reason}"),
            Self::InvalidId(reason) => write!(f, "invalid id: {reason}"),
        }
    }
}

/// An entry excluded from the mean.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkippedEntry {
    /// Entry id.
    pub id: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Outcome of aggregating a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunReport {
    /// Entries aggregated into the mean.
    pub processed: usize,
    /// Of those, entries whose volume came from the cache.
    pub cached: usize,
    /// Entries left out, in dataset order.
    pub skipped: Vec<SkippedEntry>,
    /// Repeated ids that were ignored.
    pub duplicates: usize,
}

impl RunReport {
    pub(crate) fn skip(&mut self, id: &str, reason: SkipReason) {
        self.skipped.push(SkippedEntry {
            id: id.to_string(),
            reason,
        });
    }

    /// `true` when every unique entry was aggregated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
