//! Where dataset meshes come from.

use std::path::{Path, PathBuf};

use mesh_io::{IoError, IoResult, load_mesh};
use mesh_types::IndexedMesh;

use crate::dataset::DatasetEntry;

/// Loads the surface mesh of a dataset entry.
///
/// Implemented for closures, so tests and in-memory datasets need no
/// files:
///
/// ```
/// use mesh_average::{DatasetEntry, MeshSource};
/// use mesh_io::IoResult;
/// use mesh_types::{shapes::axis_aligned_box, IndexedMesh, Point3};
///
/// let source = |_: &DatasetEntry| -> IoResult<IndexedMesh> {
///     Ok(axis_aligned_box(Point3::origin(), Point3::new(2.0, 2.0, 2.0)))
/// };
/// let mesh = source.load(&DatasetEntry::new("any")).unwrap();
/// assert_eq!(mesh.face_count(), 12);
/// ```
pub trait MeshSource {
    /// Load the mesh for `entry`.
    ///
    /// # Errors
    ///
    /// Returns the loader's error. Errors for which
    /// [`IoError::is_transient`](mesh_io::IoError::is_transient) holds are
    /// retried by the pipeline.
    fn load(&self, entry: &DatasetEntry) -> IoResult<IndexedMesh>;
}

impl<F> MeshSource for F
where
    F: Fn(&DatasetEntry) -> IoResult<IndexedMesh>,
{
    fn load(&self, entry: &DatasetEntry) -> IoResult<IndexedMesh> {
        self(entry)
    }
}

/// Meshes stored as `{root}/{id}.{extension}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMeshSource {
    root: PathBuf,
    extension: String,
}

impl DirectoryMeshSource {
    /// Legacy VTK files under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "vtk".to_string(),
        }
    }

    /// Use files with `extension` (without the dot) instead.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Directory holding the meshes.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the mesh of `entry`.
    #[must_use]
    pub fn path_for(&self, entry: &DatasetEntry) -> PathBuf {
        self.root.join(format!("{}.{}", entry.id, self.extension))
    }
}

impl MeshSource for DirectoryMeshSource {
    fn load(&self, entry: &DatasetEntry) -> IoResult<IndexedMesh> {
        if let Some(problem) = entry.file_stem_problem() {
            return Err(IoError::invalid_content(format!(
                "entry '{}': {problem}",
                entry.id
            )));
        }
        load_mesh(self.path_for(entry))
    }
}
