//! Mesh file I/O for nucleus surfaces.
//!
//! This crate loads segmented nucleus meshes and saves reconstructed
//! surfaces:
//!
//! - **VTK** (legacy polydata) - ASCII and big-endian binary; the input format
//! - **STL** (Stereolithography) - Binary and ASCII; the export format
//!
//! # Format Detection
//!
//! ```no_run
//! use mesh_io::{load_mesh, save_mesh};
//!
//! // Format detected from .vtk extension
//! let nucleus = load_mesh("meshes/17.vtk").unwrap();
//!
//! // Save it as STL
//! save_mesh(&nucleus, "nucleus_17.stl").unwrap();
//! ```
//!
//! # Retrying
//!
//! [`IoError::is_transient`] separates failures worth retrying (interrupted
//! or timed-out reads on network storage) from permanent ones (missing
//! files, malformed content).

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod stl;
mod vtk;

pub use error::{IoError, IoResult};
pub use stl::{load_stl, parse_stl, save_stl};
pub use vtk::{load_vtk, parse_vtk, save_vtk};

use std::path::Path;

use mesh_types::IndexedMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// Legacy VTK polydata.
    Vtk,
    /// STL (Stereolithography), binary or ASCII.
    Stl,
}

impl MeshFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "vtk" => Some(Self::Vtk),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Vtk => "vtk",
            Self::Stl => "stl",
        }
    }
}

fn detect(path: &Path) -> IoResult<MeshFormat> {
    MeshFormat::from_path(path).ok_or_else(|| IoError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string(),
    })
}

/// Load a mesh from a file, detecting format from extension.
///
/// # Errors
///
/// Returns an error if the extension is not recognized, the file cannot be
/// read, or its content is invalid for the detected format.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    match detect(path)? {
        MeshFormat::Vtk => load_vtk(path),
        MeshFormat::Stl => load_stl(path),
    }
}

/// Save a mesh to a file, detecting format from extension.
///
/// STL output is binary.
///
/// # Errors
///
/// Returns an error if the extension is not recognized or the file cannot
/// be written.
pub fn save_mesh<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let path = path.as_ref();
    match detect(path)? {
        MeshFormat::Vtk => save_vtk(mesh, path),
        MeshFormat::Stl => save_stl(mesh, path, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(MeshFormat::from_path("a/17.vtk"), Some(MeshFormat::Vtk));
        assert_eq!(MeshFormat::from_path("mean.STL"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path("mask.npy"), None);
        assert_eq!(MeshFormat::from_path("no_extension"), None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_mesh("surface.obj").unwrap_err();
        assert!(matches!(err, IoError::UnknownFormat { extension } if extension == "obj"));
    }
}
