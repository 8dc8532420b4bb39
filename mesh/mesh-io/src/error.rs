//! Error types for mesh I/O operations.

use std::io::ErrorKind;
use std::path::PathBuf;

use mesh_types::MeshError;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during mesh I/O operations.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Unknown file format (unrecognized extension).
    #[error("unknown file format: .{extension}")]
    UnknownFormat {
        /// The unrecognized extension.
        extension: String,
    },

    /// Invalid file content (parse error).
    #[error("invalid file content: {message}")]
    InvalidContent {
        /// Description of what was invalid.
        message: String,
    },

    /// Unexpected end of file.
    #[error("unexpected end of file at byte {position}")]
    UnexpectedEof {
        /// Byte offset where more data was expected.
        position: usize,
    },

    /// Face data that does not form a valid mesh.
    #[error("invalid mesh data: {0}")]
    Mesh(#[from] MeshError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Float parsing error.
    #[error("float parsing error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// Integer parsing error.
    #[error("integer parsing error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

impl IoError {
    /// Create an `InvalidContent` error with the given message.
    #[must_use]
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }

    /// `true` for storage errors that may succeed when retried.
    ///
    /// Missing files and malformed content are permanent; interrupted or
    /// timed-out reads are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                ErrorKind::Interrupted
                    | ErrorKind::TimedOut
                    | ErrorKind::WouldBlock
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::ResourceBusy
            ),
            _ => false,
        }
    }
}

/// Read a whole file, reporting a missing file as [`IoError::FileNotFound`].
pub(crate) fn read_file(path: &std::path::Path) -> IoResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let timed_out = IoError::Io(std::io::Error::from(ErrorKind::TimedOut));
        assert!(timed_out.is_transient());

        let denied = IoError::Io(std::io::Error::from(ErrorKind::PermissionDenied));
        assert!(!denied.is_transient());

        let missing = IoError::FileNotFound {
            path: PathBuf::from("nucleus.vtk"),
        };
        assert!(!missing.is_transient());
        assert!(!IoError::invalid_content("bad").is_transient());
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = read_file(std::path::Path::new("no_such_mesh_8d1f.vtk")).unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
