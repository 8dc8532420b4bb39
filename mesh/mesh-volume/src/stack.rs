//! Image-stack export: one 8-bit binary PGM per z-plane.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::VolumeResult;
use crate::{MeanVolume, OccupancyVolume, VolumeShape};

/// Write `plane_count` P5 images named `{prefix}_{z:04}.pgm` into `dir`.
fn write_stack<F>(
    dir: &Path,
    prefix: &str,
    shape: VolumeShape,
    gray: F,
) -> VolumeResult<Vec<PathBuf>>
where
    F: Fn(usize) -> u8,
{
    fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(shape.nz);
    for z in 0..shape.nz {
        let path = dir.join(format!("{prefix}_{z:04}.pgm"));
        let mut writer = BufWriter::new(File::create(&path)?);
        write!(writer, "P5\n{} {}\n255\n", shape.nx, shape.ny)?;
        let start = z * shape.plane_len();
        let pixels: Vec<u8> = (start..start + shape.plane_len()).map(&gray).collect();
        writer.write_all(&pixels)?;
        writer.flush()?;
        paths.push(path);
    }
    debug!(dir = %dir.display(), planes = shape.nz, "saved image stack");
    Ok(paths)
}

impl OccupancyVolume {
    /// Save each z-plane as a binary PGM image, inside voxels white.
    ///
    /// Returns the written paths in plane order.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Io`](crate::VolumeError::Io) if the directory
    /// or a file cannot be written.
    pub fn save_pgm_stack<P: AsRef<Path>>(
        &self,
        dir: P,
        prefix: &str,
    ) -> VolumeResult<Vec<PathBuf>> {
        write_stack(dir.as_ref(), prefix, self.shape, |i| self.voxels[i])
    }
}

impl MeanVolume {
    /// Save each z-plane as a binary PGM image, scaling `[0, 1]` to `0..=255`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Io`](crate::VolumeError::Io) if the directory
    /// or a file cannot be written.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Truncation: value is clamped to 0..=255 before the cast
    pub fn save_pgm_stack<P: AsRef<Path>>(
        &self,
        dir: P,
        prefix: &str,
    ) -> VolumeResult<Vec<PathBuf>> {
        let values = self.as_slice();
        write_stack(dir.as_ref(), prefix, self.shape(), |i| {
            (values[i].clamp(0.0, 1.0) * 255.0).round() as u8
        })
    }
}
