//! NumPy `.npy` persistence.
//!
//! Volumes are written as version 1.0 files with shape `(nz, ny, nx)` in C
//! order, which is exactly the in-memory layout. Occupancy volumes use
//! `|u1`, mean volumes `<f8`. The reader also accepts version 2.0 headers
//! and `|b1` boolean masks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{VolumeError, VolumeResult};
use crate::{INSIDE, MeanVolume, OUTSIDE, OccupancyVolume, VolumeShape};

const MAGIC: &[u8] = b"\x93NUMPY";

/// Header alignment required by the format.
const ALIGN: usize = 64;

fn write_npy(path: &Path, descr: &str, shape: VolumeShape, data: &[u8]) -> VolumeResult<()> {
    let mut header = format!(
        "{{'descr': '{descr}', 'fortran_order': False, 'shape': ({}, {}, {}), }}",
        shape.nz, shape.ny, shape.nx
    );
    // Preamble is magic + 2 version bytes + 2 length bytes; pad so data starts aligned.
    let preamble = MAGIC.len() + 4;
    let unpadded = preamble + header.len() + 1;
    let padded = unpadded.div_ceil(ALIGN) * ALIGN;
    header.extend(std::iter::repeat_n(' ', padded - unpadded));
    header.push('\n');

    let header_len = u16::try_from(header.len())
        .map_err(|_| VolumeError::invalid_npy("header too long for version 1.0"))?;

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(header.as_bytes())?;
    writer.write_all(data)?;
    writer.flush()?;
    debug!(path = %path.display(), descr, shape = %shape, "saved npy");
    Ok(())
}

/// Parsed header and payload of an `.npy` file.
struct NpyArray {
    descr: String,
    shape: VolumeShape,
    data: Vec<u8>,
}

fn read_npy(path: &Path) -> VolumeResult<NpyArray> {
    let bytes = std::fs::read(path)?;
    if !bytes.starts_with(MAGIC) || bytes.len() < MAGIC.len() + 4 {
        return Err(VolumeError::invalid_npy("missing magic string"));
    }
    let major = bytes[MAGIC.len()];
    let (header_len, header_start) = match major {
        1 => (
            usize::from(u16::from_le_bytes([bytes[8], bytes[9]])),
            10,
        ),
        2 | 3 => {
            let raw = bytes
                .get(8..12)
                .ok_or_else(|| VolumeError::invalid_npy("truncated header length"))?;
            (
                u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize,
                12,
            )
        }
        v => return Err(VolumeError::invalid_npy(format!("unsupported version {v}"))),
    };
    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or_else(|| VolumeError::invalid_npy("truncated or non-text header"))?;

    let descr = dict_value(header, "descr")?
        .trim_matches(|c| c == '\'' || c == '"')
        .to_string();
    if dict_value(header, "fortran_order")? != "False" {
        return Err(VolumeError::invalid_npy("fortran-ordered arrays are not supported"));
    }
    let shape = parse_shape(dict_value(header, "shape")?)?;

    let data = bytes[data_start..].to_vec();
    Ok(NpyArray { descr, shape, data })
}

/// Raw text of the value stored under `key` in the header dictionary.
fn dict_value<'a>(header: &'a str, key: &str) -> VolumeResult<&'a str> {
    let quoted = format!("'{key}'");
    let start = header
        .find(&quoted)
        .ok_or_else(|| VolumeError::invalid_npy(format!("header has no '{key}'")))?
        + quoted.len();
    let rest = header[start..].trim_start().trim_start_matches(':').trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')').map(|i| i + 1)
    } else {
        rest.find([',', '}'])
    }
    .ok_or_else(|| VolumeError::invalid_npy(format!("unterminated '{key}'")))?;
    Ok(rest[..end].trim())
}

fn parse_shape(text: &str) -> VolumeResult<VolumeShape> {
    let dims = text
        .trim_matches(|c| c == '(' || c == ')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| VolumeError::invalid_npy(format!("bad dimension '{s}'")))
        })
        .collect::<VolumeResult<Vec<_>>>()?;
    match dims[..] {
        [nz, ny, nx] => {
            let shape = VolumeShape::new(nx, ny, nz);
            // Payload sizes up to `<f8` must be addressable.
            if shape.checked_len().and_then(|n| n.checked_mul(8)).is_none() {
                return Err(VolumeError::invalid_npy(format!("shape {text} is too large")));
            }
            Ok(shape)
        }
        _ => Err(VolumeError::invalid_npy(format!(
            "expected a 3-dimensional array, got shape {text}"
        ))),
    }
}

impl OccupancyVolume {
    /// Save as a `|u1` array of shape `(nz, ny, nx)`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Io`] if the file cannot be written.
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        write_npy(path.as_ref(), "|u1", self.shape, &self.voxels)
    }

    /// Load a `|u1` or `|b1` array of shape `(nz, ny, nx)`.
    ///
    /// Boolean `true` becomes [`INSIDE`].
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidNpy`] for an unsupported dtype, order or
    /// rank, and [`VolumeError::LengthMismatch`] for a truncated payload.
    pub fn load_npy<P: AsRef<Path>>(path: P) -> VolumeResult<Self> {
        let array = read_npy(path.as_ref())?;
        let voxels = match array.descr.as_str() {
            "|u1" | "<u1" | "u1" => array.data,
            "|b1" | "b1" => array
                .data
                .into_iter()
                .map(|b| if b == 0 { OUTSIDE } else { INSIDE })
                .collect(),
            other => {
                return Err(VolumeError::invalid_npy(format!(
                    "dtype {other} is not an occupancy mask"
                )));
            }
        };
        Self::from_raw(array.shape, truncate_exact(voxels, array.shape.len())?)
    }
}

impl MeanVolume {
    /// Save as a `<f8` array of shape `(nz, ny, nx)`.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Io`] if the file cannot be written.
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        let data: Vec<u8> = self
            .as_slice()
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        write_npy(path.as_ref(), "<f8", self.shape(), &data)
    }

    /// Load a `<f8` array of shape `(nz, ny, nx)`.
    ///
    /// The loaded volume reports a `sample_count` of zero.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::InvalidNpy`] for an unsupported dtype, order or
    /// rank, and [`VolumeError::LengthMismatch`] for a truncated payload.
    pub fn load_npy<P: AsRef<Path>>(path: P) -> VolumeResult<Self> {
        let array = read_npy(path.as_ref())?;
        if array.descr != "<f8" {
            return Err(VolumeError::invalid_npy(format!(
                "dtype {} is not little-endian float64",
                array.descr
            )));
        }
        let byte_len = array
            .shape
            .checked_len()
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| VolumeError::invalid_npy("shape is too large"))?;
        let bytes = truncate_exact(array.data, byte_len)?;
        let values = bytes
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect();
        Self::from_raw(array.shape, values, 0)
    }
}

/// Drop trailing bytes beyond `len`; fail if fewer are present.
fn truncate_exact(mut data: Vec<u8>, len: usize) -> VolumeResult<Vec<u8>> {
    if data.len() < len {
        return Err(VolumeError::LengthMismatch {
            expected: len,
            actual: data.len(),
        });
    }
    data.truncate(len);
    Ok(data)
}
