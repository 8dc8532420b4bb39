//! Legacy VTK polydata support.
//!
//! Segmented nuclei are stored one mesh per file in the legacy `.vtk`
//! format. The reader understands:
//!
//! - `ASCII` and `BINARY` (big-endian) encodings
//! - `DATASET POLYDATA` with `POINTS` of type `float` or `double`
//! - `POLYGONS` and `TRIANGLE_STRIPS`, both in the classic count-prefixed
//!   layout and the 5.x `OFFSETS`/`CONNECTIVITY` layout
//!
//! Polygons with more than three corners are fan-triangulated. `VERTICES`
//! and `LINES` cells are skipped, as are `METADATA` blocks. Attribute
//! sections (`POINT_DATA`, `CELL_DATA`, `FIELD`) end the geometry and are
//! ignored.
//!
//! ```text
//! # vtk DataFile Version 3.0
//! nucleus 17
//! ASCII
//! DATASET POLYDATA
//! POINTS 4 float
//! 0 0 0  1 0 0  0 1 0  0 0 1
//! POLYGONS 4 16
//! 3 0 2 1
//! 3 0 1 3
//! 3 0 3 2
//! 3 1 2 3
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Point3};
use tracing::debug;

use crate::error::{IoError, IoResult, read_file};

/// Data encoding declared on the third header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Binary,
}

/// Connectivity section kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Polygons,
    Strips,
    Ignored,
}

/// Load a mesh from a legacy VTK polydata file.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, not a polydata
/// file, or references vertices that do not exist.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_vtk;
///
/// let nucleus = load_vtk("meshes/17.vtk").unwrap();
/// assert!(nucleus.is_watertight());
/// ```
pub fn load_vtk<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let bytes = read_file(path.as_ref())?;
    let mesh = parse_vtk(&bytes)?;
    debug!(
        path = %path.as_ref().display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "loaded VTK"
    );
    Ok(mesh)
}

/// Parse legacy VTK polydata already held in memory.
///
/// # Errors
///
/// See [`load_vtk`].
pub fn parse_vtk(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let mut cursor = Cursor::new(bytes);

    let version = cursor.line()?;
    if !version.starts_with("# vtk DataFile") {
        return Err(IoError::invalid_content("missing '# vtk DataFile' header"));
    }
    let _title = cursor.line()?;
    let encoding = match cursor.line()?.trim().to_ascii_uppercase().as_str() {
        "ASCII" => Encoding::Ascii,
        "BINARY" => Encoding::Binary,
        other => {
            return Err(IoError::invalid_content(format!(
                "unknown encoding '{other}'"
            )));
        }
    };

    cursor.expect_keyword("DATASET")?;
    let dataset = cursor.token()?;
    if !dataset.eq_ignore_ascii_case("POLYDATA") {
        return Err(IoError::invalid_content(format!(
            "unsupported dataset '{dataset}', expected POLYDATA"
        )));
    }

    let mut mesh = IndexedMesh::new();
    while let Some(keyword) = cursor.next_token() {
        match keyword.to_ascii_uppercase().as_str() {
            "POINTS" => read_points(&mut cursor, encoding, &mut mesh)?,
            "POLYGONS" => read_cells(&mut cursor, encoding, CellKind::Polygons, &mut mesh)?,
            "TRIANGLE_STRIPS" => read_cells(&mut cursor, encoding, CellKind::Strips, &mut mesh)?,
            "VERTICES" | "LINES" => {
                read_cells(&mut cursor, encoding, CellKind::Ignored, &mut mesh)?;
            }
            "METADATA" => cursor.skip_block(),
            _ => break,
        }
    }

    if mesh.vertices.is_empty() {
        return Err(IoError::invalid_content("no POINTS section"));
    }
    Ok(mesh)
}

fn read_points(
    cursor: &mut Cursor<'_>,
    encoding: Encoding,
    mesh: &mut IndexedMesh,
) -> IoResult<()> {
    let count = cursor.count()?;
    let scalar = Scalar::parse(cursor.token()?)?;
    let coordinates = count
        .checked_mul(3)
        .ok_or_else(|| IoError::invalid_content(format!("point count {count} is too large")))?;
    let values = read_numbers(cursor, encoding, scalar, coordinates)?;

    mesh.vertices.reserve(values.len() / 3);
    mesh.vertices.extend(
        values
            .chunks_exact(3)
            .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2])),
    );
    Ok(())
}

fn read_cells(
    cursor: &mut Cursor<'_>,
    encoding: Encoding,
    kind: CellKind,
    mesh: &mut IndexedMesh,
) -> IoResult<()> {
    let first = cursor.count()?;
    let second = cursor.count()?;

    let modern = cursor
        .peek_token()
        .is_some_and(|t| t.eq_ignore_ascii_case("OFFSETS"));
    let cells: Vec<Vec<u32>> = if modern {
        // 5.x layout: `first` offsets then `second` connectivity entries.
        cursor.token()?;
        let offset_type = Scalar::parse(cursor.token()?)?;
        let offsets = read_indices(cursor, encoding, offset_type, first)?;
        cursor.expect_keyword("CONNECTIVITY")?;
        let conn_type = Scalar::parse(cursor.token()?)?;
        let connectivity = read_indices(cursor, encoding, conn_type, second)?;
        split_offsets(&offsets, &connectivity)?
    } else {
        let flat = read_indices(cursor, encoding, Scalar::Int32, second)?;
        split_counted(&flat, first)?
    };

    match kind {
        CellKind::Polygons => {
            for cell in &cells {
                mesh.push_polygon(cell)?;
            }
        }
        CellKind::Strips => {
            for strip in &cells {
                for (i, window) in strip.windows(3).enumerate() {
                    let tri = if i % 2 == 0 {
                        [window[0], window[1], window[2]]
                    } else {
                        [window[1], window[0], window[2]]
                    };
                    mesh.push_polygon(&tri)?;
                }
            }
        }
        CellKind::Ignored => {}
    }
    Ok(())
}

/// Split a classic `n i0 i1 ... n i0 ...` list into `cell_count` cells.
fn split_counted(flat: &[u32], cell_count: usize) -> IoResult<Vec<Vec<u32>>> {
    let mut cells = Vec::with_capacity(cell_count.min(flat.len()));
    let mut rest = flat;
    for _ in 0..cell_count {
        let (&n, tail) = rest
            .split_first()
            .ok_or_else(|| IoError::invalid_content("cell list shorter than declared"))?;
        let n = n as usize;
        if tail.len() < n {
            return Err(IoError::invalid_content("cell list shorter than declared"));
        }
        cells.push(tail[..n].to_vec());
        rest = &tail[n..];
    }
    Ok(cells)
}

fn split_offsets(offsets: &[u32], connectivity: &[u32]) -> IoResult<Vec<Vec<u32>>> {
    offsets
        .windows(2)
        .map(|w| {
            let (start, end) = (w[0] as usize, w[1] as usize);
            connectivity
                .get(start..end)
                .map(<[u32]>::to_vec)
                .ok_or_else(|| IoError::invalid_content("cell offsets out of range"))
        })
        .collect()
}

/// Numeric element type named in a section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Float32,
    Float64,
    Int32,
    Int64,
}

impl Scalar {
    fn parse(name: &str) -> IoResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "float" | "vtktypefloat32" => Ok(Self::Float32),
            "double" | "vtktypefloat64" => Ok(Self::Float64),
            "int" | "vtktypeint32" => Ok(Self::Int32),
            "long" | "vtkidtype" | "vtktypeint64" => Ok(Self::Int64),
            other => Err(IoError::invalid_content(format!(
                "unsupported data type '{other}'"
            ))),
        }
    }

    /// Bytes taken by `count` binary values.
    fn byte_len(self, count: usize) -> IoResult<usize> {
        count.checked_mul(self.width()).ok_or_else(|| {
            IoError::invalid_content(format!("element count {count} is too large"))
        })
    }

    const fn width(self) -> usize {
        match self {
            Self::Float32 | Self::Int32 => 4,
            Self::Float64 | Self::Int64 => 8,
        }
    }
}

fn read_numbers(
    cursor: &mut Cursor<'_>,
    encoding: Encoding,
    scalar: Scalar,
    count: usize,
) -> IoResult<Vec<f64>> {
    match encoding {
        Encoding::Ascii => (0..count)
            .map(|_| cursor.token()?.parse::<f64>().map_err(IoError::from))
            .collect(),
        Encoding::Binary => {
            cursor.skip_line();
            let raw = cursor.take(scalar.byte_len(count)?)?;
            #[allow(clippy::cast_precision_loss)]
            // Precision: integer point coordinates are small in practice
            let values = raw
                .chunks_exact(scalar.width())
                .map(|b| match scalar {
                    Scalar::Float32 => f64::from(f32::from_be_bytes([b[0], b[1], b[2], b[3]])),
                    Scalar::Float64 => f64::from_be_bytes(be8(b)),
                    Scalar::Int32 => f64::from(i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
                    Scalar::Int64 => i64::from_be_bytes(be8(b)) as f64,
                })
                .collect();
            Ok(values)
        }
    }
}

fn read_indices(
    cursor: &mut Cursor<'_>,
    encoding: Encoding,
    scalar: Scalar,
    count: usize,
) -> IoResult<Vec<u32>> {
    let to_index = |v: i64| {
        u32::try_from(v).map_err(|_| IoError::invalid_content(format!("invalid index {v}")))
    };
    match encoding {
        Encoding::Ascii => (0..count)
            .map(|_| to_index(cursor.token()?.parse::<i64>()?))
            .collect(),
        Encoding::Binary => {
            cursor.skip_line();
            let raw = cursor.take(scalar.byte_len(count)?)?;
            raw.chunks_exact(scalar.width())
                .map(|b| match scalar {
                    Scalar::Int32 => {
                        to_index(i64::from(i32::from_be_bytes([b[0], b[1], b[2], b[3]])))
                    }
                    Scalar::Int64 => to_index(i64::from_be_bytes(be8(b))),
                    Scalar::Float32 | Scalar::Float64 => {
                        Err(IoError::invalid_content("floating-point cell indices"))
                    }
                })
                .collect()
        }
    }
}

fn be8(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// Byte cursor mixing whitespace-delimited tokens with raw binary reads.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn eof(&self) -> IoError {
        IoError::UnexpectedEof { position: self.pos }
    }

    /// Next line without its terminator.
    fn line(&mut self) -> IoResult<&'a str> {
        if self.pos >= self.data.len() {
            return Err(self.eof());
        }
        let data = self.data;
        let rest = &data[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        let line = &rest[..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        std::str::from_utf8(line).map_err(|_| IoError::invalid_content("header is not UTF-8"))
    }

    fn skip_whitespace(&mut self) {
        while self.data.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let data = self.data;
        let rest = &data[self.pos..];
        let len = rest
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        std::str::from_utf8(&rest[..len]).ok()
    }

    fn token(&mut self) -> IoResult<&'a str> {
        self.next_token().ok_or_else(|| self.eof())
    }

    fn peek_token(&mut self) -> Option<&'a str> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }

    fn count(&mut self) -> IoResult<usize> {
        Ok(self.token()?.parse::<usize>()?)
    }

    fn expect_keyword(&mut self, keyword: &str) -> IoResult<()> {
        let token = self.token()?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(IoError::invalid_content(format!(
                "expected {keyword}, found '{token}'"
            )))
        }
    }

    /// Consume the remainder of the current line, including the newline.
    fn skip_line(&mut self) {
        let rest = &self.data[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n').map_or(rest.len(), |i| i + 1);
        self.pos += end;
    }

    /// Skip lines up to and including the next blank one.
    fn skip_block(&mut self) {
        self.skip_line();
        while self.pos < self.data.len() {
            let start = self.pos;
            self.skip_line();
            if self.data[start..self.pos].iter().all(u8::is_ascii_whitespace) {
                break;
            }
        }
    }

    fn take(&mut self, len: usize) -> IoResult<&'a [u8]> {
        let data = self.data;
        let end = self.pos.checked_add(len).ok_or_else(|| self.eof())?;
        let slice = data.get(self.pos..end).ok_or_else(|| self.eof())?;
        self.pos = end;
        Ok(slice)
    }
}

/// Save a mesh as ASCII legacy VTK polydata.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_vtk<P: AsRef<Path>>(mesh: &IndexedMesh, path: P) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_vtk(mesh, &mut writer)?;
    writer.flush()?;
    debug!(
        path = %path.as_ref().display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "saved VTK"
    );
    Ok(())
}

fn write_vtk<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "mesh-io export")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET POLYDATA")?;
    writeln!(writer, "POINTS {} double", mesh.vertex_count())?;
    for v in &mesh.vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    writeln!(
        writer,
        "POLYGONS {} {}",
        mesh.face_count(),
        mesh.face_count() * 4
    )?;
    for [a, b, c] in &mesh.faces {
        writeln!(writer, "3 {a} {b} {c}")?;
    }
    Ok(())
}
