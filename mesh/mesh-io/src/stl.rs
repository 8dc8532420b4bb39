//! STL (Stereolithography) file format support.
//!
//! STL is the export format for reconstructed mean surfaces. Both ASCII and
//! binary variants are read and written.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count
//! end
//! ```
//!
//! STL stores a triangle soup. The loader welds corners with bit-identical
//! coordinates so a closed surface comes back as a closed indexed mesh.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Triangle, Vector3};
use tracing::debug;

use crate::error::{IoError, IoResult, read_file};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Load a mesh from an STL file.
///
/// Automatically detects ASCII vs binary format.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid STL.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_stl;
///
/// let surface = load_stl("mean_nuc_mesh.stl").unwrap();
/// println!("Loaded {} faces", surface.face_count());
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let bytes = read_file(path.as_ref())?;
    let mesh = parse_stl(&bytes)?;
    debug!(
        path = %path.as_ref().display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "loaded STL"
    );
    Ok(mesh)
}

/// Parse STL content already held in memory.
///
/// # Errors
///
/// Returns an error if the bytes are neither valid ASCII nor binary STL.
pub fn parse_stl(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if bytes.len() < 6 {
        return Err(IoError::invalid_content("file too small to be valid STL"));
    }
    if looks_ascii(bytes) {
        parse_ascii(bytes)
    } else {
        parse_binary(bytes)
    }
}

/// A file is ASCII when it opens with `solid` and its declared binary size
/// does not match the actual length.
fn looks_ascii(bytes: &[u8]) -> bool {
    let starts_solid = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| bytes[start..].starts_with(b"solid"));
    if !starts_solid {
        return false;
    }
    match binary_face_count(bytes) {
        Some(count) => HEADER_SIZE + 4 + count * TRIANGLE_SIZE != bytes.len(),
        None => true,
    }
}

fn binary_face_count(bytes: &[u8]) -> Option<usize> {
    let raw = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
}

fn parse_binary(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let face_count = binary_face_count(bytes).ok_or(IoError::UnexpectedEof {
        position: bytes.len(),
    })?;
    let body = &bytes[HEADER_SIZE + 4..];
    if body.len() < face_count * TRIANGLE_SIZE {
        return Err(IoError::UnexpectedEof {
            position: bytes.len(),
        });
    }

    let mut welder = Welder::with_capacity(face_count);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(face_count) {
        welder.push_triangle([
            read_vertex(&record[12..24]),
            read_vertex(&record[24..36]),
            read_vertex(&record[36..48]),
        ]);
    }
    Ok(welder.finish())
}

/// Read a vertex from 12 bytes (3 little-endian f32s).
fn read_vertex(buf: &[u8]) -> Point3<f64> {
    let coord = |i: usize| {
        f64::from(f32::from_le_bytes([
            buf[i],
            buf[i + 1],
            buf[i + 2],
            buf[i + 3],
        ]))
    };
    Point3::new(coord(0), coord(4), coord(8))
}

fn parse_ascii(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let text = String::from_utf8_lossy(bytes);
    let mut welder = Welder::with_capacity(0);
    let mut corners: Vec<Point3<f64>> = Vec::with_capacity(3);

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        match keyword.to_ascii_lowercase().as_str() {
            "outer" => corners.clear(),
            "vertex" => {
                let mut coord = || -> IoResult<f64> {
                    parts
                        .next()
                        .ok_or_else(|| IoError::invalid_content("vertex needs three coordinates"))?
                        .parse::<f64>()
                        .map_err(IoError::from)
                };
                let p = Point3::new(coord()?, coord()?, coord()?);
                corners.push(p);
            }
            "endfacet" => {
                if let [a, b, c] = corners[..] {
                    welder.push_triangle([a, b, c]);
                } else {
                    return Err(IoError::invalid_content(format!(
                        "facet has {} vertices, expected 3",
                        corners.len()
                    )));
                }
                corners.clear();
            }
            "endsolid" => break,
            _ => {}
        }
    }

    Ok(welder.finish())
}

/// Merges corners with identical coordinates into shared vertices.
struct Welder {
    mesh: IndexedMesh,
    index: HashMap<[u64; 3], u32>,
}

impl Welder {
    fn with_capacity(faces: usize) -> Self {
        Self {
            mesh: IndexedMesh::with_capacity(faces / 2 + 2, faces),
            index: HashMap::with_capacity(faces / 2 + 2),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, meshes with >4B vertices are unsupported
    fn vertex(&mut self, p: Point3<f64>) -> u32 {
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        let vertices = &mut self.mesh.vertices;
        *self.index.entry(key).or_insert_with(|| {
            vertices.push(p);
            (vertices.len() - 1) as u32
        })
    }

    fn push_triangle(&mut self, [a, b, c]: [Point3<f64>; 3]) {
        let face = [self.vertex(a), self.vertex(b), self.vertex(c)];
        self.mesh.faces.push(face);
    }

    fn finish(self) -> IndexedMesh {
        self.mesh
    }
}

/// Save a mesh to an STL file.
///
/// # Arguments
///
/// * `mesh` - The mesh to save
/// * `path` - Output file path
/// * `binary` - If true, write binary STL; otherwise ASCII
///
/// # Errors
///
/// Returns an error if the file cannot be written.
///
/// # Example
///
/// ```no_run
/// use mesh_io::save_stl;
/// use mesh_types::{shapes::axis_aligned_box, Point3};
///
/// let cube = axis_aligned_box(Point3::origin(), Point3::new(4.0, 4.0, 4.0));
/// save_stl(&cube, "cube.stl", true).unwrap();
/// ```
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, binary: bool) -> IoResult<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    if binary {
        write_binary(mesh, &mut writer)?;
    } else {
        write_ascii(mesh, &mut writer)?;
    }
    writer.flush()?;
    debug!(
        path = %path.as_ref().display(),
        faces = mesh.face_count(),
        binary,
        "saved STL"
    );
    Ok(())
}

/// Unit normal, or zero for a degenerate facet.
#[allow(clippy::cast_possible_truncation)]
// Truncation: STL stores f32
fn facet_normal(tri: &Triangle) -> [f32; 3] {
    let n = tri.normal().unwrap_or_else(Vector3::zeros);
    [n.x as f32, n.y as f32, n.z as f32]
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: STL stores f32
fn write_binary<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    let mut header = [0u8; HEADER_SIZE];
    let label = b"binary STL written by mesh-io";
    header[..label.len()].copy_from_slice(label);
    writer.write_all(&header)?;

    let count = u32::try_from(mesh.triangles().count())
        .map_err(|_| IoError::invalid_content("too many faces for binary STL"))?;
    writer.write_all(&count.to_le_bytes())?;

    for tri in mesh.triangles() {
        for value in facet_normal(&tri) {
            writer.write_all(&value.to_le_bytes())?;
        }
        for v in [tri.v0, tri.v1, tri.v2] {
            for value in [v.x as f32, v.y as f32, v.z as f32] {
                writer.write_all(&value.to_le_bytes())?;
            }
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

fn write_ascii<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "solid mesh")?;
    for tri in mesh.triangles() {
        let [nx, ny, nz] = facet_normal(&tri);
        writeln!(writer, "  facet normal {nx:e} {ny:e} {nz:e}")?;
        writeln!(writer, "    outer loop")?;
        for v in [tri.v0, tri.v1, tri.v2] {
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid mesh")?;
    Ok(())
}
