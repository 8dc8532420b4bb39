//! Indexed triangle mesh.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::{Aabb, Triangle};

/// An indexed triangle mesh.
///
/// Vertices and faces are stored separately, with faces referencing
/// vertices by index. Faces use counter-clockwise winding when viewed from
/// outside, so normals point outward.
///
/// A mesh read from disk is immutable in practice: loaders build it once,
/// the rasterizer only borrows it.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Point3};
///
/// let mesh = IndexedMesh::from_parts(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// );
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Triangle faces as indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create an empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and triangle faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Point3<f64>>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangle faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// `true` when the mesh has no vertices or no faces.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Append a polygon face, fan-triangulating it around its first corner.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::PolygonTooSmall`] for fewer than three corners and
    /// [`MeshError::IndexOutOfRange`] if any corner does not name an existing
    /// vertex. The mesh is left untouched on error.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, Point3};
    ///
    /// let mut mesh = IndexedMesh::new();
    /// for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.5, 1.0), (0.5, 1.5), (-0.5, 1.0)] {
    ///     mesh.vertices.push(Point3::new(x, y, 0.0));
    /// }
    /// mesh.push_polygon(&[0, 1, 2, 3, 4]).unwrap();
    /// assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    /// ```
    pub fn push_polygon(&mut self, corners: &[u32]) -> MeshResult<()> {
        if corners.len() < 3 {
            return Err(MeshError::PolygonTooSmall {
                corners: corners.len(),
            });
        }
        if let Some(&index) = corners
            .iter()
            .find(|&&i| i as usize >= self.vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: self.vertices.len(),
            });
        }

        let anchor = corners[0];
        self.faces.extend(
            corners[1..]
                .windows(2)
                .map(|pair| [anchor, pair[0], pair[1]]),
        );
        Ok(())
    }

    /// Index of the first face referencing a missing vertex, if any.
    #[must_use]
    pub fn first_invalid_face(&self) -> Option<usize> {
        let n = self.vertices.len();
        self.faces
            .iter()
            .position(|face| face.iter().any(|&i| i as usize >= n))
    }

    /// Iterate over faces with resolved positions.
    ///
    /// Faces with out-of-range indices are skipped; call
    /// [`first_invalid_face`](Self::first_invalid_face) first when that matters.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().filter_map(|&[a, b, c]| {
            Some(Triangle::new(
                *self.vertices.get(a as usize)?,
                *self.vertices.get(b as usize)?,
                *self.vertices.get(c as usize)?,
            ))
        })
    }

    /// Axis-aligned bounds of all vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Number of undirected edges not shared by exactly two faces.
    ///
    /// Zero for a closed two-manifold surface. Edges used once are holes,
    /// edges used three or more times are non-manifold fins.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        let mut uses: HashMap<(u32, u32), u32> = HashMap::with_capacity(self.faces.len() * 3 / 2);
        for &[a, b, c] in &self.faces {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *uses.entry((u.min(v), u.max(v))).or_insert(0) += 1;
            }
        }
        uses.values().filter(|&&count| count != 2).count()
    }

    /// `true` for a non-empty mesh with valid indices and no boundary edges.
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        !self.is_empty() && self.first_invalid_face().is_none() && self.boundary_edge_count() == 0
    }

    /// Signed enclosed volume (positive for outward-facing winding).
    ///
    /// Only meaningful for closed meshes.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|tri| tri.signed_volume_from_origin())
            .sum()
    }

    /// Absolute enclosed volume.
    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }

    /// Multiply every vertex z coordinate by `factor`.
    pub fn scale_z(&mut self, factor: f64) {
        for vertex in &mut self.vertices {
            vertex.z *= factor;
        }
    }

    /// Reverse the winding of every face.
    pub fn flip_winding(&mut self) {
        for face in &mut self.faces {
            face.swap(1, 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::axis_aligned_box;
    use approx::assert_relative_eq;

    fn unit_box() -> IndexedMesh {
        axis_aligned_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn empty_mesh() {
        let mesh = IndexedMesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.bounds().is_empty());
        assert!(!mesh.is_watertight());
    }

    #[test]
    fn push_polygon_rejects_small() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Point3::origin());
        mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));

        assert_eq!(
            mesh.push_polygon(&[0, 1]),
            Err(MeshError::PolygonTooSmall { corners: 2 })
        );
        assert!(mesh.faces.is_empty());
    }

    #[test]
    fn push_polygon_rejects_out_of_range() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Point3::origin());
        mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.0, 1.0, 0.0));

        let err = mesh.push_polygon(&[0, 1, 7]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            }
        );
        assert!(mesh.faces.is_empty());
    }

    #[test]
    fn first_invalid_face_found() {
        let mut mesh = unit_box();
        assert_eq!(mesh.first_invalid_face(), None);

        mesh.faces.push([0, 1, 99]);
        assert_eq!(mesh.first_invalid_face(), Some(12));
        assert!(!mesh.is_watertight());
    }

    #[test]
    fn box_is_watertight() {
        let mesh = unit_box();
        assert_eq!(mesh.boundary_edge_count(), 0);
        assert!(mesh.is_watertight());
    }

    #[test]
    fn removing_face_opens_surface() {
        let mut mesh = unit_box();
        mesh.faces.pop();
        assert_eq!(mesh.boundary_edge_count(), 3);
        assert!(!mesh.is_watertight());
    }

    #[test]
    fn box_volume_positive() {
        let mesh = unit_box();
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-12);

        let mut flipped = mesh.clone();
        flipped.flip_winding();
        assert_relative_eq!(flipped.signed_volume(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(flipped.volume(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn translate_and_scale_z() {
        let mut mesh = unit_box();
        mesh.translate(Vector3::new(1.0, 2.0, 3.0));
        mesh.scale_z(2.0);

        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min.x, 1.0);
        assert_relative_eq!(bounds.min.y, 2.0);
        assert_relative_eq!(bounds.min.z, 6.0);
        assert_relative_eq!(bounds.max.z, 8.0);
    }
}
