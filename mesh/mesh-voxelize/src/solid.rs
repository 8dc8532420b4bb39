//! Point-in-solid queries along +x rays.
//!
//! Every query point `(x, y, z)` is classified from the ray that starts at
//! `x = -inf` on the row `(y, z)`. Triangles are projected onto the
//! `(y, z)` plane; a triangle is crossed when its projection contains the
//! row point. Points on a projected edge or vertex are assigned to exactly
//! one of the triangles sharing it (top-left ownership on the
//! counter-clockwise projection), so rays through edges and vertices of a
//! closed surface keep the correct crossing parity.
//!
//! A point is inside when an odd number of crossings lie below its x and it
//! is not on the surface. On-surface means a crossing within `tolerance`
//! along x, or contact with a triangle the ray only grazes (an edge it
//! touches, or a face it runs along).

use mesh_types::{IndexedMesh, Point3};

type P2 = (f64, f64);

/// Orientation of `p` relative to the directed segment `u -> v`.
#[inline]
#[allow(clippy::suboptimal_flops)]
fn orient(u: P2, v: P2, p: P2) -> f64 {
    (v.0 - u.0) * (p.1 - u.1) - (v.1 - u.1) * (p.0 - u.0)
}

/// Edge function with exact antisymmetry: `edge(u, v, p) == -edge(v, u, p)`.
///
/// Shared edges of adjacent triangles therefore agree bit for bit.
#[inline]
fn edge(u: P2, v: P2, p: P2) -> f64 {
    if u <= v { orient(u, v, p) } else { -orient(v, u, p) }
}

/// Top-left rule: which triangle owns points lying exactly on `u -> v`.
#[inline]
fn owns_edge(u: P2, v: P2) -> bool {
    let (ds, dt) = (v.0 - u.0, v.1 - u.1);
    dt < 0.0 || (dt == 0.0 && ds < 0.0)
}

#[inline]
fn project(p: &Point3<f64>) -> P2 {
    (p.y, p.z)
}

/// A triangle prepared for row queries.
#[derive(Debug, Clone, Copy)]
struct RowTriangle {
    /// Corners, reordered so the projection is counter-clockwise.
    corners: [Point3<f64>; 3],
    /// Projection has zero area: the ray can only graze it.
    flat: bool,
    y_range: (f64, f64),
    z_range: (f64, f64),
}

impl RowTriangle {
    fn new(mut corners: [Point3<f64>; 3]) -> Self {
        let [a, b, c] = corners.map(|p| project(&p));
        let area = edge(a, b, c);
        if area < 0.0 {
            corners.swap(1, 2);
        }
        let span = |f: fn(&Point3<f64>) -> f64| {
            corners
                .iter()
                .map(f)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                })
        };
        Self {
            corners,
            flat: area == 0.0,
            y_range: span(|p| p.y),
            z_range: span(|p| p.z),
        }
    }

    fn spans_z(&self, z: f64, tolerance: f64) -> bool {
        self.z_range.0 - tolerance <= z && z <= self.z_range.1 + tolerance
    }

    fn spans_y(&self, y: f64, tolerance: f64) -> bool {
        self.y_range.0 - tolerance <= y && y <= self.y_range.1 + tolerance
    }

    /// X of the ray crossing, if the projection owns the row point.
    fn crossing(&self, p: P2) -> Option<f64> {
        if self.flat {
            return None;
        }
        let [a, b, c] = self.corners;
        let (pa, pb, pc) = (project(&a), project(&b), project(&c));

        let mut weights = [0.0; 3];
        for (w, (u, v)) in weights.iter_mut().zip([(pb, pc), (pc, pa), (pa, pb)]) {
            let e = edge(u, v, p);
            if e < 0.0 || (e == 0.0 && !owns_edge(u, v)) {
                return None;
            }
            *w = e;
        }
        let sum = weights[0] + weights[1] + weights[2];
        if sum <= 0.0 {
            return None;
        }
        Some((weights[0] * a.x + weights[1] * b.x + weights[2] * c.x) / sum)
    }

    /// X-interval of the triangle's edges passing within `tolerance` of
    /// the row, or `None` if the ray does not graze this triangle.
    fn contact(&self, p: P2, tolerance: f64) -> Option<(f64, f64)> {
        let tol2 = tolerance * tolerance;
        let [a, b, c] = self.corners;
        let mut range: Option<(f64, f64)> = None;
        let mut include = |x: f64| {
            range = Some(range.map_or((x, x), |(lo, hi)| (lo.min(x), hi.max(x))));
        };

        for (u3, v3) in [(a, b), (b, c), (c, a)] {
            let (u, v) = (project(&u3), project(&v3));
            let d = (v.0 - u.0, v.1 - u.1);
            let len2 = d.0 * d.0 + d.1 * d.1;
            let dist2 = |q: P2| (p.0 - q.0) * (p.0 - q.0) + (p.1 - q.1) * (p.1 - q.1);

            if len2 <= tol2 {
                // Edge runs along x: the whole edge is on the row.
                if dist2(u) <= tol2 {
                    include(u3.x);
                    include(v3.x);
                }
                continue;
            }
            let t = (((p.0 - u.0) * d.0 + (p.1 - u.1) * d.1) / len2).clamp(0.0, 1.0);
            let q = (u.0 + t * d.0, u.1 + t * d.1);
            if dist2(q) <= tol2 {
                include(u3.x + t * (v3.x - u3.x));
            }
        }
        range.map(|(lo, hi)| (lo - tolerance, hi + tolerance))
    }
}

/// Inside/outside oracle for a closed triangle surface.
///
/// # Example
///
/// ```
/// use mesh_types::{shapes::axis_aligned_box, Point3};
/// use mesh_voxelize::SolidQuery;
///
/// let cube = axis_aligned_box(Point3::origin(), Point3::new(2.0, 2.0, 2.0));
/// let query = SolidQuery::new(&cube, 1e-6);
///
/// assert!(query.contains(&Point3::new(1.0, 1.0, 1.0)));
/// assert!(!query.contains(&Point3::new(3.0, 1.0, 1.0)));
/// // On the surface counts as outside.
/// assert!(!query.contains(&Point3::new(0.0, 1.0, 1.0)));
/// ```
#[derive(Debug, Clone)]
pub struct SolidQuery {
    triangles: Vec<RowTriangle>,
    tolerance: f64,
}

/// Crossings and surface contacts along one row.
#[derive(Debug, Clone, Default)]
pub struct RowHits {
    /// Sorted x of every crossing.
    pub crossings: Vec<f64>,
    /// X-intervals where the ray touches the surface without crossing it.
    pub contacts: Vec<(f64, f64)>,
}

impl RowHits {
    fn clear(&mut self) {
        self.crossings.clear();
        self.contacts.clear();
    }

    /// `true` if the row has no crossings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty()
    }
}

impl SolidQuery {
    /// Prepare `mesh` for queries. Faces with invalid indices are ignored.
    #[must_use]
    pub fn new(mesh: &IndexedMesh, tolerance: f64) -> Self {
        let triangles = mesh
            .triangles()
            .map(|t| RowTriangle::new([t.v0, t.v1, t.v2]))
            .collect();
        Self {
            triangles,
            tolerance,
        }
    }

    /// Number of prepared triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// `true` if `point` lies strictly inside the solid.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let all: Vec<usize> = (0..self.triangles.len()).collect();
        let mut hits = RowHits::default();
        self.row_hits(point.y, point.z, &all, &mut hits);
        self.classify(&hits, point.x)
    }

    /// Indices of triangles that can affect rows at height `z`.
    pub fn plane_candidates(&self, z: f64, out: &mut Vec<usize>) {
        out.clear();
        out.extend(
            self.triangles
                .iter()
                .enumerate()
                .filter(|(_, t)| t.spans_z(z, self.tolerance))
                .map(|(i, _)| i),
        );
    }

    /// Collect crossings and contacts of the row `(y, z)` against
    /// `candidates` (from [`plane_candidates`](Self::plane_candidates)).
    pub fn row_hits(&self, y: f64, z: f64, candidates: &[usize], hits: &mut RowHits) {
        hits.clear();
        let p = (y, z);
        for tri in candidates.iter().filter_map(|&i| self.triangles.get(i)) {
            if !tri.spans_y(y, self.tolerance) {
                continue;
            }
            if let Some(x) = tri.crossing(p) {
                hits.crossings.push(x);
            }
            if let Some(interval) = tri.contact(p, self.tolerance) {
                hits.contacts.push(interval);
            }
        }
        hits.crossings.sort_unstable_by(f64::total_cmp);
    }

    /// Classify the point at `x` on a row with precomputed `hits`.
    #[must_use]
    pub fn classify(&self, hits: &RowHits, x: f64) -> bool {
        let crossings = &hits.crossings;
        let below = crossings.partition_point(|&c| c < x);
        if below % 2 == 0 {
            return false;
        }
        let near = |i: usize| {
            crossings
                .get(i)
                .is_some_and(|&c| (c - x).abs() <= self.tolerance)
        };
        if near(below) || near(below - 1) {
            return false;
        }
        !hits
            .contacts
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&x))
    }
}
