//! Marching tetrahedra over a strided sample lattice.
//!
//! Each lattice cube is split into six tetrahedra around its main diagonal
//! (corner 0 to corner 6). The split is the same for every cube, so faces
//! shared by neighbouring cubes are cut along the same diagonal and the
//! output has no cracks. Vertices on lattice edges are keyed by the edge's
//! sample indices and shared between all tetrahedra touching that edge.

// Lattice indices become coordinates; extents are far below 2^52.
#![allow(clippy::cast_precision_loss)]

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, Point3, Vector3};
use mesh_volume::MeanVolume;

/// Cube corner offsets in lattice steps.
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Six tetrahedra sharing the 0-6 diagonal, one per axis ordering.
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 5, 1, 6],
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
];

/// One lattice sample of a cube.
#[derive(Debug, Clone, Copy)]
struct Sample {
    index: usize,
    position: Point3<f64>,
    value: f64,
}

/// Sample axis positions `0, step, 2 * step, ...` below `len`.
fn lattice(len: usize, step: usize) -> Vec<usize> {
    (0..len).step_by(step).collect()
}

/// Incremental mesh builder with shared edge vertices.
struct Extractor<'a> {
    volume: &'a MeanVolume,
    level: f64,
    mesh: IndexedMesh,
    edge_vertices: HashMap<(usize, usize), u32>,
}

impl<'a> Extractor<'a> {
    fn new(volume: &'a MeanVolume, level: f64) -> Self {
        Self {
            volume,
            level,
            mesh: IndexedMesh::new(),
            edge_vertices: HashMap::new(),
        }
    }

    fn sample(&self, x: usize, y: usize, z: usize) -> Sample {
        let index = self.volume.shape().index(x, y, z);
        Sample {
            index,
            position: Point3::new(x as f64, y as f64, z as f64),
            value: self.volume.as_slice()[index],
        }
    }

    /// Vertex where the iso-level crosses the edge `a`-`b`.
    ///
    /// Interpolation always runs from the lower sample index so the position
    /// does not depend on which tetrahedron asks first.
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: meshes are u32-indexed
    fn edge_vertex(&mut self, a: Sample, b: Sample) -> u32 {
        let (lo, hi) = if a.index <= b.index { (a, b) } else { (b, a) };
        let key = (lo.index, hi.index);
        if let Some(&vertex) = self.edge_vertices.get(&key) {
            return vertex;
        }
        let t = (self.level - lo.value) / (hi.value - lo.value);
        let position = lo.position + (hi.position - lo.position) * t;
        let vertex = self.mesh.vertices.len() as u32;
        self.mesh.vertices.push(position);
        self.edge_vertices.insert(key, vertex);
        vertex
    }

    fn cube(&mut self, x0: usize, y0: usize, z0: usize, x1: usize, y1: usize, z1: usize) {
        let samples = CORNERS.map(|[cx, cy, cz]| {
            self.sample(
                if cx == 0 { x0 } else { x1 },
                if cy == 0 { y0 } else { y1 },
                if cz == 0 { z0 } else { z1 },
            )
        });
        let inside = samples.map(|s| s.value >= self.level);
        if inside.iter().all(|&v| v) || inside.iter().all(|&v| !v) {
            return;
        }
        for tet in TETRAHEDRA {
            self.tetrahedron(tet.map(|c| samples[c]), tet.map(|c| inside[c]));
        }
    }

    fn tetrahedron(&mut self, samples: [Sample; 4], inside: [bool; 4]) {
        let (ins, outs): (Vec<usize>, Vec<usize>) = (0..4).partition(|&i| inside[i]);
        match (ins.as_slice(), outs.as_slice()) {
            (&[a], &[b, c, d]) | (&[b, c, d], &[a]) => {
                let tri = [
                    self.edge_vertex(samples[a], samples[b]),
                    self.edge_vertex(samples[a], samples[c]),
                    self.edge_vertex(samples[a], samples[d]),
                ];
                self.push_oriented(tri, &samples, &ins, &outs);
            }
            (&[a, b], &[c, d]) => {
                let ac = self.edge_vertex(samples[a], samples[c]);
                let ad = self.edge_vertex(samples[a], samples[d]);
                let bd = self.edge_vertex(samples[b], samples[d]);
                let bc = self.edge_vertex(samples[b], samples[c]);
                self.push_oriented([ac, ad, bd], &samples, &ins, &outs);
                self.push_oriented([ac, bd, bc], &samples, &ins, &outs);
            }
            _ => {}
        }
    }

    /// Push a triangle wound so its normal points from the inside corners
    /// towards the outside corners.
    fn push_oriented(
        &mut self,
        mut tri: [u32; 3],
        samples: &[Sample; 4],
        ins: &[usize],
        outs: &[usize],
    ) {
        let centroid = |corners: &[usize]| {
            let sum = corners
                .iter()
                .fold(Vector3::zeros(), |acc, &c| acc + samples[c].position.coords);
            sum / corners.len() as f64
        };
        let outward = centroid(outs) - centroid(ins);

        let [p0, p1, p2] = tri.map(|v| self.mesh.vertices[v as usize]);
        let normal = (p1 - p0).cross(&(p2 - p0));
        if normal.dot(&outward) < 0.0 {
            tri.swap(1, 2);
        }
        self.mesh.faces.push(tri);
    }

    fn finish(self) -> IndexedMesh {
        self.mesh
    }
}

/// Extract the `level` isosurface of `volume` on a lattice of stride `step`.
///
/// Vertices are in voxel-index coordinates. `step` must be at least 1.
pub(crate) fn marching_tetrahedra(volume: &MeanVolume, level: f64, step: usize) -> IndexedMesh {
    let shape = volume.shape();
    let xs = lattice(shape.nx, step);
    let ys = lattice(shape.ny, step);
    let zs = lattice(shape.nz, step);

    let mut extractor = Extractor::new(volume, level);
    for z in zs.windows(2) {
        for y in ys.windows(2) {
            for x in xs.windows(2) {
                extractor.cube(x[0], y[0], z[0], x[1], y[1], z[1]);
            }
        }
    }
    extractor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_volume::VolumeShape;

    fn volume_from(shape: VolumeShape, f: impl Fn(usize, usize, usize) -> f64) -> MeanVolume {
        let mut values = Vec::with_capacity(shape.len());
        for z in 0..shape.nz {
            for y in 0..shape.ny {
                for x in 0..shape.nx {
                    values.push(f(x, y, z));
                }
            }
        }
        MeanVolume::from_raw(shape, values, 1).unwrap()
    }

    #[test]
    fn lattice_positions() {
        assert_eq!(lattice(7, 1), vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(lattice(7, 3), vec![0, 3, 6]);
        assert_eq!(lattice(2, 5), vec![0]);
    }

    #[test]
    fn kuhn_split_covers_the_cube() {
        // Every tetrahedron is a monotone path 0 -> ... -> 6 and all six
        // axis orders appear once.
        let mut orders: Vec<[usize; 3]> = TETRAHEDRA
            .iter()
            .map(|tet| {
                let weight = |c: usize| CORNERS[c].iter().sum::<usize>();
                let path = if weight(tet[1]) < weight(tet[2]) {
                    [tet[0], tet[1], tet[2], tet[3]]
                } else {
                    [tet[0], tet[2], tet[1], tet[3]]
                };
                let axis = |from: usize, to: usize| {
                    (0..3)
                        .find(|&k| CORNERS[from][k] != CORNERS[to][k])
                        .unwrap()
                };
                [axis(path[0], path[1]), axis(path[1], path[2]), axis(path[2], path[3])]
            })
            .collect();
        orders.sort_unstable();
        orders.dedup();
        assert_eq!(orders.len(), 6);
    }

    #[test]
    fn single_inside_sample_gives_closed_octahedron() {
        let shape = VolumeShape::cube(3);
        let volume = volume_from(shape, |x, y, z| if (x, y, z) == (1, 1, 1) { 1.0 } else { 0.0 });
        let mesh = marching_tetrahedra(&volume, 0.5, 1);

        assert!(mesh.is_watertight());
        assert!(mesh.signed_volume() > 0.0);
        for v in &mesh.vertices {
            let d = v - Point3::new(1.0, 1.0, 1.0);
            assert!(d.amax() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn interpolates_at_level() {
        // Ramp along x: the surface is the plane x = 1.5.
        let shape = VolumeShape::new(3, 2, 2);
        let volume = volume_from(shape, |x, _, _| match x {
            0 => 1.0,
            1 => 0.75,
            _ => 0.25,
        });
        let mesh = marching_tetrahedra(&volume, 0.5, 1);

        assert!(!mesh.faces.is_empty());
        for v in &mesh.vertices {
            assert_relative_eq!(v.x, 1.5, epsilon = 1e-12);
        }
        for tri in mesh.triangles() {
            if let Some(n) = tri.normal() {
                assert!(n.x > 0.0, "normal {n:?} points into the solid");
            }
        }
    }

    #[test]
    fn uniform_volume_is_empty() {
        let shape = VolumeShape::cube(4);
        assert!(marching_tetrahedra(&volume_from(shape, |_, _, _| 1.0), 0.5, 1).is_empty());
        assert!(marching_tetrahedra(&volume_from(shape, |_, _, _| 0.0), 0.5, 1).is_empty());
    }

    #[test]
    fn step_skips_samples() {
        // The only inside sample is off the stride-2 lattice.
        let shape = VolumeShape::cube(5);
        let volume = volume_from(shape, |x, y, z| if (x, y, z) == (1, 1, 1) { 1.0 } else { 0.0 });

        assert!(!marching_tetrahedra(&volume, 0.5, 1).is_empty());
        assert!(marching_tetrahedra(&volume, 0.5, 2).is_empty());
    }
}
