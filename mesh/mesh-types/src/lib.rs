//! Core surface types for the mean-nucleus workspace.
//!
//! This crate provides the polygonal surface representation that every other
//! crate consumes:
//!
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`shapes`] - Closed test solids (boxes, spheres)
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate: no I/O, no threading, no logging. It can be used
//! from loaders, rasterizers and exporters alike.
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`. Segmented
//! nucleus meshes are usually expressed in voxel units of the source image.
//!
//! # Polygons
//!
//! Source meshes may carry polygon faces with more than three corners.
//! [`IndexedMesh::push_polygon`] fan-triangulates them on the way in, so the
//! stored representation is always a triangle list.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Point3};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
//! mesh.vertices.push(Point3::new(1.0, 0.0, 0.0));
//! mesh.vertices.push(Point3::new(1.0, 1.0, 0.0));
//! mesh.vertices.push(Point3::new(0.0, 1.0, 0.0));
//! mesh.push_polygon(&[0, 1, 2, 3]).unwrap();
//!
//! assert_eq!(mesh.face_count(), 2);
//! assert!(!mesh.is_watertight());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bounds;
mod error;
mod mesh;
pub mod shapes;
mod triangle;

pub use bounds::Aabb;
pub use error::{MeshError, MeshResult};
pub use mesh::IndexedMesh;
pub use triangle::Triangle;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
