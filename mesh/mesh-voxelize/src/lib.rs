//! Solid rasterization of closed surfaces.
//!
//! Converts a watertight [`IndexedMesh`](mesh_types::IndexedMesh) into an
//! [`OccupancyVolume`](mesh_volume::OccupancyVolume) by classifying every
//! grid point as inside or outside the enclosed solid.
//!
//! # Algorithm
//!
//! Each z-plane is an independent task. Within a plane every row of grid
//! points shares one +x ray: the ray's crossings with the surface are
//! collected once and each point on the row is classified by crossing
//! parity. Points on the surface (within [`RasterParams::tolerance`]) are
//! outside.
//!
//! Planes run on a dedicated worker pool of [`RasterParams::workers`]
//! threads. Each worker writes only its own plane, so the result is
//! identical for any worker count.
//!
//! # Example
//!
//! ```
//! use mesh_types::{shapes::uv_sphere, Point3};
//! use mesh_volume::VolumeShape;
//! use mesh_voxelize::{rasterize, RasterParams};
//!
//! let sphere = uv_sphere(Point3::origin(), 6.0, 24, 48);
//! let volume = rasterize(&sphere, VolumeShape::cube(16), &RasterParams::default()).unwrap();
//!
//! assert!(volume.inside_count() > 0);
//! assert!(volume.is_inside(8, 8, 8));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cancel;
mod error;
mod params;
mod rasterize;
mod solid;
mod validate;

pub use cancel::CancelToken;
pub use error::{VoxelizeError, VoxelizeResult};
pub use params::{Placement, RasterParams};
pub use rasterize::{rasterize, rasterize_with_cancel};
pub use solid::{RowHits, SolidQuery};
pub use validate::validate_surface;
