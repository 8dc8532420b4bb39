//! Dense volumes for averaging nucleus shapes.
//!
//! - [`OccupancyVolume`] - inside/outside markers for one rasterized solid
//! - [`MeanVolume`] - per-voxel fraction of solids covering each voxel
//! - [`VolumeAccumulator`] / [`aggregate`] - reduction of many occupancy
//!   volumes into a mean
//!
//! Both volume kinds persist as `.npy` arrays of shape `(nz, ny, nx)` and
//! can be exported as PGM image stacks for inspection.
//!
//! # Example
//!
//! ```
//! use mesh_volume::{aggregate, OccupancyVolume, VolumeShape};
//!
//! let shape = VolumeShape::new(8, 8, 4);
//! let inside = OccupancyVolume::filled(shape, true).unwrap();
//! let outside = OccupancyVolume::new(shape).unwrap();
//!
//! let mean = aggregate([&inside, &outside, &inside, &outside]).unwrap();
//! assert!(mean.as_slice().iter().all(|&v| v == 0.5));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod aggregate;
mod error;
mod mean;
mod npy;
mod occupancy;
mod shape;
mod stack;

pub use aggregate::{aggregate, VolumeAccumulator};
pub use error::{VolumeError, VolumeResult};
pub use mean::MeanVolume;
pub use occupancy::{OccupancyVolume, INSIDE, OUTSIDE};
pub use shape::VolumeShape;
