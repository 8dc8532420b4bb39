//! Isosurface reconstruction from mean occupancy volumes.
//!
//! [`reconstruct`] extracts the surface where a [`MeanVolume`] crosses an
//! iso-level (0.5 by default) and rescales z so the result is in physical
//! units when the volume's planes were sampled at a spacing other than one
//! voxel.
//!
//! # Overview
//!
//! 1. Sample the volume on a lattice of stride [`IsoConfig::step_size`]
//! 2. Run marching tetrahedra (six tetrahedra per lattice cube) at the level
//! 3. Multiply every vertex z by [`ZScale::corrected_spacing`]
//!
//! Output triangles face away from the high-occupancy side, so a closed
//! surface has positive signed volume.
//!
//! # Quality vs Performance
//!
//! - `IsoConfig::preview()` - every second sample, roughly 8x fewer cubes
//! - `IsoConfig::default()` - every sample
//!
//! [`MeanVolume`]: mesh_volume::MeanVolume

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod reconstruct;
mod tetra;
mod zscale;

pub use config::IsoConfig;
pub use error::{IsoError, IsoResult};
pub use reconstruct::{ReconstructedSurface, reconstruct};
pub use zscale::ZScale;
