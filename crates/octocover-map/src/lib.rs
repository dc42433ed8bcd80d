//! The octocover spatial map.
//!
//! # Voxels
//!
//! A [`SpatialMap`] is a sparse set of cubic voxels with a fixed edge length (the map's *resolution*). Each voxel is named
//! by an integer [`VoxelKey`]; the voxel with key `k` is the cube of edge `resolution` centered at `k * resolution`. Only
//! observed voxels are stored. A stored voxel is either [`Occupancy::Free`] or [`Occupancy::Occupied`]; a missing voxel is
//! *unknown*.
//!
//! ## Coverage Tags
//!
//! Maps that accumulate sensor coverage may attach a [`CoverageTag`] to a voxel. Tags are for visualization only and never
//! change how a voxel is counted.
//!
//! # Rays
//!
//! [`SpatialMap::cast_ray`] finds the first occupied voxel along a ray and [`SpatialMap::insert_ray`] marks a measured
//! segment as observed. Both walk the voxel grid with [`GridRayIter3`].
//!
//! # Snapshots
//!
//! Maps travel between processes as LZ4-compressed, validated `rkyv` archives. See [`MapSnapshot`].

mod coordinates;
mod key;
mod map;
mod raycast;
mod snapshot;
mod voxel;

pub use coordinates::*;
pub use key::*;
pub use map::*;
pub use raycast::*;
pub use snapshot::*;
pub use voxel::*;

// Re-exports.
pub use octocover_core as core;
