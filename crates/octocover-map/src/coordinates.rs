use crate::key::VoxelKey;
use crate::core::glam::{IVec3, Vec3A};
use crate::core::units::*;

use itertools::iproduct;

/// Nodes above this level are never expanded. A level-`L` node covers `2^L` voxels along each axis.
pub const MAX_NODE_LEVEL: u8 = 8;

/// Converts a metric point into grid space, where the voxel with key `k` spans `[k, k + 1)`.
#[inline]
pub fn to_voxel_units(p: MetricUnits<Vec3A>, resolution: f32) -> VoxelUnits<Vec3A> {
    VoxelUnits(p.into_inner() / resolution + Vec3A::splat(0.5))
}

/// The key of the voxel that contains grid-space point `p`.
#[inline]
pub fn in_voxel(p: VoxelUnits<Vec3A>) -> VoxelKey {
    VoxelKey(p.into_inner().floor().as_ivec3())
}

/// The key of the voxel that contains metric point `p`.
#[inline]
pub fn key_of(p: MetricUnits<Vec3A>, resolution: f32) -> VoxelKey {
    in_voxel(to_voxel_units(p, resolution))
}

/// The metric center of the voxel at `key`.
#[inline]
pub fn voxel_center(key: VoxelKey, resolution: f32) -> MetricUnits<Vec3A> {
    MetricUnits(Vec3A::from(key.0.as_vec3()) * resolution)
}

/// The minimum finest-level key covered by the node at `(level, coordinates)`.
pub fn descendant_min(level: u8, coordinates: IVec3) -> IVec3 {
    coordinates * (1i32 << level)
}

/// Visits every finest-level key covered by the node at `(level, coordinates)`.
pub fn visit_descendants(level: u8, coordinates: IVec3, mut visitor: impl FnMut(VoxelKey)) {
    let min = descendant_min(level, coordinates);
    let side = 1i32 << level;
    for (z, y, x) in iproduct!(0..side, 0..side, 0..side) {
        visitor(VoxelKey(min + IVec3::new(x, y, z)));
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
