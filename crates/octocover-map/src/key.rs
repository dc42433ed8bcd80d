use crate::core::glam::IVec3;
use crate::core::static_assertions::const_assert_eq;

use std::mem;

/// The integer coordinates of a voxel at the finest level of a [`SpatialMap`](crate::SpatialMap).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct VoxelKey(pub IVec3);

const_assert_eq!(mem::size_of::<VoxelKey>(), 12);

impl VoxelKey {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(IVec3::new(x, y, z))
    }

    pub fn from_array(a: [i32; 3]) -> Self {
        Self(IVec3::from_array(a))
    }

    pub fn to_array(self) -> [i32; 3] {
        self.0.to_array()
    }

    /// The key `steps` voxels away along `axis` (0 = X, 1 = Y, 2 = Z), or `None` if it is outside the `i32` lattice.
    #[inline]
    pub fn offset_along(self, axis: usize, steps: i32) -> Option<Self> {
        let mut p = self.0;
        p[axis] = p[axis].checked_add(steps)?;
        Some(Self(p))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
