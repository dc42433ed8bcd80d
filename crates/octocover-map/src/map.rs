use crate::coordinates::{key_of, voxel_center};
use crate::key::VoxelKey;
use crate::voxel::{CoverageTag, Occupancy, Voxel};
use crate::core::glam::{IVec3, Vec3A};
use crate::core::ilattice::prelude::Extent;
use crate::core::units::MetricUnits;
use crate::core::{SmallKeyHashMap, SmallKeyHashSet};

use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("map resolution must be finite and positive, got {0}")]
pub struct InvalidResolution(pub f32);

/// A sparse voxel map at a fixed resolution.
///
/// All voxels are stored at the finest level, so every stored voxel is a leaf with edge length [`Self::resolution`].
/// Hierarchical inputs are expanded before they get here (see [`MapSnapshot::into_map`](crate::MapSnapshot::into_map)).
///
/// Voxels are never removed, so the bounds of the stored keys only grow and are maintained on insertion.
#[derive(Clone, Debug)]
pub struct SpatialMap {
    resolution: f32,
    voxels: SmallKeyHashMap<VoxelKey, Voxel>,
    /// Inclusive minimum and maximum of the stored keys.
    key_bounds: Option<(IVec3, IVec3)>,
}

impl SpatialMap {
    pub fn new(resolution: f32) -> Result<Self, InvalidResolution> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(InvalidResolution(resolution));
        }
        Ok(Self {
            resolution,
            voxels: SmallKeyHashMap::default(),
            key_bounds: None,
        })
    }

    /// An empty map with the same resolution as `self`.
    pub fn empty_like(&self) -> Self {
        Self {
            resolution: self.resolution,
            voxels: SmallKeyHashMap::default(),
            key_bounds: None,
        }
    }

    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// The volume of a single voxel.
    #[inline]
    pub fn voxel_volume(&self) -> f32 {
        self.resolution * self.resolution * self.resolution
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[inline]
    pub fn key_of(&self, p: Vec3A) -> VoxelKey {
        key_of(MetricUnits(p), self.resolution)
    }

    #[inline]
    pub fn voxel_center(&self, key: VoxelKey) -> Vec3A {
        voxel_center(key, self.resolution).into_inner()
    }

    #[inline]
    pub fn search(&self, key: VoxelKey) -> Option<&Voxel> {
        self.voxels.get(&key)
    }

    pub fn search_point(&self, p: Vec3A) -> Option<&Voxel> {
        self.search(self.key_of(p))
    }

    #[inline]
    pub fn is_occupied(&self, key: VoxelKey) -> bool {
        self.search(key).map_or(false, Voxel::is_occupied)
    }

    pub fn set(&mut self, key: VoxelKey, voxel: Voxel) {
        *self.entry(key) = voxel;
    }

    /// Sets the occupancy of `key`, keeping any existing tag.
    pub fn set_occupancy(&mut self, key: VoxelKey, occupancy: Occupancy) {
        self.entry(key).occupancy = occupancy;
    }

    /// Records that `key` was observed empty. An occupied voxel stays occupied.
    pub fn mark_free(&mut self, key: VoxelKey) {
        self.entry(key);
    }

    pub fn mark_occupied(&mut self, key: VoxelKey) {
        self.set_occupancy(key, Occupancy::Occupied);
    }

    /// Returns `false` if there is no voxel at `key` to tag.
    pub fn set_tag(&mut self, key: VoxelKey, tag: CoverageTag) -> bool {
        match self.voxels.get_mut(&key) {
            Some(voxel) => {
                voxel.tag = Some(tag);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoxelKey, &Voxel)> + '_ {
        self.voxels.iter().map(|(k, v)| (*k, v))
    }

    pub fn occupied_keys(&self) -> SmallKeyHashSet<VoxelKey> {
        self.iter()
            .filter(|(_, v)| v.is_occupied())
            .map(|(k, _)| k)
            .collect()
    }

    /// The inclusive minimum and maximum keys over every stored voxel, or `None` if the map is empty.
    #[inline]
    pub fn key_bounds(&self) -> Option<(VoxelKey, VoxelKey)> {
        self.key_bounds.map(|(min, max)| (VoxelKey(min), VoxelKey(max)))
    }

    /// The metric box that bounds every stored voxel cube, or `None` if the map is empty.
    pub fn metric_extent(&self) -> Option<Extent<Vec3A>> {
        let (min, max) = self.key_bounds?;
        let half = Vec3A::splat(0.5 * self.resolution);
        Some(Extent::from_min_and_lub(
            self.center_of_ivec3(min) - half,
            self.center_of_ivec3(max) + half,
        ))
    }

    /// Iterates over the leaves whose centers lie in `extent`.
    pub fn leaves_in_extent(&self, extent: Extent<Vec3A>) -> impl Iterator<Item = (VoxelKey, &Voxel)> + '_ {
        self.iter()
            .filter(move |(k, _)| extent.contains(self.voxel_center(*k)))
    }

    /// The voxel at `key`, inserted as free if it was unknown.
    fn entry(&mut self, key: VoxelKey) -> &mut Voxel {
        let VoxelKey(p) = key;
        self.key_bounds = Some(match self.key_bounds {
            Some((min, max)) => (min.min(p), max.max(p)),
            None => (p, p),
        });
        self.voxels.entry(key).or_insert(Voxel::FREE)
    }

    fn center_of_ivec3(&self, p: IVec3) -> Vec3A {
        self.voxel_center(VoxelKey(p))
    }
}

impl PartialEq for SpatialMap {
    fn eq(&self, other: &Self) -> bool {
        self.resolution == other.resolution
            && self.voxels.len() == other.voxels.len()
            && self
                .voxels
                .iter()
                .all(|(k, v)| other.voxels.get(k) == Some(v))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
