use crate::coordinates::{in_voxel, to_voxel_units};
use crate::key::VoxelKey;
use crate::map::SpatialMap;
use crate::core::geometry::{farthest_corner_distance, Ray};
use crate::core::glam::{IVec3, Vec3A};
use crate::core::units::*;

use smallvec::SmallVec;

/// The voxels traversed by a ray segment, in traversal order.
pub type KeyRay = SmallVec<[VoxelKey; 64]>;

/// Visits every unit grid cell intersected by a ray, in order, along with the time the ray enters the cell.
///
/// This is the "fast voxel traversal" of Amanatides and Woo. The first item is always the cell containing the ray start at
/// time `0.0`. The iterator only ends if the ray has no velocity or the next cell would fall outside the `i32` lattice;
/// otherwise callers decide when to stop.
pub struct GridRayIter3 {
    current: IVec3,
    step: IVec3,
    t_max: Vec3A,
    t_delta: Vec3A,
    t_entrance: f32,
    started: bool,
}

impl GridRayIter3 {
    pub fn new(ray: VoxelUnits<Ray>) -> Self {
        let VoxelUnits(ray) = ray;
        let start = ray.start;
        let velocity = ray.velocity();
        let VoxelKey(current) = in_voxel(VoxelUnits(start));

        let mut step = IVec3::ZERO;
        let mut t_max = Vec3A::splat(f32::INFINITY);
        let mut t_delta = Vec3A::splat(f32::INFINITY);
        for axis in 0..3 {
            let v = velocity[axis];
            let s = start[axis];
            if v > 0.0 {
                step[axis] = 1;
                t_max[axis] = (s.floor() + 1.0 - s) / v;
                t_delta[axis] = 1.0 / v;
            } else if v < 0.0 {
                step[axis] = -1;
                t_max[axis] = (s - s.floor()) / -v;
                t_delta[axis] = -1.0 / v;
            }
        }

        Self {
            current,
            step,
            t_max,
            t_delta,
            t_entrance: 0.0,
            started: false,
        }
    }
}

impl Iterator for GridRayIter3 {
    type Item = (f32, IVec3);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some((self.t_entrance, self.current));
        }

        // Ties go to the lowest axis.
        let axis = if self.t_max.x <= self.t_max.y && self.t_max.x <= self.t_max.z {
            0
        } else if self.t_max.y <= self.t_max.z {
            1
        } else {
            2
        };
        if !self.t_max[axis].is_finite() {
            // Zero velocity: the ray never leaves its cell.
            return None;
        }

        self.current[axis] = self.current[axis].checked_add(self.step[axis])?;
        self.t_entrance = self.t_max[axis];
        self.t_max[axis] += self.t_delta[axis];

        Some((self.t_entrance, self.current))
    }
}

impl SpatialMap {
    fn grid_ray(&self, ray: MetricUnits<Ray>) -> GridRayIter3 {
        let resolution = self.resolution();
        let start = to_voxel_units(ray.map(|r| r.start), resolution);
        let velocity = ray.into_inner().velocity() / resolution;
        GridRayIter3::new(start.map(|s| Ray::new(s, velocity)))
    }

    /// Casts a ray from `origin` along `direction` and returns the center of the first occupied voxel it meets.
    ///
    /// Unknown and free voxels are passed through. A voxel is within range if the ray enters it no farther than `max_range`
    /// from `origin`, so the returned center may lie up to half a voxel diagonal beyond `max_range`. A non-positive
    /// `max_range` means "as far as the map goes". If the voxel containing `origin` is occupied, its center is returned.
    pub fn cast_ray(&self, origin: Vec3A, direction: Vec3A, max_range: f32) -> Option<Vec3A> {
        if self.is_empty() {
            return None;
        }
        self.ray_keys_in_range(origin, direction, max_range)
            .find(|&key| self.is_occupied(key))
            .map(|key| self.voxel_center(key))
    }

    /// The keys that [`Self::cast_ray`] would inspect, in traversal order, if nothing along the ray were occupied.
    ///
    /// With a positive `max_range` the walk depends only on the range and resolution, never on the contents of the map.
    /// Otherwise it ends at the far corner of the map's bounds. Empty if `direction` is zero.
    pub fn ray_keys_in_range(
        &self,
        origin: Vec3A,
        direction: Vec3A,
        max_range: f32,
    ) -> impl Iterator<Item = VoxelKey> + '_ {
        let limit = if max_range > 0.0 {
            Some(max_range)
        } else {
            // Every stored voxel is entered before the ray passes the far corner of the map.
            self.metric_extent()
                .map(|extent| farthest_corner_distance(&extent, origin))
        };
        let walk = limit
            .zip(Ray::with_direction(origin, direction))
            .map(|(limit, ray)| {
                self.grid_ray(MetricUnits(ray))
                    .take_while(move |&(t_entrance, _)| t_entrance <= limit)
                    .map(|(_, p)| VoxelKey(p))
            });
        walk.into_iter().flatten()
    }

    /// The keys of the voxels crossed on the way from `origin` to `end`, starting with the voxel containing `origin` and
    /// excluding the voxel containing `end`. Empty if both points are in the same voxel.
    pub fn compute_ray_keys(&self, origin: Vec3A, end: Vec3A) -> KeyRay {
        let mut keys = KeyRay::new();
        let end_key = self.key_of(end);
        if self.key_of(origin) == end_key {
            return keys;
        }

        // With this velocity, the segment is traversed in time 1.0.
        for (t, p) in self.grid_ray(MetricUnits(Ray::between(origin, end))) {
            let key = VoxelKey(p);
            if key == end_key || t > 1.0 {
                break;
            }
            keys.push(key);
        }
        keys
    }

    /// Integrates a measurement from `origin` that hit something at `end`.
    ///
    /// Every voxel crossed on the way is marked free (occupied voxels stay occupied) and the voxel at `end` is marked
    /// occupied. If the segment is longer than a positive `max_range`, it is cut at `max_range` and no voxel is marked
    /// occupied.
    ///
    /// Returns `true` if the end voxel was marked occupied.
    pub fn insert_ray(&mut self, origin: Vec3A, end: Vec3A, max_range: f32) -> bool {
        let length = origin.distance(end);
        if max_range > 0.0 && length > max_range {
            let end = Ray::between(origin, end).position_at(max_range / length);
            self.integrate_miss_on_ray(origin, end);
            return false;
        }

        self.integrate_miss_on_ray(origin, end);
        self.mark_occupied(self.key_of(end));
        true
    }

    fn integrate_miss_on_ray(&mut self, origin: Vec3A, end: Vec3A) {
        for key in self.compute_ray_keys(origin, end) {
            self.mark_free(key);
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
