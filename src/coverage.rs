use crate::map::SpatialMap;
use crate::pose::Pose;
use crate::sensor::{HeightBand, SensorModel};

/// Counters from one pass of [`accumulate`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AccumulationStats {
    /// Rays cast.
    pub samples: usize,
    /// Rays that hit an occupied environment voxel within range.
    pub hits: usize,
    /// Hits that passed the height band and the sensor shape and were written to the coverage map.
    pub accepted: usize,
}

/// Casts the sensor's rays from `pose` into `environment` and integrates every accepted hit into `coverage`.
///
/// For each accepted hit, the voxels along the ray become free (never downgrading an occupied voxel) and the hit voxel
/// becomes occupied and tagged with the sensor shape. Coverage therefore only ever grows.
pub fn accumulate(
    pose: &Pose,
    sensor: &SensorModel,
    band: HeightBand,
    environment: &SpatialMap,
    coverage: &mut SpatialMap,
) -> AccumulationStats {
    let origin = pose.position;
    let shape = sensor.shape();
    let tag = shape.coverage_tag();

    let mut stats = AccumulationStats::default();
    for direction in sensor.sample_directions(pose.yaw()) {
        stats.samples += 1;
        let hit = match environment.cast_ray(origin, direction, sensor.range()) {
            Some(hit) => hit,
            None => continue,
        };
        stats.hits += 1;

        if !band.contains(hit.z) || !shape.accepts(origin, hit, sensor.range()) {
            continue;
        }
        stats.accepted += 1;

        // Range was already enforced by the cast.
        coverage.insert_ray(origin, hit, f32::INFINITY);
        let key = coverage.key_of(hit);
        coverage.set_tag(key, tag);
    }
    stats
}

/// Owns the coverage map, which always shares the resolution of the current environment.
#[derive(Debug, Default)]
pub struct CoverageHolder {
    map: Option<SpatialMap>,
}

impl CoverageHolder {
    /// Discards all coverage and starts over at the resolution of `environment`.
    pub fn reset(&mut self, environment: &SpatialMap) {
        if let Some(old) = &self.map {
            log::debug!("Discarding coverage map with {} voxels", old.len());
        }
        self.map = Some(environment.empty_like());
    }

    pub fn map(&self) -> Option<&SpatialMap> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut SpatialMap> {
        self.map.as_mut()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::glam::Vec3A;
    use crate::map::{CoverageTag, Voxel, VoxelKey};
    use crate::sensor::SensorShape;

    fn band() -> HeightBand {
        HeightBand::new(0.3, 2.0).unwrap()
    }

    fn sensor(shape: SensorShape, range: f32) -> SensorModel {
        SensorModel::new(shape, 60f32.to_radians(), 30f32.to_radians(), range, Vec3A::X).unwrap()
    }

    fn environment(occupied: &[[i32; 3]]) -> SpatialMap {
        let mut map = SpatialMap::new(1.0).unwrap();
        for key in occupied {
            map.mark_occupied(VoxelKey::from_array(*key));
        }
        map
    }

    #[test]
    fn hit_is_marked_and_tagged() {
        let env = environment(&[[5, 0, 1]]);
        let mut coverage = env.empty_like();
        let pose = Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0);

        let stats = accumulate(&pose, &sensor(SensorShape::Orthogonal, 10.0), band(), &env, &mut coverage);
        assert_eq!(stats.samples, 61 * 31);
        assert!(stats.hits > 0);
        assert_eq!(stats.hits, stats.accepted);

        let hit = coverage.search(VoxelKey::new(5, 0, 1)).unwrap();
        assert!(hit.is_occupied());
        assert_eq!(hit.tag, Some(CoverageTag::Orthogonal));
        // The sensor's own voxel was traversed.
        assert_eq!(coverage.search(VoxelKey::new(0, 0, 1)), Some(&Voxel::FREE));
        assert_eq!(coverage.occupied_keys().len(), 1);
    }

    #[test]
    fn nothing_in_view_leaves_coverage_untouched() {
        let env = environment(&[[-5, 0, 1]]);
        let mut coverage = env.empty_like();
        let pose = Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0);

        let stats = accumulate(&pose, &sensor(SensorShape::Orthogonal, 10.0), band(), &env, &mut coverage);
        assert_eq!(stats.hits, 0);
        assert!(coverage.is_empty());
    }

    #[test]
    fn hits_outside_height_band_are_dropped() {
        let env = environment(&[[3, 0, 0]]);
        let mut coverage = env.empty_like();
        let pose = Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 0.0), 0.0);

        let stats = accumulate(&pose, &sensor(SensorShape::Orthogonal, 10.0), band(), &env, &mut coverage);
        assert!(stats.hits > 0);
        assert_eq!(stats.accepted, 0);
        assert!(coverage.is_empty());
    }

    #[test]
    fn circular_hits_outside_height_band_are_dropped() {
        // Within planar range, so only the band can reject the hit.
        let env = environment(&[[3, 0, 0]]);
        let mut coverage = env.empty_like();
        let pose = Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 0.0), 0.0);

        let stats = accumulate(&pose, &sensor(SensorShape::Circular, 10.0), band(), &env, &mut coverage);
        assert!(stats.hits > 0);
        assert_eq!(stats.accepted, 0);
        assert!(coverage.is_empty());
    }

    #[test]
    fn circular_shape_rejects_far_planar_hits() {
        let env = environment(&[[10, 0, 1]]);
        let pose = Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0);

        let mut circular = env.empty_like();
        let stats = accumulate(&pose, &sensor(SensorShape::Circular, 9.8), band(), &env, &mut circular);
        assert!(stats.hits > 0);
        assert_eq!(stats.accepted, 0);
        assert!(circular.occupied_keys().is_empty());

        let mut orthogonal = env.empty_like();
        accumulate(&pose, &sensor(SensorShape::Orthogonal, 9.8), band(), &env, &mut orthogonal);
        assert!(orthogonal.is_occupied(VoxelKey::new(10, 0, 1)));
    }

    #[test]
    fn holder_resets_to_environment_resolution() {
        let mut holder = CoverageHolder::default();
        assert!(holder.map().is_none());

        let env = SpatialMap::new(0.2).unwrap();
        holder.reset(&env);
        holder.map_mut().unwrap().mark_occupied(VoxelKey::new(1, 1, 1));
        assert_eq!(holder.map().unwrap().len(), 1);

        let finer = SpatialMap::new(0.05).unwrap();
        holder.reset(&finer);
        assert!(holder.map().unwrap().is_empty());
        assert_eq!(holder.map().unwrap().resolution(), 0.05);
    }
}
