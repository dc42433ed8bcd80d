use crate::config::CoverageConfig;
use crate::coverage::{accumulate, AccumulationStats, CoverageHolder};
use crate::environment::EnvironmentHolder;
use crate::error::{ConfigError, SnapshotError};
use crate::map::{encode_map, MapKind, SpatialMap};
use crate::pose::Pose;
use crate::report::{report, CoveredPercentage};
use crate::sensor::{HeightBand, SensorModel};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;

/// The frame that all published data is expressed in.
pub const MAP_FRAME_ID: &str = "map";

/// A published value with its creation time and reference frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Stamped<T> {
    pub stamp: SystemTime,
    pub frame_id: &'static str,
    pub data: T,
}

impl<T> Stamped<T> {
    fn new(stamp: SystemTime, data: T) -> Self {
        Self {
            stamp,
            frame_id: MAP_FRAME_ID,
            data,
        }
    }
}

/// Everything published after integrating one pose.
#[derive(Clone, Debug)]
pub struct CoverageUpdate {
    /// The full coverage map, encoded as a [`MapKind::Coverage`] snapshot.
    pub coverage_snapshot: Stamped<Vec<u8>>,
    pub covered_volume: Stamped<f32>,
    pub covered_percentage: Stamped<CoveredPercentage>,
    pub stats: AccumulationStats,
}

/// What was loaded by [`CoverageService::on_environment_snapshot`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvironmentSummary {
    pub resolution: f32,
    pub voxel_count: usize,
    pub total_volume: f32,
}

/// Estimates how much of a known environment a moving sensor has observed.
///
/// The service is driven by two events. An environment snapshot replaces the known environment and resets coverage. A
/// pose update casts the sensor's rays from that pose, grows the coverage map, and produces a [`CoverageUpdate`]. Pose
/// updates that arrive before any environment has loaded are ignored.
#[derive(Debug)]
pub struct CoverageService {
    band: HeightBand,
    sensor: SensorModel,
    environment: EnvironmentHolder,
    coverage: CoverageHolder,
}

impl CoverageService {
    pub fn new(config: &CoverageConfig) -> Result<Self, ConfigError> {
        let (band, sensor) = config.validate()?;
        Ok(Self::with_model(band, sensor))
    }

    pub fn with_model(band: HeightBand, sensor: SensorModel) -> Self {
        log::info!(
            "Coverage service created: {:?} sensor, range {} m, {} rays per pose, obstacle heights [{}, {}]",
            sensor.shape(),
            sensor.range(),
            sensor.sample_count(),
            band.min(),
            band.max()
        );
        Self {
            band,
            sensor,
            environment: EnvironmentHolder::default(),
            coverage: CoverageHolder::default(),
        }
    }

    pub fn height_band(&self) -> HeightBand {
        self.band
    }

    pub fn sensor(&self) -> &SensorModel {
        &self.sensor
    }

    pub fn is_environment_loaded(&self) -> bool {
        self.environment.is_loaded()
    }

    pub fn total_volume(&self) -> Option<f32> {
        self.environment.get().map(|e| e.total_volume())
    }

    pub fn environment_map(&self) -> Option<&SpatialMap> {
        self.environment.get().map(|e| e.map())
    }

    pub fn coverage_map(&self) -> Option<&SpatialMap> {
        self.coverage.map()
    }

    /// Replaces the environment with the one encoded in `bytes` and discards all coverage.
    ///
    /// On failure, the previous environment and coverage are kept.
    pub fn on_environment_snapshot(&mut self, bytes: &[u8]) -> Result<EnvironmentSummary, SnapshotError> {
        let environment = match self.environment.load(bytes, self.band) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Ignoring environment snapshot: {}", e);
                return Err(e);
            }
        };
        let summary = EnvironmentSummary {
            resolution: environment.resolution(),
            voxel_count: environment.map().len(),
            total_volume: environment.total_volume(),
        };
        self.coverage.reset(environment.map());
        Ok(summary)
    }

    /// Integrates the sensor's view from `pose` and reports the new coverage.
    ///
    /// Returns `None` if no environment has been loaded yet.
    pub fn on_pose_update(&mut self, pose: &Pose) -> Option<CoverageUpdate> {
        let environment = match self.environment.get() {
            Some(e) => e,
            None => {
                log::debug!("Ignoring pose update before any environment has loaded");
                return None;
            }
        };
        let coverage = self.coverage.map_mut()?;

        let stats = accumulate(pose, &self.sensor, self.band, environment.map(), coverage);
        let r = report(coverage, self.band, environment.total_volume());
        log::debug!(
            "Pose at {}: {} rays, {} hits, {} accepted, covered {} m^3",
            pose.position,
            stats.samples,
            stats.hits,
            stats.accepted,
            r.covered_volume
        );
        if r.covered_percentage == CoveredPercentage::Undefined {
            log::warn!("Environment has no occupied volume in the height band; coverage percentage is undefined");
        }

        let snapshot = match encode_map(coverage, MapKind::Coverage) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to encode coverage map: {}", e);
                Vec::new()
            }
        };

        let stamp = SystemTime::now();
        Some(CoverageUpdate {
            coverage_snapshot: Stamped::new(stamp, snapshot),
            covered_volume: Stamped::new(stamp, r.covered_volume),
            covered_percentage: Stamped::new(stamp, r.covered_percentage),
            stats,
        })
    }
}

/// A [`CoverageService`] that can be driven from several threads.
///
/// Each event holds the lock for its whole duration, so a pose update never observes a new environment paired with the
/// old coverage map.
#[derive(Clone, Debug)]
pub struct SharedCoverageService {
    inner: Arc<Mutex<CoverageService>>,
}

impl SharedCoverageService {
    pub fn new(service: CoverageService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    pub fn on_environment_snapshot(&self, bytes: &[u8]) -> Result<EnvironmentSummary, SnapshotError> {
        self.inner.lock().on_environment_snapshot(bytes)
    }

    pub fn on_pose_update(&self, pose: &Pose) -> Option<CoverageUpdate> {
        self.inner.lock().on_pose_update(pose)
    }

    /// Runs `f` with exclusive access to the service.
    pub fn with<R>(&self, f: impl FnOnce(&CoverageService) -> R) -> R {
        f(&self.inner.lock())
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
    use crate::core::glam::{Quat, Vec3A};
    use crate::map::{decode_map, CoverageTag, VoxelKey};
    use crate::sensor::SensorShape;

    use approx::assert_relative_eq;

    fn service(shape: SensorShape, range: f32) -> CoverageService {
        let band = HeightBand::new(0.3, 2.0).unwrap();
        let sensor = SensorModel::new(shape, 60f32.to_radians(), 30f32.to_radians(), range, Vec3A::X).unwrap();
        CoverageService::with_model(band, sensor)
    }

    fn snapshot(resolution: f32, occupied: &[[i32; 3]]) -> Vec<u8> {
        let mut map = SpatialMap::new(resolution).unwrap();
        for key in occupied {
            map.mark_occupied(VoxelKey::from_array(*key));
        }
        encode_map(&map, MapKind::Occupancy).unwrap()
    }

    fn percentage(update: &CoverageUpdate) -> f32 {
        update.covered_percentage.data.value().unwrap()
    }

    #[test]
    fn single_obstacle_is_fully_covered() {
        let mut service = service(SensorShape::Orthogonal, 10.0);
        let summary = service.on_environment_snapshot(&snapshot(1.0, &[[5, 0, 1]])).unwrap();
        assert_eq!(summary.voxel_count, 1);
        assert_relative_eq!(summary.total_volume, 1.0);

        let update = service
            .on_pose_update(&Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0))
            .unwrap();
        assert_relative_eq!(update.covered_volume.data, 1.0);
        assert_relative_eq!(percentage(&update), 100.0);
        assert_eq!(update.covered_volume.frame_id, MAP_FRAME_ID);
        assert_eq!(update.coverage_snapshot.stamp, update.covered_volume.stamp);

        let coverage = decode_map(&update.coverage_snapshot.data, MapKind::Coverage).unwrap();
        assert_eq!(&coverage, service.coverage_map().unwrap());
        assert_eq!(
            coverage.search(VoxelKey::new(5, 0, 1)).unwrap().tag,
            Some(CoverageTag::Orthogonal)
        );
    }

    #[test]
    fn pose_before_environment_is_ignored() {
        let mut service = service(SensorShape::Orthogonal, 10.0);
        assert!(service.on_pose_update(&Pose::from_position_yaw(Vec3A::ZERO, 0.0)).is_none());
        assert!(service.coverage_map().is_none());
        assert_eq!(service.total_volume(), None);
    }

    #[test]
    fn coverage_grows_monotonically() {
        let mut service = service(SensorShape::Orthogonal, 10.0);
        service
            .on_environment_snapshot(&snapshot(1.0, &[[5, 0, 1], [0, 5, 1], [-5, 0, 1], [0, -5, 1]]))
            .unwrap();

        let position = Vec3A::new(0.0, 0.0, 1.0);
        let mut last = 0.0;
        for (i, yaw) in [0.0f32, 90.0, 180.0, 270.0].iter().enumerate() {
            let update = service
                .on_pose_update(&Pose::from_position_yaw(position, yaw.to_radians()))
                .unwrap();
            let volume = update.covered_volume.data;
            assert!(volume >= last);
            assert_relative_eq!(volume, (i + 1) as f32);
            last = volume;
        }
        assert_relative_eq!(last, service.total_volume().unwrap());
    }

    #[test]
    fn repeating_a_pose_changes_nothing() {
        let mut service = service(SensorShape::Circular, 6.0);
        service
            .on_environment_snapshot(&snapshot(0.5, &[[8, 0, 2], [8, 1, 2], [8, 2, 2]]))
            .unwrap();
        let pose = Pose::new(Vec3A::new(0.0, 0.0, 1.0), Quat::IDENTITY);

        service.on_pose_update(&pose).unwrap();
        let first = service.coverage_map().unwrap().clone();
        let update = service.on_pose_update(&pose).unwrap();
        assert_eq!(service.coverage_map().unwrap(), &first);
        assert_eq!(update.stats.accepted, update.stats.hits);
    }

    #[test]
    fn obstacles_outside_height_band_are_invisible() {
        let mut service = service(SensorShape::Orthogonal, 10.0);
        let summary = service
            .on_environment_snapshot(&snapshot(1.0, &[[5, 0, 0], [5, 0, 3]]))
            .unwrap();
        assert_eq!(summary.total_volume, 0.0);

        let update = service
            .on_pose_update(&Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0))
            .unwrap();
        assert_eq!(update.covered_volume.data, 0.0);
        assert_eq!(update.covered_percentage.data, CoveredPercentage::Undefined);
    }

    #[test]
    fn circular_sensor_is_limited_in_the_plane() {
        let environment = snapshot(1.0, &[[10, 0, 1]]);
        let pose = Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0);

        let mut circular = service(SensorShape::Circular, 9.8);
        circular.on_environment_snapshot(&environment).unwrap();
        let update = circular.on_pose_update(&pose).unwrap();
        assert_eq!(update.covered_volume.data, 0.0);
        assert_relative_eq!(percentage(&update), 0.0);

        let mut orthogonal = service(SensorShape::Orthogonal, 9.8);
        orthogonal.on_environment_snapshot(&environment).unwrap();
        let update = orthogonal.on_pose_update(&pose).unwrap();
        assert_relative_eq!(update.covered_volume.data, 1.0);
        assert_relative_eq!(percentage(&update), 100.0);
    }

    #[test]
    fn percentage_is_ratio_of_volumes() {
        let mut service = service(SensorShape::Orthogonal, 10.0);
        service
            .on_environment_snapshot(&snapshot(1.0, &[[5, 0, 1], [-5, 0, 1]]))
            .unwrap();
        let update = service
            .on_pose_update(&Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0))
            .unwrap();
        let total = service.total_volume().unwrap();
        assert_relative_eq!(percentage(&update), 100.0 * (update.covered_volume.data / total));
        assert_relative_eq!(percentage(&update), 50.0);
    }

    #[test]
    fn new_environment_resets_coverage() {
        let mut service = service(SensorShape::Orthogonal, 10.0);
        service.on_environment_snapshot(&snapshot(1.0, &[[5, 0, 1]])).unwrap();
        service
            .on_pose_update(&Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0))
            .unwrap();
        assert!(!service.coverage_map().unwrap().is_empty());

        service.on_environment_snapshot(&snapshot(0.5, &[[10, 0, 2]])).unwrap();
        let coverage = service.coverage_map().unwrap();
        assert!(coverage.is_empty());
        assert_eq!(coverage.resolution(), 0.5);
    }

    #[test]
    fn bad_snapshot_keeps_state() {
        let mut service = service(SensorShape::Orthogonal, 10.0);
        service.on_environment_snapshot(&snapshot(1.0, &[[5, 0, 1]])).unwrap();
        service
            .on_pose_update(&Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), 0.0))
            .unwrap();
        let coverage = service.coverage_map().unwrap().clone();

        assert!(service.on_environment_snapshot(b"not a map").is_err());
        assert_eq!(service.coverage_map().unwrap(), &coverage);
        assert_eq!(service.total_volume(), Some(1.0));
    }

    #[test]
    fn shared_service_across_threads() {
        let shared = SharedCoverageService::new(service(SensorShape::Orthogonal, 10.0));
        let first = snapshot(1.0, &[[5, 0, 1], [-5, 0, 1]]);
        let second = snapshot(0.5, &[[10, 0, 2]]);
        shared.on_environment_snapshot(&first).unwrap();

        crossbeam::scope(|s| {
            for i in 0..4 {
                let shared = shared.clone();
                s.spawn(move |_| {
                    let yaw = if i % 2 == 0 { 0.0 } else { std::f32::consts::PI };
                    for _ in 0..5 {
                        let update = shared
                            .on_pose_update(&Pose::from_position_yaw(Vec3A::new(0.0, 0.0, 1.0), yaw))
                            .unwrap();
                        let p = percentage(&update);
                        assert!((0.0..=100.0 + 1e-3).contains(&p));
                    }
                });
            }
            let shared = shared.clone();
            let second = &second;
            s.spawn(move |_| {
                shared.on_environment_snapshot(second).unwrap();
            });
        })
        .unwrap();

        shared.with(|service| {
            let coverage = service.coverage_map().unwrap();
            let environment = service.environment_map().unwrap();
            assert_eq!(coverage.resolution(), environment.resolution());
            assert_eq!(environment.resolution(), 0.5);
        });
    }
}
