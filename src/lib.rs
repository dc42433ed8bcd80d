//! Coverage estimation for a sensor moving through a known voxel environment.
//!
//! Given an occupancy map of the environment (see [`map::SpatialMap`]) and a stream of sensor poses, the
//! [`CoverageService`] casts the sensor's field of view into the environment from each pose and accumulates every
//! observed obstacle voxel into a coverage map. After each pose it reports the covered obstacle volume and its share of
//! the environment's total obstacle volume.

mod config;
mod coverage;
mod environment;
mod error;
mod pose;
mod report;
mod sensor;
mod service;
mod volume;

pub use config::{CoverageConfig, SensorConfig, WorldConfig};
pub use coverage::{accumulate, AccumulationStats, CoverageHolder};
pub use environment::{EnvironmentHolder, EnvironmentMap};
pub use error::{ConfigError, SnapshotError};
pub use pose::{Pose, PoseRecord, QuaternionRecord, Vector3Record};
pub use report::{report, CoverageReport, CoveredPercentage};
pub use sensor::{HeightBand, SensorModel, SensorShape, ANGULAR_STEP};
pub use service::{
    CoverageService, CoverageUpdate, EnvironmentSummary, SharedCoverageService, Stamped, MAP_FRAME_ID,
};
pub use volume::{is_noise, occupied_volume, tally_occupied, VolumeTally, VolumeVariant};

pub use octocover_core as core;
pub use octocover_map as map;
