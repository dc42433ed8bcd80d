use crate::core::glam::Vec3A;
use crate::error::ConfigError;
use crate::pose::Vector3Record;
use crate::sensor::{HeightBand, SensorModel, SensorShape};

use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub min_obstacle_height: f32,
    pub max_obstacle_height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_obstacle_height: 0.3,
            max_obstacle_height: 2.0,
        }
    }
}

/// Angles are in degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    pub range: f32,
    pub hfov: f32,
    pub vfov: f32,
    pub shape: SensorShape,
    pub direction: Vector3Record,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            range: 1.0,
            hfov: 60.0,
            vfov: 30.0,
            shape: SensorShape::Circular,
            direction: Vector3Record {
                x: 1.0,
                y: 0.0,
                z: 0.0,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoverageConfig {
    pub world: WorldConfig,
    pub sensor: SensorConfig,
}

impl CoverageConfig {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = std::fs::File::open(path)?;

        Ok(ron::de::from_reader(reader)?)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(s)?)
    }

    pub fn height_band(&self) -> Result<HeightBand, ConfigError> {
        HeightBand::new(self.world.min_obstacle_height, self.world.max_obstacle_height)
    }

    pub fn sensor_model(&self) -> Result<SensorModel, ConfigError> {
        let s = &self.sensor;
        SensorModel::new(
            s.shape,
            s.hfov.to_radians(),
            s.vfov.to_radians(),
            s.range,
            Vec3A::from(s.direction),
        )
    }

    pub fn validate(&self) -> Result<(HeightBand, SensorModel), ConfigError> {
        Ok((self.height_band()?, self.sensor_model()?))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
