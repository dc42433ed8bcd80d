use crate::core::glam::{EulerRot, Quat, Vec2, Vec3A};
use crate::error::ConfigError;
use crate::map::CoverageTag;

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Angular distance between neighboring ray samples: one degree.
pub const ANGULAR_STEP: f32 = PI / 180.0;

// Absorbs rounding when a field of view is a whole number of steps.
const STEP_EPSILON: f32 = 1e-3;
const ANGLE_EPSILON: f32 = 1e-6;

/// The cross-section of the sensed volume.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorShape {
    /// Hits are limited to a cylinder of radius `range` around the sensor.
    Circular,
    /// Any hit inside the angular field of view is accepted.
    Orthogonal,
}

impl SensorShape {
    pub fn coverage_tag(self) -> CoverageTag {
        match self {
            SensorShape::Circular => CoverageTag::Circular,
            SensorShape::Orthogonal => CoverageTag::Orthogonal,
        }
    }

    /// Whether a ray-cast hit at `hit` is sensed from `position`.
    pub fn accepts(self, position: Vec3A, hit: Vec3A, range: f32) -> bool {
        match self {
            SensorShape::Orthogonal => true,
            SensorShape::Circular => planar_distance(position, hit) <= range,
        }
    }
}

fn planar_distance(a: Vec3A, b: Vec3A) -> f32 {
    Vec2::new(a.x - b.x, a.y - b.y).length()
}

/// The inclusive `[min, max]` range of heights that count as obstacles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightBand {
    min: f32,
    max: f32,
}

impl HeightBand {
    pub fn new(min: f32, max: f32) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::Invalid(format!(
                "height band [{}, {}] is empty or not finite",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn contains(&self, z: f32) -> bool {
        z >= self.min && z <= self.max
    }
}

/// A point sensor with a rectangular angular field of view. All angles are in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorModel {
    shape: SensorShape,
    horizontal_fov: f32,
    vertical_fov: f32,
    range: f32,
    direction: Vec3A,
}

impl SensorModel {
    /// `direction` is the facing of the sensor before the pose's yaw is applied. It is normalized here.
    pub fn new(
        shape: SensorShape,
        horizontal_fov: f32,
        vertical_fov: f32,
        range: f32,
        direction: Vec3A,
    ) -> Result<Self, ConfigError> {
        if !range.is_finite() || range <= 0.0 {
            return Err(ConfigError::Invalid(format!("sensor range must be positive, got {}", range)));
        }
        if !(horizontal_fov > 0.0 && horizontal_fov <= TAU + ANGLE_EPSILON) {
            return Err(ConfigError::Invalid(format!(
                "horizontal field of view must be in (0, 2π], got {}",
                horizontal_fov
            )));
        }
        if !(vertical_fov > 0.0 && vertical_fov <= PI + ANGLE_EPSILON) {
            return Err(ConfigError::Invalid(format!(
                "vertical field of view must be in (0, π], got {}",
                vertical_fov
            )));
        }
        let direction = direction.try_normalize().ok_or_else(|| {
            ConfigError::Invalid(format!("sensor direction {} cannot be normalized", direction))
        })?;

        Ok(Self {
            shape,
            horizontal_fov,
            vertical_fov,
            range,
            direction,
        })
    }

    pub fn shape(&self) -> SensorShape {
        self.shape
    }

    pub fn horizontal_fov(&self) -> f32 {
        self.horizontal_fov
    }

    pub fn vertical_fov(&self) -> f32 {
        self.vertical_fov
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn direction(&self) -> Vec3A {
        self.direction
    }

    /// The number of rays cast per pose.
    pub fn sample_count(&self) -> usize {
        angle_samples(0.0, self.horizontal_fov).count() * angle_samples(0.0, self.vertical_fov).count()
    }

    /// World-frame ray directions over the field of view when the sensor body has heading `yaw`.
    ///
    /// The horizontal angle sweeps `yaw ± hfov / 2` and the vertical angle sweeps `±vfov / 2`, both in steps of
    /// [`ANGULAR_STEP`]. Each direction is the base direction pitched by the vertical angle, then yawed by the horizontal
    /// angle.
    pub fn sample_directions(&self, yaw: f32) -> impl Iterator<Item = Vec3A> + '_ {
        let horizontal = angle_samples(yaw, self.horizontal_fov);
        let vertical = angle_samples(0.0, self.vertical_fov);
        iproduct!(horizontal, vertical)
            .map(move |(h, v)| Quat::from_euler(EulerRot::ZYX, h, v, 0.0) * self.direction)
    }
}

/// Angles from `center - span / 2` to `center + span / 2` inclusive, [`ANGULAR_STEP`] apart.
fn angle_samples(center: f32, span: f32) -> impl Iterator<Item = f32> + Clone {
    let start = center - 0.5 * span;
    let steps = (span / ANGULAR_STEP + STEP_EPSILON).floor() as u32;
    (0..=steps).map(move |i| start + i as f32 * ANGULAR_STEP)
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
