use crate::core::glam::{Quat, Vec3A};

use serde::{Deserialize, Serialize};

/// Where the sensor is and which way it faces. Consumed once per update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3A,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3A, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position_yaw(position: Vec3A, yaw: f32) -> Self {
        Self::new(position, Quat::from_rotation_z(yaw))
    }

    /// The rotation about Z in a Z-Y-X Euler decomposition. Does not require a unit quaternion.
    pub fn yaw(&self) -> f32 {
        let [x, y, z, w] = self.orientation.to_array();
        (2.0 * (w * z + x * y)).atan2(w * w + x * x - y * y - z * z)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Vector3Record {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vector3Record> for Vec3A {
    fn from(v: Vector3Record) -> Self {
        Vec3A::new(v.x, v.y, v.z)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct QuaternionRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for QuaternionRecord {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// The serialized form of a [`Pose`], as found in pose logs.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PoseRecord {
    pub position: Vector3Record,
    pub orientation: QuaternionRecord,
}

impl From<PoseRecord> for Pose {
    fn from(r: PoseRecord) -> Self {
        let QuaternionRecord { x, y, z, w } = r.orientation;
        Pose::new(r.position.into(), Quat::from_xyzw(x, y, z, w))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
