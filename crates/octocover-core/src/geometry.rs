use crate::glam::Vec3A;
use crate::ilattice::prelude::Extent;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub start: Vec3A,
    velocity: Vec3A,
}

impl Ray {
    pub fn new(start: Vec3A, velocity: Vec3A) -> Self {
        Self { start, velocity }
    }

    /// Builds a ray whose parameter `t` is measured in units of distance along `direction`.
    ///
    /// Returns `None` if `direction` is zero or not finite.
    pub fn with_direction(start: Vec3A, direction: Vec3A) -> Option<Self> {
        direction
            .try_normalize()
            .map(|velocity| Self::new(start, velocity))
    }

    /// The ray that travels from `start` to `end` in time `1.0`.
    pub fn between(start: Vec3A, end: Vec3A) -> Self {
        Self::new(start, end - start)
    }

    pub fn velocity(&self) -> Vec3A {
        self.velocity
    }

    pub fn position_at(&self, t: f32) -> Vec3A {
        self.start + t * self.velocity
    }
}

/// Distance from `p` to the corner of `extent` that is farthest from it.
pub fn farthest_corner_distance(extent: &Extent<Vec3A>, p: Vec3A) -> f32 {
    let to_min = (extent.minimum - p).abs();
    let to_lub = (extent.least_upper_bound() - p).abs();
    to_min.max(to_lub).length()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
