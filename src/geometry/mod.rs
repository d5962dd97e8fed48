use crate::{Float, Point3f, Vec3f};
use cgmath::prelude::*;

pub mod bounds;
pub mod frame;

pub use bounds::*;
pub use frame::Frame;

/// Offset applied to the start of every ray to avoid re-intersecting the surface it leaves.
pub const RAY_EPSILON: Float = 1.0e-4;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3f,
    pub dir: Vec3f,
    pub t_min: Float,
    pub t_max: Float,
}

impl Ray {
    pub fn new(origin: Point3f, dir: Vec3f) -> Self {
        Self {
            origin, dir, t_min: RAY_EPSILON, t_max: Float::INFINITY
        }
    }

    /// A ray with a normalized direction running from `from` towards `to`, stopping just short of
    /// the target so the surface at `to` does not occlude itself.
    pub fn between(from: Point3f, to: Point3f) -> Self {
        let d = to - from;
        let len = d.magnitude();
        let dir = if len > 0.0 { d / len } else { Vec3f::zero() };
        Self {
            origin: from,
            dir,
            t_min: RAY_EPSILON,
            t_max: len * (1.0 - RAY_EPSILON),
        }
    }

    pub fn with_max(mut self, t_max: Float) -> Self {
        self.t_max = t_max;
        self
    }

    pub fn at(&self, t: Float) -> Point3f {
        self.origin + (self.dir * t)
    }

    pub fn is_inside(&self, t: Float) -> bool {
        self.t_min < t && t < self.t_max
    }
}
