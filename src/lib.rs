#[macro_use] pub mod macros; // must stay at the top
pub mod geometry;
pub mod spectrum;
pub mod sampling;
pub mod sampler;
pub mod id_arena;
pub mod options;
pub mod interaction;
pub mod photon;
pub mod scene;
pub mod gi;
pub mod imageio;

pub use geometry::*;
pub use interaction::ShadingPoint;
pub use options::Options;
pub use spectrum::Spectrum;

use cgmath::{Point2, Point3, Vector2, Vector3};

pub type Float = f32;

pub type Point2f = Point2<Float>;
pub type Point3f = Point3<Float>;
pub type Vec2f = Vector2<Float>;
pub type Vec3f = Vector3<Float>;

pub const PI: Float = std::f32::consts::PI;

/// Clamp a value into `[low, high]`. Unlike `f32::clamp` this is well defined for infinite input
/// and maps NaN to `low`.
pub fn clamp(val: Float, low: Float, high: Float) -> Float {
    if val < low || val.is_nan() {
        low
    } else if val > high {
        high
    } else {
        val
    }
}
