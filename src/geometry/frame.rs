use crate::Vec3f;
use cgmath::InnerSpace;

/// Orthonormal basis whose `w` axis is a surface normal. Local directions are expressed with `z`
/// along `w`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub u: Vec3f,
    pub v: Vec3f,
    pub w: Vec3f,
}

impl Frame {
    pub fn from_normal(n: Vec3f) -> Self {
        let w = n.normalize();
        // build v from the two largest components of w so it is never degenerate
        let v = if w.x.abs() < w.y.abs() && w.x.abs() < w.z.abs() {
            Vec3f::new(0.0, w.z, -w.y)
        } else if w.y.abs() < w.z.abs() {
            Vec3f::new(w.z, 0.0, -w.x)
        } else {
            Vec3f::new(w.y, -w.x, 0.0)
        }.normalize();
        let u = v.cross(w);
        Self { u, v, w }
    }

    pub fn to_world(&self, a: Vec3f) -> Vec3f {
        a.x * self.u + a.y * self.v + a.z * self.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_is_orthonormal() {
        for n in &[vec3f!(0, 0, 1), vec3f!(1, 0, 0), vec3f!(0, -1, 0), vec3f!(0.3, -0.5, 0.8)] {
            let f = Frame::from_normal(*n);
            assert_relative_eq!(f.u.magnitude(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(f.v.magnitude(), 1.0, epsilon = 1e-5);
            assert_relative_eq!(f.u.dot(f.v), 0.0, epsilon = 1e-5);
            assert_relative_eq!(f.u.dot(f.w), 0.0, epsilon = 1e-5);
            assert_relative_eq!(f.v.dot(f.w), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_to_world_maps_z_to_normal() {
        let n = vec3f!(0.3, -0.5, 0.8).normalize();
        let f = Frame::from_normal(n);
        let up = f.to_world(vec3f!(0, 0, 1));
        assert_relative_eq!(up, n, epsilon = 1e-5);
        assert_relative_eq!(f.to_world(vec3f!(1, 0, 0)).dot(n), 0.0, epsilon = 1e-5);
    }
}
