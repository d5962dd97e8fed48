use crate::{Float, Point2f, Vec3f, PI};

/// Cosine-weighted direction about +z. `u.x` picks the azimuth and `u.y` the squared sine of the
/// polar angle, so stratification in either dimension carries over to the sphere.
pub fn cosine_sample_hemisphere(u: Point2f) -> Vec3f {
    let phi = 2.0 * PI * u.x;
    let sin_theta = Float::sqrt(u.y);
    let cos_theta = Float::sqrt(Float::max(0.0, 1.0 - u.y));
    Vec3f::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::InnerSpace;

    #[test]
    fn test_samples_are_unit_and_upper() {
        for i in 0..16 {
            for j in 0..16 {
                let u = Point2f::new(i as Float / 16.0, j as Float / 16.0);
                let w = cosine_sample_hemisphere(u);
                assert_relative_eq!(w.magnitude(), 1.0, epsilon = 1e-5);
                assert!(w.z >= 0.0);
            }
        }
    }

    #[test]
    fn test_pole() {
        let w = cosine_sample_hemisphere(Point2f::new(0.25, 0.0));
        assert_eq!(w.z, 1.0);
        assert_relative_eq!(w.x, 0.0);
    }
}
