use crate::{Float, Point3f, Vec3f};

/// Axis-aligned bounding box
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3f {
    pub min: Point3f,
    pub max: Point3f,
}

impl Bounds3f {
    pub fn with_bounds(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self::with_bounds(
            Point3f::new(Float::INFINITY, Float::INFINITY, Float::INFINITY),
            Point3f::new(Float::NEG_INFINITY, Float::NEG_INFINITY, Float::NEG_INFINITY),
        )
    }

    pub fn join_point(&self, p: &Point3f) -> Self {
        Self::with_bounds(
            Point3f::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            Point3f::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        )
    }

    pub fn extents(&self) -> Vec3f {
        self.max - self.min
    }

    pub fn center(&self) -> Point3f {
        self.min + (self.extents() / 2.0)
    }

    pub fn max_extent(&self) -> Float {
        let d = self.extents();
        d.x.max(d.y).max(d.z)
    }

    /// Grow the box by `delta` on every side.
    pub fn expand(&self, delta: Float) -> Self {
        let d = Vec3f::new(delta, delta, delta);
        Self::with_bounds(self.min - d, self.max + d)
    }

    pub fn contains(&self, p: &Point3f) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_extent() {
        let b = bounds3f!((-1, -2, -1), (1, 2, 3));
        assert_eq!(b.center(), Point3f::new(0.0, 0.0, 1.0));
        assert_eq!(b.max_extent(), 4.0);
        assert!(b.contains(&Point3f::new(0.0, 2.0, 3.0)));
        assert!(!b.contains(&Point3f::new(0.0, 2.1, 3.0)));
    }

    #[test]
    fn test_join_point() {
        let b = Bounds3f::empty()
            .join_point(&Point3f::new(1.0, 0.0, 0.0))
            .join_point(&Point3f::new(-1.0, 2.0, 0.5));
        assert_eq!(b, bounds3f!((-1, 0, 0), (1, 2, 0.5)));
    }
}
