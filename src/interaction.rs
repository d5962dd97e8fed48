use crate::{Float, Point3f, Vec3f, Ray, Frame};
use crate::sampler::SampleContext;
use cgmath::InnerSpace;

/// A surface point being shaded, as handed to the GI engines by the renderer.
#[derive(Clone, Debug)]
pub struct ShadingPoint {
    pub p: Point3f,

    /// Shading normal, unit length.
    pub n: Vec3f,

    /// Geometric normal, unit length.
    pub ng: Vec3f,

    /// Local frame around the shading normal, used to place hemisphere samples.
    pub basis: Frame,

    /// The ray that found this point. Its `t_max` is the hit distance.
    pub ray: Ray,

    /// Number of diffuse bounces between the camera and this point.
    pub diffuse_depth: u32,

    /// Whether emitted light should be returned when this point is shaded. Final gather rays
    /// exclude it since the direct lighting estimate already accounts for it.
    pub include_lights: bool,

    /// Which surface of the scene was hit. Only meaningful to the scene that produced the point.
    pub prim_id: u32,

    pub samples: SampleContext,
}

impl ShadingPoint {
    pub fn new(p: Point3f, n: Vec3f, ray: Ray, samples: SampleContext) -> Self {
        let n = n.normalize();
        Self {
            p,
            n,
            ng: n,
            basis: Frame::from_normal(n),
            ray,
            diffuse_depth: 0,
            include_lights: true,
            prim_id: 0,
            samples,
        }
    }

    pub fn hit_distance(&self) -> Float {
        self.ray.t_max
    }

    /// Stratified sample `i` of `n` in dimension `dim`.
    pub fn random(&self, i: usize, dim: usize, n: usize) -> f64 {
        self.samples.random(i, dim, n)
    }

    /// Flip the normals so they face against the incoming ray.
    pub fn faceforward(&mut self) {
        if self.ng.dot(self.ray.dir) > 0.0 {
            self.ng = -self.ng;
            self.n = -self.n;
            self.basis = Frame::from_normal(self.n);
        }
    }
}
