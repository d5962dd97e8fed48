//! An analytic Cornell box: five diffuse walls around an open front, lit by a square patch in the
//! middle of the ceiling. `+z` is up and the opening faces `-y`.

use std::f32::consts::FRAC_1_PI;

use cgmath::InnerSpace;
use rayon::prelude::*;

use crate::{Bounds3f, Float, Point2f, Point3f, Ray, ShadingPoint, PI};
use crate::gi::GiEngine;
use crate::options::Options;
use crate::photon::{PhotonBounce, PhotonStore};
use crate::sampler::SampleContext;
use crate::sampler::random::RandomSampler;
use crate::sampling::cosine_sample_hemisphere;
use crate::scene::Scene;
use crate::spectrum::Spectrum;

/// Surfaces of the box, as stored in [`ShadingPoint::prim_id`].
pub const LEFT: u32 = 0;
pub const RIGHT: u32 = 1;
/// The `-y` side. There is no wall here, so this id is never produced.
pub const FRONT: u32 = 2;
pub const BACK: u32 = 3;
pub const FLOOR: u32 = 4;
pub const CEILING: u32 = 5;

/// Light samples sit this far below the ceiling so the ceiling does not shadow them.
const LIGHT_OFFSET: Float = 0.001;

enum Surface {
    Emitter,
    Diffuse(Spectrum),
}

#[derive(Clone, Debug)]
pub struct CornellBox {
    bounds: Bounds3f,
    light_bounds: Bounds3f,

    pub left: Spectrum,
    pub right: Spectrum,
    pub top: Spectrum,
    pub bottom: Spectrum,
    pub back: Spectrum,

    pub radiance: Spectrum,
    pub light_samples: usize,

    lx_min: Float,
    lx_max: Float,
    ly_min: Float,
    ly_max: Float,
    area: Float,
}

impl Default for CornellBox {
    fn default() -> Self {
        Self::new()
    }
}

impl CornellBox {
    pub fn new() -> Self {
        let gray = Spectrum::uniform(0.7);
        let mut cornell = Self {
            bounds: Bounds3f::empty(),
            light_bounds: Bounds3f::empty(),
            left: Spectrum::from([0.80, 0.25, 0.25]),
            right: Spectrum::from([0.25, 0.25, 0.80]),
            top: gray,
            bottom: gray,
            back: gray,
            radiance: Spectrum::white(),
            light_samples: 16,
            lx_min: 0.0,
            lx_max: 0.0,
            ly_min: 0.0,
            ly_max: 0.0,
            area: 0.0,
        };
        cornell.set_corners(point3f!(-1, -1, -1), point3f!(1, 1, 1));
        cornell
    }

    pub fn with_corners(mut self, c0: Point3f, c1: Point3f) -> Self {
        self.set_corners(c0, c1);
        self
    }

    pub fn with_radiance(mut self, radiance: Spectrum) -> Self {
        self.radiance = radiance;
        self
    }

    fn set_corners(&mut self, c0: Point3f, c1: Point3f) {
        let bounds = Bounds3f::empty().join_point(&c0).join_point(&c1);
        let (min, max) = (bounds.min, bounds.max);
        self.bounds = bounds;
        self.light_bounds = bounds.expand(1.0e-5 * bounds.max_extent());

        // the light covers the middle third of the ceiling along x and y
        self.lx_min = max.x / 3.0 + 2.0 * min.x / 3.0;
        self.lx_max = min.x / 3.0 + 2.0 * max.x / 3.0;
        self.ly_min = max.y / 3.0 + 2.0 * min.y / 3.0;
        self.ly_max = min.y / 3.0 + 2.0 * max.y / 3.0;
        self.area = (self.lx_max - self.lx_min) * (self.ly_max - self.ly_min);
    }

    /// Total power leaving the light.
    pub fn light_power(&self) -> Spectrum {
        self.radiance * PI * self.area
    }

    /// Shading through a GI engine. The engine must already be initialized against this box.
    pub fn with_gi<'a>(&'a self, engine: &'a dyn GiEngine, max_diffuse_depth: u32) -> GiScene<'a> {
        GiScene {
            cornell: self,
            engine,
            max_diffuse_depth,
        }
    }

    /// Nearest wall hit by `ray` inside `(t_min, t_max)`, as `(t, side)`.
    pub fn intersect(&self, ray: &Ray) -> Option<(Float, u32)> {
        let (min, max) = (self.bounds.min, self.bounds.max);
        let mut interval_min = Float::NEG_INFINITY;
        let mut interval_max = Float::INFINITY;
        let mut side_in = None;
        let mut side_out = None;

        let slabs = [
            (ray.origin.x, ray.dir.x, min.x, max.x, LEFT, RIGHT),
            (ray.origin.y, ray.dir.y, min.y, max.y, FRONT, BACK),
            (ray.origin.z, ray.dir.z, min.z, max.z, FLOOR, CEILING),
        ];
        for &(org, dir, lo, hi, lo_side, hi_side) in &slabs {
            let inv_dir = 1.0 / dir;
            let t1 = (lo - org) * inv_dir;
            let t2 = (hi - org) * inv_dir;
            let (near, near_side, far, far_side) = if inv_dir > 0.0 {
                (t1, lo_side, t2, hi_side)
            } else {
                (t2, hi_side, t1, lo_side)
            };
            if near > interval_min {
                interval_min = near;
                side_in = Some(near_side);
            }
            if far < interval_max {
                interval_max = far;
                side_out = Some(far_side);
            }
            if interval_min > interval_max {
                return None;
            }
        }

        // there is no front wall, a ray entering or leaving through it passes straight through
        match (side_in, side_out) {
            (Some(side), _) if side != FRONT && ray.is_inside(interval_min) => Some((interval_min, side)),
            (_, Some(side)) if side != FRONT && ray.is_inside(interval_max) => Some((interval_max, side)),
            _ => None,
        }
    }

    /// Intersect a camera ray, producing a depth 0 shading point that sees the light.
    pub fn trace_primary(&self, ray: Ray, samples: SampleContext) -> Option<ShadingPoint> {
        self.intersect(&ray)
            .map(|(t, side)| self.shading_point(ray.with_max(t), side, samples))
    }

    fn shading_point(&self, ray: Ray, side: u32, samples: SampleContext) -> ShadingPoint {
        let n = match side {
            LEFT => vec3f!(1, 0, 0),
            RIGHT => vec3f!(-1, 0, 0),
            FRONT => vec3f!(0, 1, 0),
            BACK => vec3f!(0, -1, 0),
            FLOOR => vec3f!(0, 0, 1),
            _ => vec3f!(0, 0, -1),
        };
        let mut state = ShadingPoint::new(ray.at(ray.t_max), n, ray, samples);
        state.prim_id = side;
        state
    }

    fn surface(&self, state: &ShadingPoint) -> Surface {
        match state.prim_id {
            LEFT => Surface::Diffuse(self.left),
            RIGHT => Surface::Diffuse(self.right),
            BACK => Surface::Diffuse(self.back),
            FLOOR => Surface::Diffuse(self.bottom),
            _ => {
                let p = state.p;
                let on_light = p.x >= self.lx_min && p.x < self.lx_max
                    && p.y >= self.ly_min && p.y < self.ly_max;
                if on_light && state.ray.dir.z > 0.0 {
                    Surface::Emitter
                } else {
                    Surface::Diffuse(self.top)
                }
            }
        }
    }

    /// Diffuse reflectance at a point found by this box. The light reports black.
    pub fn albedo(&self, state: &ShadingPoint) -> Spectrum {
        match self.surface(state) {
            Surface::Emitter => Spectrum::black(),
            Surface::Diffuse(kd) => kd,
        }
    }

    /// Irradiance from the ceiling light, estimated with stratified samples over its area. Points
    /// past the first diffuse bounce use a single sample.
    pub fn direct_irradiance(&self, state: &ShadingPoint) -> Spectrum {
        let p = state.p;
        if !self.light_bounds.contains(&p) || p.z >= self.bounds.max.z {
            return Spectrum::black();
        }
        let n = if state.diffuse_depth > 0 { 1 } else { self.light_samples.max(1) };
        let a = self.area / n as Float;
        let light_z = self.bounds.max.z - LIGHT_OFFSET;

        let mut irradiance = Spectrum::black();
        for i in 0..n {
            let rx = state.random(i, 0, n) as Float;
            let ry = state.random(i, 1, n) as Float;
            let target = Point3f::new(
                self.lx_min * (1.0 - rx) + self.lx_max * rx,
                self.ly_min * (1.0 - ry) + self.ly_max * ry,
                light_z,
            );
            let shadow_ray = Ray::between(p, target);
            let cos_nx = shadow_ray.dir.dot(state.n);
            let cos_ny = shadow_ray.dir.z;
            if cos_nx <= 0.0 || cos_ny <= 0.0 {
                continue;
            }
            let r = shadow_ray.t_max;
            let g = cos_ny / (r * r);
            let radiance = self.radiance * (g * a);
            let opacity = self.trace_shadow(&shadow_ray);
            irradiance += radiance.lerp_to(Spectrum::black(), opacity) * cos_nx;
        }
        irradiance
    }

    fn shade(&self, state: &ShadingPoint, gi: Option<&GiScene>) -> Spectrum {
        let kd = match self.surface(state) {
            Surface::Emitter if state.include_lights => return self.radiance,
            Surface::Emitter => return Spectrum::black(),
            Surface::Diffuse(kd) => kd,
        };
        let mut state = state.clone();
        state.faceforward();

        let mut irradiance = self.direct_irradiance(&state);
        if let Some(gi) = gi {
            irradiance += gi.indirect_irradiance(&state, kd);
        }
        irradiance * kd * FRAC_1_PI
    }

    fn gather(&self, state: &ShadingPoint, ray: &Ray, i: usize) -> Option<ShadingPoint> {
        let (t, side) = self.intersect(ray)?;
        let mut hit = self.shading_point(ray.with_max(t), side, state.samples.split(i));
        hit.diffuse_depth = state.diffuse_depth + 1;
        hit.include_lights = false;
        Some(hit)
    }

    /// Follow one photon from the light until it escapes, is absorbed, or runs out of bounces.
    fn trace_photon(
        &self,
        store: &dyn PhotonStore,
        mut ray: Ray,
        mut power: Spectrum,
        sampler: &mut RandomSampler,
        samples: SampleContext,
        max_depth: u32,
    ) {
        let bounce = store.allowed_bounces().contains(PhotonBounce::DIFFUSE);
        let mut depth = 0;
        while let Some((t, side)) = self.intersect(&ray) {
            let mut state = self.shading_point(ray.with_max(t), side, samples);
            state.diffuse_depth = depth;
            let kd = match self.surface(&state) {
                Surface::Emitter => return,
                Surface::Diffuse(kd) => kd,
            };
            state.faceforward();
            store.store(&state, ray.dir, power, kd);

            if !bounce || depth >= max_depth {
                return;
            }
            let avg = kd.average();
            let rnd = sampler.get_1d();
            if rnd >= avg {
                return;
            }
            power = power * kd / avg;
            let local = cosine_sample_hemisphere(Point2f::new(rnd / avg, sampler.get_1d()));
            ray = Ray::new(state.p, state.basis.to_world(local));
            depth += 1;
        }
    }
}

impl Scene for CornellBox {
    fn world_bound(&self) -> Bounds3f {
        self.bounds
    }

    fn trace_shadow(&self, ray: &Ray) -> Spectrum {
        if self.intersect(ray).is_some() {
            Spectrum::white()
        } else {
            Spectrum::black()
        }
    }

    fn trace_final_gather(&self, state: &ShadingPoint, ray: &Ray, i: usize) -> Option<ShadingPoint> {
        self.gather(state, ray, i)
    }

    fn evaluate_radiance(&self, state: &ShadingPoint) -> Spectrum {
        self.shade(state, None)
    }

    fn trace_photons(
        &self,
        store: &mut dyn PhotonStore,
        label: &str,
        seed: u64,
        options: &Options,
    ) -> anyhow::Result<()> {
        let n = store.emit_count();
        let max_depth: i32 = options.get_or("depths.diffuse", 1)?;
        store.prepare(options, self.world_bound());
        if n == 0 {
            store.finish();
            return Ok(());
        }

        let total = self.light_power();
        anyhow::ensure!(
            !total.is_black() && total.is_finite(),
            "cannot trace {} photons: the light emits no power",
            label
        );

        let span = tracing::debug_span!("trace_photons", label = %label, photons = n);
        let _enter = span.enter();
        let start = std::time::Instant::now();

        let power = total / n as Float;
        let light_z = self.bounds.max.z - LIGHT_OFFSET;
        let sink: &dyn PhotonStore = &*store;
        (0..n).into_par_iter().for_each(|i| {
            let photon_seed = seed.wrapping_add(i as u64);
            let mut sampler = RandomSampler::new_with_seed(photon_seed);
            let u = sampler.get_2d();
            let v = sampler.get_2d();
            let origin = Point3f::new(
                self.lx_min * (1.0 - v.x) + self.lx_max * v.x,
                self.ly_min * (1.0 - v.y) + self.ly_max * v.y,
                light_z,
            );
            // emitted downwards, cosine distributed about -z
            let mut dir = cosine_sample_hemisphere(u);
            dir.z = -dir.z;
            self.trace_photon(
                sink,
                Ray::new(origin, dir),
                power,
                &mut sampler,
                SampleContext::new(photon_seed),
                max_depth.max(0) as u32,
            );
        });
        store.finish();

        tracing::debug!("Traced in {} ms", start.elapsed().as_millis());
        Ok(())
    }
}

/// A [`CornellBox`] whose diffuse surfaces also receive indirect light from a GI engine, for
/// points fewer than `max_diffuse_depth` bounces from the camera.
pub struct GiScene<'a> {
    cornell: &'a CornellBox,
    engine: &'a dyn GiEngine,
    max_diffuse_depth: u32,
}

impl GiScene<'_> {
    fn indirect_irradiance(&self, state: &ShadingPoint, kd: Spectrum) -> Spectrum {
        if state.diffuse_depth >= self.max_diffuse_depth {
            return Spectrum::black();
        }
        self.engine.irradiance(state, kd, self)
    }
}

impl Scene for GiScene<'_> {
    fn world_bound(&self) -> Bounds3f {
        self.cornell.world_bound()
    }

    fn trace_shadow(&self, ray: &Ray) -> Spectrum {
        self.cornell.trace_shadow(ray)
    }

    fn trace_final_gather(&self, state: &ShadingPoint, ray: &Ray, i: usize) -> Option<ShadingPoint> {
        self.cornell.gather(state, ray, i)
    }

    fn evaluate_radiance(&self, state: &ShadingPoint) -> Spectrum {
        self.cornell.shade(state, Some(self))
    }

    fn trace_photons(
        &self,
        store: &mut dyn PhotonStore,
        label: &str,
        seed: u64,
        options: &Options,
    ) -> anyhow::Result<()> {
        self.cornell.trace_photons(store, label, seed, options)
    }
}
