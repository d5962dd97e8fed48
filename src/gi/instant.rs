//! Instant global illumination: light is carried by virtual point lights left behind by photons,
//! with the singular `1/d²` term clamped and optionally compensated by gather rays.

use cgmath::{InnerSpace, MetricSpace};

use crate::{Float, Point2f, Ray, ShadingPoint, PI};
use crate::gi::GiEngine;
use crate::gi::vpl::{VplSet, VplStore};
use crate::options::Options;
use crate::sampling::cosine_sample_hemisphere;
use crate::scene::Scene;
use crate::spectrum::Spectrum;

/// Lights whose normal is within this cosine of the query normal are candidates for the global
/// radiance lookup.
const GLOBAL_NORMAL_COS: Float = 0.9;

#[derive(Clone, Debug)]
pub struct InstantGiEngine {
    num_photons: usize,
    num_sets: usize,
    c: Float,
    num_bias: i32,
    sets: Vec<VplSet>,
}

impl Default for InstantGiEngine {
    fn default() -> Self {
        Self {
            num_photons: 64,
            num_sets: 1,
            c: 0.00003,
            num_bias: 0,
            sets: vec![VplSet::default()],
        }
    }
}

impl InstantGiEngine {
    pub fn sets(&self) -> &[VplSet] {
        &self.sets
    }

    fn pick_set(&self, state: &ShadingPoint) -> &VplSet {
        let idx = (state.random(0, 1, 1) * self.sets.len() as f64) as usize;
        &self.sets[idx.min(self.sets.len() - 1)]
    }

    /// Extra energy from the neighbourhood where the clamped VPL term underestimates, found by
    /// tracing short cosine-distributed rays.
    fn bias_compensation(&self, state: &ShadingPoint, b: Float, scene: &dyn Scene) -> Spectrum {
        let nb = if state.diffuse_depth == 0 || self.num_bias <= 0 { self.num_bias } else { 1 };
        if nb <= 0 {
            return Spectrum::black();
        }
        let nb = nb as usize;
        let scale = PI / nb as Float;
        let mut irr = Spectrum::black();
        for i in 0..nb {
            let u = Point2f::new(state.random(i, 0, nb) as Float, state.random(i, 1, nb) as Float);
            let local = cosine_sample_hemisphere(u);
            let cos_theta = local.z;
            let w = state.basis.to_world(local);
            let ray = Ray::new(state.p, w).with_max((cos_theta / b).sqrt());
            let hit = match scene.trace_final_gather(state, &ray, i) {
                Some(hit) => hit,
                None => continue,
            };
            let dist = hit.hit_distance();
            let cos_theta_y = -w.dot(hit.n);
            if cos_theta_y > 0.0 {
                let g = (cos_theta * cos_theta_y) / (dist * dist);
                // only the part of the path the clamp cut off
                if g > b {
                    irr += scene.evaluate_radiance(&hit) * (scale * (g - b) / g);
                }
            }
        }
        irr
    }
}

impl GiEngine for InstantGiEngine {
    fn init(&mut self, options: &Options, scene: &dyn Scene) -> anyhow::Result<()> {
        let num_photons: i32 = options.get_or("gi.igi.samples", 64)?;
        let num_sets: i32 = options.get_or("gi.igi.sets", 1)?;
        self.num_photons = num_photons.max(0) as usize;
        self.num_sets = num_sets.max(1) as usize;
        self.c = options.get_or("gi.igi.c", 0.00003)?;
        self.num_bias = options.get_or("gi.igi.bias_samples", 0)?;

        tracing::info!(
            samples = self.num_photons,
            sets = self.num_sets,
            bias_bound = self.c,
            bias_rays = self.num_bias,
            "Instant GI settings"
        );

        self.sets = Vec::with_capacity(self.num_sets);
        for i in 0..self.num_sets {
            if self.num_photons == 0 {
                self.sets.push(VplSet::default());
                continue;
            }
            let seed = (i * self.num_photons) as u64;
            let mut store = VplStore::new(self.num_photons);
            scene.trace_photons(&mut store, "virtual", seed, options)?;
            let set = store.into_set();
            tracing::info!("Stored {} virtual point lights for set {} of {}", set.len(), i + 1, self.num_sets);
            self.sets.push(set);
        }
        Ok(())
    }

    fn irradiance(&self, state: &ShadingPoint, albedo: Spectrum, scene: &dyn Scene) -> Spectrum {
        let max_albedo = albedo.max_component_value();
        if !(max_albedo > 0.0) {
            return Spectrum::black();
        }
        let b = PI * self.c / max_albedo;
        let p = state.p;
        let n = state.n;

        let mut irr = Spectrum::black();
        for vpl in self.pick_set(state).lights() {
            if p.distance2(vpl.p) == 0.0 {
                // the clamped term at zero distance, no visibility to test
                if n.dot(vpl.n) > 0.0 {
                    irr += vpl.power * (0.25 * b);
                }
                continue;
            }
            let ray = Ray::between(p, vpl.p);
            let dot_nl_d = -ray.dir.dot(vpl.n);
            let dot_n_d = ray.dir.dot(n);
            if dot_nl_d > 0.0 && dot_n_d > 0.0 {
                let r2 = ray.t_max * ray.t_max;
                let opacity = scene.trace_shadow(&ray);
                let power = vpl.power.lerp_to(Spectrum::black(), opacity);
                let g = (dot_n_d * dot_nl_d) / r2;
                irr += power * (0.25 * g.min(b));
            }
        }
        irr + self.bias_compensation(state, b, scene)
    }

    fn global_radiance(&self, state: &ShadingPoint, _scene: &dyn Scene) -> Spectrum {
        let set = self.pick_set(state);
        let max_avg_pow = set.max_average_power();
        if !(max_avg_pow > 0.0) {
            return Spectrum::black();
        }
        let mut min_dist = 1.0;
        let mut nearest = None;
        for vpl in set.lights() {
            if state.n.dot(vpl.n) > GLOBAL_NORMAL_COS {
                let d = vpl.p.distance2(state.p);
                if d < min_dist {
                    nearest = Some(vpl.power);
                    min_dist = d;
                }
            }
        }
        nearest.map_or_else(Spectrum::black, |pow| pow / max_avg_pow)
    }
}
