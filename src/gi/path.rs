//! Brute force path-traced indirect irradiance.

use crate::{Float, Ray, ShadingPoint, PI};
use crate::gi::{sample_hemisphere, GiEngine};
use crate::options::Options;
use crate::scene::Scene;
use crate::spectrum::Spectrum;

/// Brute force gathering: every query at the first bounce traces `samples` rays, later bounces
/// continue the path with a single ray.
#[derive(Clone, Debug)]
pub struct PathTracingEngine {
    samples: usize,
}

impl Default for PathTracingEngine {
    fn default() -> Self {
        Self { samples: 16 }
    }
}

impl GiEngine for PathTracingEngine {
    fn init(&mut self, options: &Options, _scene: &dyn Scene) -> anyhow::Result<()> {
        let samples: i32 = options.get_or("gi.path.samples", 16)?;
        self.samples = samples.max(0) as usize;
        tracing::info!(samples = self.samples, "Path tracer settings");
        Ok(())
    }

    fn irradiance(&self, state: &ShadingPoint, _albedo: Spectrum, scene: &dyn Scene) -> Spectrum {
        let n = if state.diffuse_depth > 0 { 1 } else { self.samples };
        if n == 0 {
            return Spectrum::black();
        }
        let irr: Spectrum = (0..n)
            .filter_map(|i| {
                let ray = Ray::new(state.p, sample_hemisphere(state, i, n));
                scene.trace_final_gather(state, &ray, i)
            })
            .map(|hit| scene.evaluate_radiance(&hit))
            .sum();
        irr * (PI / n as Float)
    }

    fn global_radiance(&self, _state: &ShadingPoint, _scene: &dyn Scene) -> Spectrum {
        Spectrum::black()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SampleContext;
    use crate::scene::CornellBox;

    #[test]
    fn test_floor_receives_bounce_light() -> anyhow::Result<()> {
        let scene = CornellBox::new();
        let mut engine = PathTracingEngine::default();
        engine.init(&Options::new().with("gi.path.samples", 64), &scene)?;

        let floor = scene.trace_primary(Ray::new(point3f!(0, 0, 0), vec3f!(0, 0, -1)), SampleContext::new(0)).unwrap();
        let e = engine.irradiance(&floor, Spectrum::uniform(0.7), &scene);
        assert!(e[0] > 0.0 && e.is_finite());
        // the red wall tints the floor more than the blue one does near x = -1
        let near_red = scene.trace_primary(
            Ray::new(point3f!(-0.9, 0, 0), vec3f!(0, 0, -1)), SampleContext::new(0)).unwrap();
        let tint = engine.irradiance(&near_red, Spectrum::uniform(0.7), &scene);
        assert!(tint[0] > tint[2]);
        Ok(())
    }

    #[test]
    fn test_zero_samples() -> anyhow::Result<()> {
        let scene = CornellBox::new();
        let mut engine = PathTracingEngine::default();
        engine.init(&Options::new().with("gi.path.samples", 0), &scene)?;
        let floor = scene.trace_primary(Ray::new(point3f!(0, 0, 0), vec3f!(0, 0, -1)), SampleContext::new(0)).unwrap();
        assert!(engine.irradiance(&floor, Spectrum::white(), &scene).is_black());
        Ok(())
    }
}
