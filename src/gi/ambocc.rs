//! Ambient occlusion engine.

use crate::{Float, Ray, ShadingPoint, PI};
use crate::gi::{sample_hemisphere, GiEngine};
use crate::options::Options;
use crate::scene::Scene;
use crate::spectrum::Spectrum;

/// Ambient occlusion: irradiance blends from `bright` to `dark` with the fraction of the
/// hemisphere blocked within `max_dist`.
#[derive(Clone, Debug)]
pub struct AmbientOcclusionEngine {
    bright: Spectrum,
    dark: Spectrum,
    samples: usize,
    max_dist: Float,
}

impl Default for AmbientOcclusionEngine {
    fn default() -> Self {
        Self {
            bright: Spectrum::white(),
            dark: Spectrum::black(),
            samples: 32,
            max_dist: Float::INFINITY,
        }
    }
}

impl GiEngine for AmbientOcclusionEngine {
    fn init(&mut self, options: &Options, _scene: &dyn Scene) -> anyhow::Result<()> {
        self.bright = options.get_or("gi.ambocc.bright", Spectrum::white())?;
        self.dark = options.get_or("gi.ambocc.dark", Spectrum::black())?;
        self.samples = options.get_or::<i32>("gi.ambocc.samples", 32)?.max(0) as usize;
        let max_dist: Float = options.get_or("gi.ambocc.maxdist", 0.0)?;
        self.max_dist = if max_dist <= 0.0 { Float::INFINITY } else { max_dist };

        tracing::info!(
            samples = self.samples,
            max_dist = self.max_dist,
            "Ambient occlusion: bright {:?}, dark {:?}", self.bright, self.dark
        );
        Ok(())
    }

    fn irradiance(&self, state: &ShadingPoint, _albedo: Spectrum, scene: &dyn Scene) -> Spectrum {
        if self.samples == 0 {
            return Spectrum::black();
        }
        let occlusion: Spectrum = (0..self.samples)
            .map(|i| {
                let w = sample_hemisphere(state, i, self.samples);
                let ray = Ray::new(state.p, w).with_max(self.max_dist);
                self.bright.lerp_to(self.dark, scene.trace_shadow(&ray))
            })
            .sum();
        occlusion * (PI / self.samples as Float)
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
    use approx::assert_relative_eq;

    fn floor_point(scene: &CornellBox) -> ShadingPoint {
        let ray = Ray::new(point3f!(0, 0, 0), vec3f!(0, 0, -1));
        scene.trace_primary(ray, SampleContext::new(1)).unwrap()
    }

    #[test]
    fn test_equal_colors_ignore_occlusion() -> anyhow::Result<()> {
        let scene = CornellBox::new();
        let color = Spectrum::from([0.2, 0.5, 0.9]);
        let mut engine = AmbientOcclusionEngine::default();
        engine.init(&Options::new()
            .with("gi.ambocc.bright", color)
            .with("gi.ambocc.dark", color)
            .with("gi.ambocc.samples", 8), &scene)?;

        let e = engine.irradiance(&floor_point(&scene), Spectrum::white(), &scene);
        for c in 0..3 {
            assert_relative_eq!(e[c], color[c] * PI, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_open_sky_is_bright() -> anyhow::Result<()> {
        // a point far outside the box with its normal facing away sees nothing
        let scene = CornellBox::new();
        let mut engine = AmbientOcclusionEngine::default();
        engine.init(&Options::new(), &scene)?;
        let ray = Ray::new(point3f!(0, -10, 0), vec3f!(0, -1, 0)).with_max(1.0);
        let state = ShadingPoint::new(point3f!(0, -11, 0), vec3f!(0, -1, 0), ray, SampleContext::new(4));
        let e = engine.irradiance(&state, Spectrum::white(), &scene);
        assert_relative_eq!(e[1], PI, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn test_max_dist_limits_occlusion() -> anyhow::Result<()> {
        let scene = CornellBox::new();
        let mut near = AmbientOcclusionEngine::default();
        near.init(&Options::new().with("gi.ambocc.maxdist", 0.01), &scene)?;
        let mut far = AmbientOcclusionEngine::default();
        far.init(&Options::new(), &scene)?;

        let state = floor_point(&scene);
        let unoccluded = near.irradiance(&state, Spectrum::white(), &scene);
        let occluded = far.irradiance(&state, Spectrum::white(), &scene);
        assert_relative_eq!(unoccluded[0], PI, epsilon = 1e-5);
        assert!(occluded[0] < unoccluded[0]);
        assert!(near.global_radiance(&state, &scene).is_black());
        Ok(())
    }
}
