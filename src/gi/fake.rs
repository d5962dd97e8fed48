use cgmath::InnerSpace;

use crate::{ShadingPoint, Vec3f, PI};
use crate::gi::GiEngine;
use crate::options::Options;
use crate::scene::Scene;
use crate::spectrum::Spectrum;

/// Analytic sky: no rays are traced, irradiance is a blend of a sky and a ground color driven by
/// how far the normal tilts away from `up`.
#[derive(Clone, Debug)]
pub struct FakeSkyEngine {
    up: Vec3f,
    sky: Spectrum,
    ground: Spectrum,
}

impl Default for FakeSkyEngine {
    fn default() -> Self {
        Self {
            up: vec3f!(0, 1, 0),
            sky: Spectrum::uniform(PI),
            ground: Spectrum::black(),
        }
    }
}

impl FakeSkyEngine {
    fn sky_irradiance(&self, n: Vec3f) -> Spectrum {
        let cos_theta = self.up.dot(n);
        let sin2 = 1.0 - cos_theta * cos_theta;
        let sine = if sin2 > 0.0 { 0.5 * sin2.sqrt() } else { 0.0 };
        let t = Spectrum::uniform(sine);
        if cos_theta > 0.0 {
            self.sky.lerp_to(self.ground, t)
        } else {
            self.ground.lerp_to(self.sky, t)
        }
    }
}

impl GiEngine for FakeSkyEngine {
    fn init(&mut self, options: &Options, _scene: &dyn Scene) -> anyhow::Result<()> {
        let up: Vec3f = options.get_or("gi.fake.up", vec3f!(0, 1, 0))?;
        anyhow::ensure!(up.magnitude2() > 0.0, "gi.fake.up must not be the zero vector");
        self.up = up.normalize();
        self.sky = options.get_or("gi.fake.sky", Spectrum::white())? * PI;
        self.ground = options.get_or("gi.fake.ground", Spectrum::black())? * PI;

        tracing::info!("Fake sky: up {:?}, sky {:?}, ground {:?}", self.up, self.sky, self.ground);
        Ok(())
    }

    fn irradiance(&self, state: &ShadingPoint, _albedo: Spectrum, _scene: &dyn Scene) -> Spectrum {
        self.sky_irradiance(state.n)
    }

    fn global_radiance(&self, _state: &ShadingPoint, _scene: &dyn Scene) -> Spectrum {
        Spectrum::black()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::CornellBox;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn engine(options: Options) -> FakeSkyEngine {
        let mut engine = FakeSkyEngine::default();
        engine.init(&options, &CornellBox::new()).unwrap();
        engine
    }

    #[test]
    fn test_poles() {
        let sky = Spectrum::from([0.2, 0.4, 1.0]);
        let ground = Spectrum::from([0.3, 0.2, 0.1]);
        let e = engine(Options::new()
            .with("gi.fake.up", vec3f!(0, 0, 2))
            .with("gi.fake.sky", sky)
            .with("gi.fake.ground", ground));

        let up = e.sky_irradiance(vec3f!(0, 0, 1));
        let down = e.sky_irradiance(vec3f!(0, 0, -1));
        for c in 0..3 {
            assert_relative_eq!(up[c], sky[c] * PI, epsilon = 1e-5);
            assert_relative_eq!(down[c], ground[c] * PI, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_horizon_is_halfway() {
        let e = engine(Options::new());
        let side = e.sky_irradiance(vec3f!(1, 0, 0));
        // cos = 0 picks the ground branch, blended halfway to the sky
        assert_relative_eq!(side[0], 0.5 * PI, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_up_is_rejected() {
        let mut engine = FakeSkyEngine::default();
        let opts = Options::new().with("gi.fake.up", vec3f!(0, 0, 0));
        assert!(engine.init(&opts, &CornellBox::new()).is_err());
    }

    proptest! {
        #[test]
        fn test_stays_between_sky_and_ground(
            x in -1.0f32..1.0, y in -1.0f32..1.0, z in -1.0f32..1.0,
            sky in 0.0f32..4.0, ground in 0.0f32..4.0,
        ) {
            let n = vec3f!(x, y, z);
            prop_assume!(n.magnitude2() > 1e-4);
            let e = engine(Options::new()
                .with("gi.fake.sky", Spectrum::uniform(sky))
                .with("gi.fake.ground", Spectrum::uniform(ground)));
            let v = e.sky_irradiance(n.normalize())[0];
            let lo = sky.min(ground) * PI;
            let hi = sky.max(ground) * PI;
            prop_assert!(v >= lo - 1e-4 && v <= hi + 1e-4, "{} not in [{}, {}]", v, lo, hi);
        }
    }
}
