//! Global illumination engines: estimators for the indirect diffuse light arriving at a surface.

use std::str::FromStr;

use anyhow::Context;

use crate::{Float, Point2f, ShadingPoint, Vec3f};
use crate::options::Options;
use crate::photon::PhotonMapRegistry;
use crate::sampling::cosine_sample_hemisphere;
use crate::scene::Scene;
use crate::spectrum::Spectrum;

pub mod ambocc;
pub mod fake;
pub mod vpl;
pub mod instant;
pub mod octree;
pub mod irr_cache;
pub mod path;

pub use ambocc::AmbientOcclusionEngine;
pub use fake::FakeSkyEngine;
pub use instant::InstantGiEngine;
pub use irr_cache::IrradianceCacheEngine;
pub use path::PathTracingEngine;

pub trait GiEngine: Send + Sync {
    /// Read settings from `options` and run any prepass over `scene`. Called once, before any
    /// query.
    fn init(&mut self, options: &Options, scene: &dyn Scene) -> anyhow::Result<()>;

    /// Indirect irradiance arriving at `state`. `albedo` is the diffuse reflectance of the
    /// surface; engines may use it to bound their estimate. Safe to call from many threads.
    fn irradiance(&self, state: &ShadingPoint, albedo: Spectrum, scene: &dyn Scene) -> Spectrum;

    /// Radiance leaving `state` towards the point that traced it, used to continue or terminate
    /// paths found by gather rays.
    fn global_radiance(&self, state: &ShadingPoint, scene: &dyn Scene) -> Spectrum;

    /// Log whatever the engine accumulated during the render.
    fn report_stats(&self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GiEngineType {
    AmbientOcclusion,
    FakeSky,
    InstantGi,
    IrradianceCache,
    PathTracing,
}

impl FromStr for GiEngineType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ambocc" => Ok(GiEngineType::AmbientOcclusion),
            "fake" => Ok(GiEngineType::FakeSky),
            "igi" => Ok(GiEngineType::InstantGi),
            "irr-cache" => Ok(GiEngineType::IrradianceCache),
            "path" => Ok(GiEngineType::PathTracing),
            _ => Err(anyhow::anyhow!("unknown GI engine \"{}\"", s)),
        }
    }
}

/// Build and initialize the engine named by `gi.engine`. No engine (the option missing or set to
/// `none`) is `Ok(None)`.
pub fn make_gi_engine<'r>(
    options: &Options,
    scene: &dyn Scene,
    registry: &'r PhotonMapRegistry,
) -> anyhow::Result<Option<Box<dyn GiEngine + 'r>>> {
    let name: Option<String> = options.get("gi.engine")?;
    let ty: GiEngineType = match name.as_deref() {
        None | Some("none") => return Ok(None),
        Some(name) => name.parse()?,
    };

    let mut engine: Box<dyn GiEngine + 'r> = match ty {
        GiEngineType::AmbientOcclusion => Box::new(AmbientOcclusionEngine::default()),
        GiEngineType::FakeSky => Box::new(FakeSkyEngine::default()),
        GiEngineType::InstantGi => Box::new(InstantGiEngine::default()),
        GiEngineType::IrradianceCache => Box::new(IrradianceCacheEngine::new(registry)),
        GiEngineType::PathTracing => Box::new(PathTracingEngine::default()),
    };
    engine.init(options, scene)
        .with_context(|| format!("failed to initialize {:?} engine", ty))?;
    Ok(Some(engine))
}

/// Direction of hemisphere sample `i` out of `n` around the shading normal, cosine distributed.
pub(crate) fn sample_hemisphere(state: &ShadingPoint, i: usize, n: usize) -> Vec3f {
    let u = Point2f::new(state.random(i, 0, n) as Float, state.random(i, 1, n) as Float);
    state.basis.to_world(cosine_sample_hemisphere(u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::CornellBox;

    #[test]
    fn test_parse_engine_names() {
        assert_eq!("ambocc".parse::<GiEngineType>().unwrap(), GiEngineType::AmbientOcclusion);
        assert_eq!("irr-cache".parse::<GiEngineType>().unwrap(), GiEngineType::IrradianceCache);
        assert!("photons".parse::<GiEngineType>().is_err());
    }

    #[test]
    fn test_no_engine() -> anyhow::Result<()> {
        let scene = CornellBox::new();
        let registry = PhotonMapRegistry::new();
        assert!(make_gi_engine(&Options::new(), &scene, &registry)?.is_none());
        let opts = Options::new().with("gi.engine", "none");
        assert!(make_gi_engine(&opts, &scene, &registry)?.is_none());
        Ok(())
    }

    #[test]
    fn test_make_engine_reports_bad_settings() {
        let scene = CornellBox::new();
        let registry = PhotonMapRegistry::new();
        let opts = Options::new().with("gi.engine", "fake").with("gi.fake.up", "sideways");
        let err = make_gi_engine(&opts, &scene, &registry).err().unwrap();
        assert!(format!("{:#}", err).contains("gi.fake.up"));

        let opts = Options::new().with("gi.engine", "igloo");
        assert!(make_gi_engine(&opts, &scene, &registry).is_err());
    }

    #[test]
    fn test_hemisphere_samples_face_normal() {
        use cgmath::InnerSpace;
        let ray = crate::Ray::new(point3f!(0, 0, 0), vec3f!(1, 0, 0));
        let state = ShadingPoint::new(point3f!(1, 0, 0), vec3f!(-1, 0, 0), ray,
                                      crate::sampler::SampleContext::new(9));
        for i in 0..64 {
            let w = sample_hemisphere(&state, i, 64);
            assert!(w.dot(state.n) >= 0.0);
        }
    }
}
