//! Photon tracing sinks. The scene emits photons from its lights and reports every surface
//! interaction to a [`PhotonStore`]; the GI engines decide what to keep.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;

use crate::{Bounds3f, Point3f, Vec3f, ShadingPoint};
use crate::options::Options;
use crate::spectrum::Spectrum;

bitflags! {
    /// Kinds of scattering a photon may have gone through before a store is accepted.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PhotonBounce: u8 {
        const DIFFUSE = 1 << 0;
        const REFLECTION = 1 << 1;
        const REFRACTION = 1 << 2;
    }
}

pub trait PhotonStore: Sync {
    /// Number of photons the scene should emit into this store.
    fn emit_count(&self) -> usize;

    fn prepare(&mut self, options: &Options, scene_bounds: Bounds3f);

    /// Record a photon arriving at `state` travelling along `dir`. Called concurrently from the
    /// photon tracing threads.
    fn store(&self, state: &ShadingPoint, dir: Vec3f, power: Spectrum, diffuse: Spectrum);

    fn allowed_bounces(&self) -> PhotonBounce;

    /// Called once after all photons have been traced.
    fn finish(&mut self) {}
}

/// Access to a store through its [`PhotonStore`] interface, for trait objects built on it.
pub trait AsPhotonStore {
    fn as_photon_store(&mut self) -> &mut dyn PhotonStore;
}

impl<T: PhotonStore> AsPhotonStore for T {
    fn as_photon_store(&mut self) -> &mut dyn PhotonStore {
        self
    }
}

/// A photon map that can estimate radiance leaving a surface point.
pub trait GlobalPhotonMap: PhotonStore + AsPhotonStore + Send {
    fn radiance(&self, p: Point3f, n: Vec3f) -> Spectrum;
}

type PhotonMapFactory = Box<dyn Fn() -> Box<dyn GlobalPhotonMap> + Send + Sync>;

/// Global photon map implementations, selected by name from the render options.
#[derive(Default)]
pub struct PhotonMapRegistry {
    factories: HashMap<String, PhotonMapFactory>,
}

impl PhotonMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
        where F: Fn() -> Box<dyn GlobalPhotonMap> + Send + Sync + 'static
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn create(&self, name: &str) -> anyhow::Result<Box<dyn GlobalPhotonMap>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            anyhow::anyhow!("unknown global photon map \"{}\" (registered: {:?})", name, self.names())
        })?;
        Ok(factory())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PhotonMapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotonMapRegistry").field("names", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(Spectrum);

    impl PhotonStore for Constant {
        fn emit_count(&self) -> usize { 0 }
        fn prepare(&mut self, _options: &Options, _scene_bounds: Bounds3f) {}
        fn store(&self, _state: &ShadingPoint, _dir: Vec3f, _power: Spectrum, _diffuse: Spectrum) {}
        fn allowed_bounces(&self) -> PhotonBounce { PhotonBounce::all() }
    }

    impl GlobalPhotonMap for Constant {
        fn radiance(&self, _p: Point3f, _n: Vec3f) -> Spectrum { self.0 }
    }

    #[test]
    fn test_registry_creates_by_name() -> anyhow::Result<()> {
        let mut registry = PhotonMapRegistry::new();
        registry.register("constant", || Box::new(Constant(Spectrum::uniform(2.0))));
        let map = registry.create("constant")?;
        assert_eq!(map.radiance(point3f!(0, 0, 0), vec3f!(0, 0, 1)), Spectrum::uniform(2.0));
        assert_eq!(registry.names(), vec!["constant"]);
        Ok(())
    }

    #[test]
    fn test_registry_unknown_name() {
        let registry = PhotonMapRegistry::new();
        let err = registry.create("grid").err().unwrap();
        assert!(err.to_string().contains("grid"));
    }

    #[test]
    fn test_bounce_flags() {
        let b = PhotonBounce::DIFFUSE | PhotonBounce::REFRACTION;
        assert!(b.contains(PhotonBounce::DIFFUSE));
        assert!(!b.contains(PhotonBounce::REFLECTION));
    }
}
