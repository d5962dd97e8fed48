//! Irradiance caching engine: interpolates cached hemisphere gathers and only gathers anew on a miss.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::{Float, Ray, ShadingPoint, PI};
use crate::gi::{sample_hemisphere, GiEngine};
use crate::gi::octree::{CacheSettings, Octree};
use crate::options::Options;
use crate::photon::{GlobalPhotonMap, PhotonMapRegistry};
use crate::scene::Scene;
use crate::spectrum::Spectrum;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub nodes: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Irradiance caching: full hemisphere gathers are only computed where no cached sample is valid,
/// everywhere else irradiance is interpolated. Bounces past the first use a single gather ray.
pub struct IrradianceCacheEngine<'r> {
    registry: &'r PhotonMapRegistry,
    samples: usize,
    settings: CacheSettings,
    cache: Option<RwLock<Octree>>,
    global_map: Option<Box<dyn GlobalPhotonMap>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<'r> IrradianceCacheEngine<'r> {
    /// `registry` supplies the global photon map named by `gi.irr-cache.gmap`, if any.
    pub fn new(registry: &'r PhotonMapRegistry) -> Self {
        Self {
            registry,
            samples: 256,
            settings: CacheSettings::default(),
            cache: None,
            global_map: None,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, nodes) = self.cache.as_ref()
            .map(|cache| {
                let tree = cache.read();
                (tree.len(), tree.node_count())
            })
            .unwrap_or((0, 0));
        CacheStats {
            entries,
            nodes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn gather(&self, state: &ShadingPoint, cache: &RwLock<Octree>, scene: &dyn Scene) -> Spectrum {
        let n = self.samples;
        let mut irr = Spectrum::black();
        let mut inv_r: Float = 0.0;
        let mut min_r = Float::INFINITY;
        for i in 0..n {
            let ray = Ray::new(state.p, sample_hemisphere(state, i, n));
            if let Some(hit) = scene.trace_final_gather(state, &ray, i) {
                let r = hit.hit_distance();
                min_r = min_r.min(r);
                inv_r += 1.0 / r;
                irr += self.global_radiance(&hit, scene);
            }
        }
        irr *= PI / n as Float;
        let r0 = n as Float / inv_r;
        tracing::trace!(r0, min_r, "new irradiance sample");

        cache.write().insert(state.p, state.n, r0, irr);
        irr
    }
}

impl GiEngine for IrradianceCacheEngine<'_> {
    fn init(&mut self, options: &Options, scene: &dyn Scene) -> anyhow::Result<()> {
        let samples: i32 = options.get_or("gi.irr-cache.samples", 256)?;
        self.samples = samples.max(0) as usize;
        let tolerance: Float = options.get_or("gi.irr-cache.tolerance", 0.05)?;
        let min_spacing: Float = options.get_or("gi.irr-cache.min_spacing", 0.05)?;
        let max_spacing: Float = options.get_or("gi.irr-cache.max_spacing", 5.0)?;
        self.settings = CacheSettings {
            tolerance,
            min_spacing: min_spacing.max(0.001),
            max_spacing: max_spacing.max(0.001),
        };
        if self.settings.min_spacing > self.settings.max_spacing {
            tracing::warn!(
                "Minimum spacing {} exceeds maximum spacing {}",
                self.settings.min_spacing, self.settings.max_spacing
            );
        }

        tracing::info!(samples = self.samples, "Irradiance cache settings");
        if tolerance > 0.0 {
            tracing::info!("  * Tolerance: {:.3}", tolerance);
        } else {
            tracing::info!("  * Tolerance: off");
        }
        tracing::info!("  * Spacing: {:.3} to {:.3}", self.settings.min_spacing, self.settings.max_spacing);

        self.cache = Some(RwLock::new(Octree::new(scene.world_bound(), self.settings)));
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);

        self.global_map = None;
        let gmap: Option<String> = options.get("gi.irr-cache.gmap")?;
        if let Some(name) = gmap {
            let mut map = self.registry.create(&name)?;
            scene.trace_photons(map.as_photon_store(), "global", 0, options)?;
            self.global_map = Some(map);
        }
        Ok(())
    }

    fn irradiance(&self, state: &ShadingPoint, _albedo: Spectrum, scene: &dyn Scene) -> Spectrum {
        if self.samples == 0 {
            return Spectrum::black();
        }
        if state.diffuse_depth > 0 {
            let ray = Ray::new(state.p, sample_hemisphere(state, 0, 1));
            return scene.trace_final_gather(state, &ray, 0)
                .map_or_else(Spectrum::black, |hit| self.global_radiance(&hit, scene) * PI);
        }
        let cache = match &self.cache {
            Some(cache) => cache,
            None => return Spectrum::black(),
        };

        let cached = cache.read().lookup(state.p, state.n);
        match cached {
            Some(irr) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                irr
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.gather(state, cache, scene)
            }
        }
    }

    fn global_radiance(&self, state: &ShadingPoint, scene: &dyn Scene) -> Spectrum {
        match &self.global_map {
            Some(map) => map.radiance(state.p, state.n),
            None => scene.evaluate_radiance(state),
        }
    }

    fn report_stats(&self) {
        let stats = self.stats();
        tracing::debug!(
            entries = stats.entries,
            nodes = stats.nodes,
            hits = stats.hits,
            misses = stats.misses,
            "Irradiance cache statistics"
        );
    }
}
