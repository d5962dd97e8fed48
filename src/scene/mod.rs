//! The ray tracing side of the renderer, as seen by the GI engines.

use crate::{Bounds3f, Ray, ShadingPoint};
use crate::options::Options;
use crate::photon::PhotonStore;
use crate::spectrum::Spectrum;

pub mod cornell;

pub use cornell::{CornellBox, GiScene};

pub trait Scene: Send + Sync {
    fn world_bound(&self) -> Bounds3f;

    /// Opacity along `ray`, per channel: black when unobstructed, white when fully blocked.
    fn trace_shadow(&self, ray: &Ray) -> Spectrum;

    /// Trace the `i`-th gather ray leaving `state`. The returned point is one diffuse bounce
    /// deeper than `state`, excludes emitters, and carries the hit distance in `ray.t_max`.
    fn trace_final_gather(&self, state: &ShadingPoint, ray: &Ray, i: usize) -> Option<ShadingPoint>;

    /// Outgoing radiance at a surface point found by this scene, as computed by its shaders.
    fn evaluate_radiance(&self, state: &ShadingPoint) -> Spectrum;

    /// Emit `store.emit_count()` photons from the scene's lights and report every surface
    /// interaction to `store`. `seed` selects the random stream; `label` names the pass in logs.
    fn trace_photons(
        &self,
        store: &mut dyn PhotonStore,
        label: &str,
        seed: u64,
        options: &Options,
    ) -> anyhow::Result<()>;
}
