//! Virtual point lights left behind by a photon pass, and the store that collects them.

use parking_lot::Mutex;

use crate::{Bounds3f, Float, Point3f, ShadingPoint, Vec3f};
use crate::options::Options;
use crate::photon::{PhotonBounce, PhotonStore};
use crate::spectrum::Spectrum;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirtualPointLight {
    pub p: Point3f,
    pub n: Vec3f,
    pub power: Spectrum,
}

/// One independently traced batch of virtual point lights.
#[derive(Clone, Debug, Default)]
pub struct VplSet {
    lights: Box<[VirtualPointLight]>,
    max_average_power: Float,
}

impl VplSet {
    pub fn new(lights: Vec<VirtualPointLight>) -> Self {
        let max_average_power = lights.iter()
            .map(|vpl| vpl.power.average())
            .fold(0.0, Float::max);
        Self {
            lights: lights.into_boxed_slice(),
            max_average_power,
        }
    }

    pub fn lights(&self) -> &[VirtualPointLight] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Largest per-light average power, used to normalize lookups.
    pub fn max_average_power(&self) -> Float {
        self.max_average_power
    }
}

/// Photon sink turning every stored photon into a virtual point light.
pub struct VplStore {
    num_photons: usize,
    lights: Mutex<Vec<VirtualPointLight>>,
}

impl VplStore {
    pub fn new(num_photons: usize) -> Self {
        Self {
            num_photons,
            lights: Mutex::new(Vec::new()),
        }
    }

    pub fn into_set(self) -> VplSet {
        VplSet::new(self.lights.into_inner())
    }
}

impl PhotonStore for VplStore {
    fn emit_count(&self) -> usize {
        self.num_photons
    }

    fn prepare(&mut self, _options: &Options, _scene_bounds: Bounds3f) {}

    fn store(&self, state: &ShadingPoint, _dir: Vec3f, power: Spectrum, _diffuse: Spectrum) {
        let mut state = state.clone();
        state.faceforward();
        self.lights.lock().push(VirtualPointLight {
            p: state.p,
            n: state.n,
            power,
        });
    }

    fn allowed_bounces(&self) -> PhotonBounce {
        PhotonBounce::all()
    }
}
