use crate::{Float, Point2f};
use rand_xoshiro::Xoshiro256Plus;
use rand::{SeedableRng, Rng};

/// Independent uniform samples, used where sample counts are not known up front (photon
/// random walks).
pub struct RandomSampler {
    rng: Xoshiro256Plus,
}

impl RandomSampler {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256Plus::seed_from_u64(seed),
        }
    }

    pub fn get_1d(&mut self) -> Float {
        self.rng.gen()
    }

    pub fn get_2d(&mut self) -> Point2f {
        Point2f::new(self.rng.gen(), self.rng.gen())
    }

    pub fn clone_with_seed(&self, seed: u64) -> Self {
        Self::new_with_seed(seed)
    }
}
